use {
    crate::picker::{Correlation, DialogRequest, NativeDialogAdapter},
    std::{cell::RefCell, rc::Rc},
};

/// Remembers every request it is asked to present.
#[derive(Clone, Default)]
pub struct RecordingAdapter {
    presented: Rc<RefCell<Vec<DialogRequest>>>,
    dismissed: Rc<RefCell<Vec<Correlation>>>,
}

impl RecordingAdapter {
    pub fn last(&self) -> Option<DialogRequest> {
        self.presented.borrow().last().cloned()
    }

    pub fn presented(&self) -> Vec<DialogRequest> {
        self.presented.borrow().clone()
    }

    pub fn dismissed(&self) -> Vec<Correlation> {
        self.dismissed.borrow().clone()
    }
}

impl NativeDialogAdapter for RecordingAdapter {
    fn present(&self, request: &DialogRequest) {
        self.presented.borrow_mut().push(request.clone());
    }

    fn dismiss(&self, correlation: Correlation) {
        self.dismissed.borrow_mut().push(correlation);
    }
}
