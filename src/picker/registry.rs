use {
    crate::picker::{
        request::{Correlation, ServiceId},
        Envelope, NativeDialogAdapter, PickerError, PickerService,
    },
    futures_executor::LocalSpawner,
    std::{
        cell::RefCell,
        collections::HashMap,
        rc::{Rc, Weak},
    },
};

/// The pickers attached to one session.
///
/// Results reported by the adapter are routed through [`ServiceRegistry::dispatch`].
/// Results for pickers that are no longer attached are dropped.
#[derive(Clone)]
pub struct ServiceRegistry {
    inner: Rc<RegistryInner>,
}

pub(super) struct RegistryInner {
    pub(super) adapter: Box<dyn NativeDialogAdapter>,
    pub(super) spawner: LocalSpawner,
    attached: RefCell<HashMap<ServiceId, PickerService>>,
}

impl ServiceRegistry {
    pub fn new(adapter: Box<dyn NativeDialogAdapter>, spawner: LocalSpawner) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                adapter,
                spawner,
                attached: Default::default(),
            }),
        }
    }

    /// Attaches `service` to this registry. Attaching twice has no effect.
    pub fn attach(&self, service: &PickerService) -> Result<(), PickerError> {
        if let Some(current) = service.registry() {
            if Rc::ptr_eq(&current, &self.inner) {
                return Ok(());
            }
            return Err(PickerError::AttachedElsewhere);
        }
        service.set_registry(Rc::downgrade(&self.inner));
        self.inner
            .attached
            .borrow_mut()
            .insert(service.id(), service.clone());
        log::debug!("Attached picker {:?}", service.id());
        Ok(())
    }

    /// Detaches `service`. An outstanding request is resolved as cancelled
    /// before this function returns.
    pub fn detach(&self, service: &PickerService) {
        let removed = self.inner.attached.borrow_mut().remove(&service.id());
        if let Some(service) = removed {
            service.set_registry(Weak::new());
            self.inner.release(&service);
        }
    }

    pub fn detach_all(&self) {
        let services: Vec<_> = self.inner.attached.borrow_mut().drain().collect();
        for (_, service) in services {
            service.set_registry(Weak::new());
            self.inner.release(&service);
        }
    }

    /// Routes a result to the picker that requested it.
    ///
    /// Returns whether the result was delivered. Results for detached pickers
    /// or superseded requests are dropped.
    pub fn dispatch(&self, correlation: Correlation, envelope: Envelope) -> bool {
        let service = self
            .inner
            .attached
            .borrow()
            .get(&correlation.service)
            .cloned();
        let Some(service) = service else {
            log::debug!("Dropping result for detached picker ({correlation})");
            return false;
        };
        let delivered = service.resolve(correlation, envelope);
        if !delivered {
            log::debug!("Dropping result for superseded request {correlation}");
        }
        delivered
    }

    pub fn is_attached(&self, service: &PickerService) -> bool {
        self.inner.attached.borrow().contains_key(&service.id())
    }

    pub fn len(&self) -> usize {
        self.inner.attached.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RegistryInner {
    fn release(&self, service: &PickerService) {
        log::debug!("Detached picker {:?}", service.id());
        if let Some(correlation) = service.cancel() {
            log::info!("Cancelled {correlation} because its picker was detached");
            self.adapter.dismiss(correlation);
        }
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        for (_, service) in std::mem::take(self.attached.get_mut()) {
            self.release(&service);
        }
    }
}
