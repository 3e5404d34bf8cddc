use {
    crate::picker::{Correlation, Envelope, NativeDialogAdapter, PickerService, ServiceRegistry},
    async_channel::{Receiver, Sender},
    error_reporter::Report,
    futures_executor::{LocalPool, LocalSpawner},
    std::convert::Infallible,
};

enum Event {
    Dispatch {
        correlation: Correlation,
        envelope: Envelope,
    },
    Quit,
}

/// The single-threaded event loop that owns the pickers of one UI session.
pub struct Session {
    pool: LocalPool,
    registry: ServiceRegistry,
    events: Receiver<Event>,
    proxy: SessionProxy,
}

impl Session {
    pub fn new<A, F>(adapter: F) -> Self
    where
        A: NativeDialogAdapter + 'static,
        F: FnOnce(&SessionProxy) -> A,
    {
        match Self::try_new(|proxy| Ok::<_, Infallible>(adapter(proxy))) {
            Ok(slf) => slf,
            Err(e) => match e {},
        }
    }

    /// Creates a session whose adapter might fail to initialize.
    pub fn try_new<A, E, F>(adapter: F) -> Result<Self, E>
    where
        A: NativeDialogAdapter + 'static,
        F: FnOnce(&SessionProxy) -> Result<A, E>,
    {
        let (send, events) = async_channel::unbounded();
        let proxy = SessionProxy { send };
        let pool = LocalPool::new();
        let registry = ServiceRegistry::new(Box::new(adapter(&proxy)?), pool.spawner());
        Ok(Self {
            pool,
            registry,
            events,
            proxy,
        })
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn proxy(&self) -> &SessionProxy {
        &self.proxy
    }

    pub fn spawner(&self) -> LocalSpawner {
        self.pool.spawner()
    }

    /// Creates a picker attached to this session.
    pub fn picker(&self) -> PickerService {
        let picker = PickerService::new();
        if let Err(e) = self.registry.attach(&picker) {
            log::warn!("Could not attach picker {:?}: {}", picker.id(), Report::new(e));
        }
        picker
    }

    /// Runs the loop until [`SessionProxy::quit`] is called.
    pub fn run(&mut self) {
        let registry = self.registry.clone();
        let events = self.events.clone();
        self.pool.run_until(async move {
            while let Ok(event) = events.recv().await {
                if !handle(&registry, event) {
                    break;
                }
            }
        });
    }

    /// Handles queued events and runs tasks until no more progress can be made.
    ///
    /// Returns `false` if a quit request was seen.
    pub fn run_until_stalled(&mut self) -> bool {
        loop {
            while let Ok(event) = self.events.try_recv() {
                if !handle(&self.registry, event) {
                    return false;
                }
            }
            self.pool.run_until_stalled();
            if self.events.is_empty() {
                return true;
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.registry.detach_all();
        // Lets result handlers observe the cancellations.
        self.pool.run_until_stalled();
    }
}

fn handle(registry: &ServiceRegistry, event: Event) -> bool {
    match event {
        Event::Dispatch {
            correlation,
            envelope,
        } => {
            registry.dispatch(correlation, envelope);
            true
        }
        Event::Quit => false,
    }
}

/// A handle to a [`Session`] that can be used from any thread.
#[derive(Clone)]
pub struct SessionProxy {
    send: Sender<Event>,
}

impl SessionProxy {
    /// Reports the result of a native dialog. The result is delivered on the
    /// session's thread.
    pub fn dispatch(&self, correlation: Correlation, envelope: Envelope) {
        let event = Event::Dispatch {
            correlation,
            envelope,
        };
        if self.send.send_blocking(event).is_err() {
            log::debug!("Session is gone, dropping result for {correlation}");
        }
    }

    pub fn quit(&self) {
        let _ = self.send.send_blocking(Event::Quit);
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::picker::{
            testing::RecordingAdapter, DialogConfig, DialogMode, EnvelopeKind, SelectedPath,
        },
        futures_util::task::LocalSpawnExt,
        std::{cell::RefCell, rc::Rc, thread},
    };

    #[test]
    fn results_from_other_threads_are_marshalled() {
        let adapter = RecordingAdapter::default();
        let mut session = Session::new(|_| adapter.clone());
        let picker = session.picker();
        let results = Rc::new(RefCell::new(vec![]));
        let sink = results.clone();
        let proxy = session.proxy().clone();
        picker.on_result(move |envelope| {
            sink.borrow_mut().push(envelope);
            proxy.quit();
        });
        picker
            .request(DialogMode::SaveFile, DialogConfig::new().with_file_name("out.log"))
            .unwrap();
        let request = adapter.last().unwrap();
        let proxy = session.proxy().clone();
        let worker = thread::spawn(move || {
            let envelope =
                Envelope::for_mode(request.mode, vec![SelectedPath::new("/tmp/out.log")]).unwrap();
            proxy.dispatch(request.correlation, envelope);
        });
        session.run();
        worker.join().unwrap();
        let results = results.borrow();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind(), EnvelopeKind::SavePathChosen);
    }

    #[test]
    fn awaiting_task_resumes_on_dispatch() {
        let adapter = RecordingAdapter::default();
        let mut session = Session::new(|_| adapter.clone());
        let picker = session.picker();
        let result = Rc::new(RefCell::new(None));
        let slot = result.clone();
        let pending = picker.pick_directory(DialogConfig::new()).unwrap();
        session
            .spawner()
            .spawn_local(async move {
                *slot.borrow_mut() = Some(pending.await);
            })
            .unwrap();
        assert!(session.run_until_stalled());
        assert!(result.borrow().is_none());

        let request = adapter.last().unwrap();
        let dir = Envelope::directory_selected(SelectedPath::new("/srv"));
        session.proxy().dispatch(request.correlation, dir.clone());
        assert!(session.run_until_stalled());
        assert_eq!(*result.borrow(), Some(dir));
    }

    #[test]
    fn quit_is_reported() {
        let mut session = Session::new(|_| RecordingAdapter::default());
        session.proxy().quit();
        assert!(!session.run_until_stalled());
    }

    #[test]
    fn sessions_are_independent() {
        let first_adapter = RecordingAdapter::default();
        let second_adapter = RecordingAdapter::default();
        let mut first = Session::new(|_| first_adapter.clone());
        let second = Session::new(|_| second_adapter.clone());
        let picker = first.picker();
        let pending = picker.pick_files(DialogConfig::new()).unwrap();
        let correlation = pending.correlation();
        assert!(second_adapter.presented().is_empty());
        assert!(!second.registry().dispatch(correlation, Envelope::cancelled()));
        assert!(picker.is_busy());
        first.proxy().dispatch(correlation, Envelope::cancelled());
        first.run_until_stalled();
        assert!(!picker.is_busy());
    }

    #[test]
    fn dropping_session_cancels_outstanding() {
        let adapter = RecordingAdapter::default();
        let session = Session::new(|_| adapter.clone());
        let picker = session.picker();
        let pending = picker.pick_files(DialogConfig::new()).unwrap();
        drop(session);
        assert!(!picker.is_attached());
        assert!(futures_executor::block_on(pending).is_cancelled());
    }

    #[test]
    fn dropping_session_runs_pending_handlers() {
        let adapter = RecordingAdapter::default();
        let session = Session::new(|_| adapter.clone());
        let picker = session.picker();
        let results = Rc::new(RefCell::new(vec![]));
        let sink = results.clone();
        picker.on_result(move |envelope| sink.borrow_mut().push(envelope));
        picker
            .request(DialogMode::PickDirectory, DialogConfig::new())
            .unwrap();
        drop(session);
        assert_eq!(*results.borrow(), [Envelope::cancelled()]);
        assert_eq!(adapter.dismissed().len(), 1);
        assert!(!picker.is_busy());
    }
}
