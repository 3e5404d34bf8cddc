use {
    crate::picker::{
        registry::RegistryInner,
        request::{Correlation, DialogConfig, DialogMode, DialogRequest, RequestId, ServiceId},
        Envelope, PickerError,
    },
    async_channel::{Receiver, Sender},
    futures_util::{future::LocalBoxFuture, task::LocalSpawnExt, FutureExt},
    std::{
        cell::{Cell, RefCell},
        fmt,
        future::Future,
        pin::Pin,
        rc::{Rc, Weak},
        task::{Context, Poll},
    },
};

type Handler = Rc<dyn Fn(Envelope)>;

/// A file, directory or save picker.
///
/// Each picker has at most one outstanding request. Handles are cheap to clone
/// and all clones refer to the same picker.
#[derive(Clone)]
pub struct PickerService {
    inner: Rc<ServiceInner>,
}

struct ServiceInner {
    id: ServiceId,
    next_request: Cell<u64>,
    handler: RefCell<Option<Handler>>,
    registry: RefCell<Weak<RegistryInner>>,
    outstanding: RefCell<Option<Outstanding>>,
}

struct Outstanding {
    request: DialogRequest,
    send: Sender<Envelope>,
}

impl Default for PickerService {
    fn default() -> Self {
        Self::new()
    }
}

impl PickerService {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ServiceInner {
                id: ServiceId::next(),
                next_request: Cell::new(1),
                handler: Default::default(),
                registry: Default::default(),
                outstanding: Default::default(),
            }),
        }
    }

    /// Creates a picker whose callback-style results go to `handler`.
    pub fn with_handler(handler: impl Fn(Envelope) + 'static) -> Self {
        let slf = Self::new();
        slf.on_result(handler);
        slf
    }

    pub fn id(&self) -> ServiceId {
        self.inner.id
    }

    pub fn on_result(&self, handler: impl Fn(Envelope) + 'static) {
        *self.inner.handler.borrow_mut() = Some(Rc::new(handler));
    }

    pub fn is_attached(&self) -> bool {
        self.inner.registry.borrow().strong_count() > 0
    }

    /// The correlation of the outstanding request, if any.
    pub fn outstanding(&self) -> Option<Correlation> {
        self.inner
            .outstanding
            .borrow()
            .as_ref()
            .map(|o| o.request.correlation)
    }

    pub fn is_busy(&self) -> bool {
        self.inner.outstanding.borrow().is_some()
    }

    pub fn pick_files(&self, config: DialogConfig) -> Result<PendingResult, PickerError> {
        self.invoke(DialogMode::PickFiles, config)
    }

    pub fn pick_files_multiple(&self, config: DialogConfig) -> Result<PendingResult, PickerError> {
        self.invoke(DialogMode::PickFilesMultiple, config)
    }

    pub fn pick_directory(&self, config: DialogConfig) -> Result<PendingResult, PickerError> {
        self.invoke(DialogMode::PickDirectory, config)
    }

    pub fn save_file(&self, config: DialogConfig) -> Result<PendingResult, PickerError> {
        self.invoke(DialogMode::SaveFile, config)
    }

    /// Presents a native dialog.
    ///
    /// Errors are reported before the adapter is touched. The returned future
    /// resolves once the adapter reports a result or the picker is detached.
    pub fn invoke(
        &self,
        mode: DialogMode,
        config: DialogConfig,
    ) -> Result<PendingResult, PickerError> {
        let (request, pending, registry) = self.start(mode, config)?;
        present(&registry, &request);
        Ok(pending)
    }

    /// Presents a native dialog and forwards the result to the registered
    /// handler in a later turn of the event loop.
    pub fn request(&self, mode: DialogMode, config: DialogConfig) -> Result<(), PickerError> {
        let handler = self
            .inner
            .handler
            .borrow()
            .clone()
            .ok_or(PickerError::MissingHandler)?;
        let (request, pending, registry) = self.start(mode, config)?;
        let res = registry.spawner.spawn_local(async move {
            let envelope = pending.await;
            handler(envelope);
        });
        if let Err(e) = res {
            log::error!(
                "Could not schedule the result handler for {}: {e}",
                request.correlation,
            );
            self.inner.outstanding.borrow_mut().take();
            return Err(PickerError::SessionEnded);
        }
        present(&registry, &request);
        Ok(())
    }

    fn start(
        &self,
        mode: DialogMode,
        config: DialogConfig,
    ) -> Result<(DialogRequest, PendingResult, Rc<RegistryInner>), PickerError> {
        let registry = self
            .inner
            .registry
            .borrow()
            .upgrade()
            .ok_or(PickerError::NotAttached)?;
        if let Some(correlation) = self.outstanding() {
            return Err(PickerError::RequestAlreadyInProgress(correlation));
        }
        let config = config
            .validate_for(mode)
            .map_err(PickerError::InvalidConfig)?;
        let request_id = self.inner.next_request.get();
        self.inner.next_request.set(request_id + 1);
        let request = DialogRequest {
            correlation: Correlation {
                service: self.inner.id,
                request: RequestId(request_id),
            },
            mode,
            config,
        };
        let (send, recv) = async_channel::bounded(1);
        *self.inner.outstanding.borrow_mut() = Some(Outstanding {
            request: request.clone(),
            send,
        });
        let pending = PendingResult::new(request.correlation, recv);
        Ok((request, pending, registry))
    }

    /// Completes the outstanding request if it matches `correlation`.
    pub(super) fn resolve(&self, correlation: Correlation, envelope: Envelope) -> bool {
        let outstanding = {
            let mut slot = self.inner.outstanding.borrow_mut();
            let matches = slot
                .as_ref()
                .is_some_and(|o| o.request.correlation == correlation);
            match matches {
                true => slot.take(),
                false => None,
            }
        };
        match outstanding {
            Some(o) => {
                if o.send.try_send(envelope).is_err() {
                    log::debug!("Nobody is waiting for the result of {correlation}");
                }
                true
            }
            None => false,
        }
    }

    /// Cancels the outstanding request, if any.
    pub(super) fn cancel(&self) -> Option<Correlation> {
        let correlation = self.outstanding()?;
        self.resolve(correlation, Envelope::cancelled());
        Some(correlation)
    }

    pub(super) fn registry(&self) -> Option<Rc<RegistryInner>> {
        self.inner.registry.borrow().upgrade()
    }

    pub(super) fn set_registry(&self, registry: Weak<RegistryInner>) {
        *self.inner.registry.borrow_mut() = registry;
    }
}

fn present(registry: &RegistryInner, request: &DialogRequest) {
    log::debug!("Presenting {:?} dialog for {}", request.mode, request.correlation);
    registry.adapter.present(request);
}

impl fmt::Debug for PickerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickerService")
            .field("id", &self.inner.id)
            .field("outstanding", &self.outstanding())
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

/// The result of a dialog invocation.
///
/// Resolves to [`Envelope::cancelled`] if the picker goes away before a result
/// arrives.
pub struct PendingResult {
    correlation: Correlation,
    envelope: LocalBoxFuture<'static, Envelope>,
}

impl PendingResult {
    fn new(correlation: Correlation, recv: Receiver<Envelope>) -> Self {
        Self {
            correlation,
            envelope: async move { recv.recv().await.unwrap_or_else(|_| Envelope::cancelled()) }
                .boxed_local(),
        }
    }

    pub fn correlation(&self) -> Correlation {
        self.correlation
    }
}

impl Future for PendingResult {
    type Output = Envelope;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Envelope> {
        self.envelope.poll_unpin(cx)
    }
}

impl fmt::Debug for PendingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResult")
            .field("correlation", &self.correlation)
            .finish_non_exhaustive()
    }
}
