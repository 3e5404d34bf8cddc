use {
    crate::{
        picker::{Correlation, DialogMode, DialogRequest, Envelope, NativeDialogAdapter},
        session::SessionProxy,
    },
    async_channel::{Receiver, Sender},
    error_reporter::Report,
    options::{OpenFileOptions, SaveFileOptions},
    std::{
        collections::HashMap,
        sync::{Arc, Mutex, MutexGuard, PoisonError},
        thread,
    },
    thiserror::Error,
    zbus::{proxy, zvariant::OwnedObjectPath, Connection},
};

mod options;
mod request;
mod response;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Could not connect to session bus")]
    Connection(#[source] zbus::Error),
    #[error("Could not create the file chooser proxy")]
    CreateFileChooserProxy(#[source] zbus::Error),
    #[error("The session bus connection has no unique name")]
    NoUniqueName,
    #[error("The predicted request path is invalid")]
    InvalidRequestPath(#[source] zbus::zvariant::Error),
    #[error("Could not create the request proxy")]
    CreateRequestProxy(#[source] zbus::Error),
    #[error("Could not subscribe to the request response")]
    SubscribeResponse(#[source] zbus::Error),
    #[error("Could not open the dialog")]
    Call(#[source] zbus::Error),
    #[error("The connection closed before the dialog finished")]
    ResponseStreamEnded,
    #[error("Could not decode the request response")]
    DecodeResponse(#[source] zbus::Error),
    #[error("Could not close the request")]
    CloseRequest(#[source] zbus::Error),
    #[error("The portal response is not usable")]
    Response(#[source] response::ResponseError),
}

#[proxy(
    interface = "org.freedesktop.portal.FileChooser",
    default_service = "org.freedesktop.portal.Desktop",
    default_path = "/org/freedesktop/portal/desktop",
    gen_blocking = false
)]
trait FileChooser {
    fn open_file(
        &self,
        parent_window: &str,
        title: &str,
        options: OpenFileOptions,
    ) -> zbus::Result<OwnedObjectPath>;

    fn save_file(
        &self,
        parent_window: &str,
        title: &str,
        options: SaveFileOptions,
    ) -> zbus::Result<OwnedObjectPath>;
}

/// Presents dialogs through the `org.freedesktop.portal.FileChooser` portal.
///
/// Every dialog is driven by its own thread. Results are sent back to the
/// session through its proxy.
pub struct PortalAdapter {
    session: Connection,
    proxy: SessionProxy,
    parent_window: String,
    dialogs: OpenDialogs,
}

impl PortalAdapter {
    pub fn new(proxy: &SessionProxy, parent_window: String) -> Result<Self, PortalError> {
        let session = zbus::blocking::Connection::session()
            .map_err(PortalError::Connection)?
            .into_inner();
        Ok(Self {
            session,
            proxy: proxy.clone(),
            parent_window,
            dialogs: Default::default(),
        })
    }
}

impl NativeDialogAdapter for PortalAdapter {
    fn present(&self, request: &DialogRequest) {
        let correlation = request.correlation;
        let dialog = Dialog {
            session: self.session.clone(),
            parent_window: self.parent_window.clone(),
            request: request.clone(),
            dismissed: self.dialogs.open(correlation),
        };
        let dialogs = self.dialogs.clone();
        let proxy = self.proxy.clone();
        thread::spawn(move || {
            let envelope = match futures_executor::block_on(dialog.run()) {
                Ok(envelope) => envelope,
                Err(e) => {
                    log::error!("{:?} dialog failed: {}", dialog.request.mode, Report::new(e));
                    Envelope::cancelled()
                }
            };
            dialogs.forget(correlation);
            proxy.dispatch(correlation, envelope);
        });
    }

    fn dismiss(&self, correlation: Correlation) {
        if !self.dialogs.dismiss(correlation) {
            log::debug!("Dialog for {correlation} has already finished");
        }
    }
}

/// The dialogs whose worker threads are still running.
///
/// Dropping the sender of a dialog tells its worker to close the dialog and
/// stop waiting for a response.
#[derive(Clone, Default)]
struct OpenDialogs {
    dismiss: Arc<Mutex<HashMap<Correlation, Sender<()>>>>,
}

impl OpenDialogs {
    fn open(&self, correlation: Correlation) -> Receiver<()> {
        let (send, recv) = async_channel::bounded(1);
        self.lock().insert(correlation, send);
        recv
    }

    /// Returns whether the dialog was still open.
    fn dismiss(&self, correlation: Correlation) -> bool {
        self.lock().remove(&correlation).is_some()
    }

    fn forget(&self, correlation: Correlation) {
        self.lock().remove(&correlation);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Correlation, Sender<()>>> {
        self.dismiss.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Dialog {
    session: Connection,
    parent_window: String,
    request: DialogRequest,
    dismissed: Receiver<()>,
}

impl Dialog {
    async fn run(&self) -> Result<Envelope, PortalError> {
        let chooser = FileChooserProxy::new(&self.session)
            .await
            .map_err(PortalError::CreateFileChooserProxy)?;
        let token = request::handle_token();
        let expected = request::request_path(&self.session, &token)?;
        let DialogRequest { mode, config, .. } = &self.request;
        let title = config.title.clone().unwrap_or_default();
        log::info!("Opening {:?} dialog `{}` ({})", mode, title, self.request.correlation);
        let call = async {
            let res = match mode {
                DialogMode::SaveFile => {
                    chooser
                        .save_file(
                            &self.parent_window,
                            &title,
                            options::save_file_options(config, &token),
                        )
                        .await
                }
                _ => {
                    chooser
                        .open_file(
                            &self.parent_window,
                            &title,
                            options::open_file_options(*mode, config, &token),
                        )
                        .await
                }
            };
            res.map_err(PortalError::Call)
        };
        let response = request::run(&self.session, &expected, &self.dismissed, call).await?;
        let Some((code, results)) = response else {
            log::info!("Dialog for {} was dismissed", self.request.correlation);
            return Ok(Envelope::cancelled());
        };
        response::decode(*mode, code, &results).map_err(PortalError::Response)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::picker::{PickerService, RequestId},
    };

    fn correlation() -> Correlation {
        Correlation {
            service: PickerService::new().id(),
            request: RequestId::default(),
        }
    }

    #[test]
    fn dismiss_reaches_worker_that_has_not_started() {
        let dialogs = OpenDialogs::default();
        let id = correlation();
        let dismissed = dialogs.open(id);
        assert!(!dismissed.is_closed());
        assert!(dialogs.dismiss(id));
        assert!(dismissed.is_closed());
        assert!(futures_executor::block_on(dismissed.recv()).is_err());
        assert!(!dialogs.dismiss(id));
    }

    #[test]
    fn finished_dialogs_are_not_dismissed() {
        let dialogs = OpenDialogs::default();
        let first = correlation();
        let second = correlation();
        let _first_dismissed = dialogs.open(first);
        let second_dismissed = dialogs.open(second);
        dialogs.forget(first);
        assert!(!dialogs.dismiss(first));
        assert!(!second_dismissed.is_closed());
        assert!(dialogs.dismiss(second));
        assert!(second_dismissed.is_closed());
    }
}
