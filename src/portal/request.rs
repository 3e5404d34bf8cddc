use {
    crate::portal::{response::SelectionResults, PortalError},
    async_channel::Receiver,
    futures_util::{
        future::{self, Either},
        StreamExt,
    },
    rand::{distributions::Alphanumeric, Rng},
    std::{future::Future, pin::pin},
    zbus::{
        proxy,
        zvariant::{ObjectPath, OwnedObjectPath},
        Connection,
    },
};

#[proxy(
    interface = "org.freedesktop.portal.Request",
    default_service = "org.freedesktop.portal.Desktop",
    gen_blocking = false
)]
trait Request {
    fn close(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn response(&self, response: u32, results: SelectionResults) -> zbus::Result<()>;
}

/// A random `handle_token`.
pub fn handle_token() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("picker_{suffix}")
}

/// The object path the portal will use for a request with `token`.
pub fn request_path(session: &Connection, token: &str) -> Result<OwnedObjectPath, PortalError> {
    let sender = session
        .unique_name()
        .ok_or(PortalError::NoUniqueName)?
        .as_str()
        .trim_start_matches(':')
        .replace('.', "_");
    let path = format!("/org/freedesktop/portal/desktop/request/{sender}/{token}");
    ObjectPath::try_from(path)
        .map(OwnedObjectPath::from)
        .map_err(PortalError::InvalidRequestPath)
}

async fn request_proxy(
    session: &Connection,
    path: &OwnedObjectPath,
) -> Result<RequestProxy<'static>, PortalError> {
    RequestProxy::builder(session)
        .path(path.as_str().to_owned())
        .map_err(PortalError::CreateRequestProxy)?
        .build()
        .await
        .map_err(PortalError::CreateRequestProxy)
}

/// Performs the method `call` that creates the request at `expected` and waits
/// until the portal reports its result.
///
/// The signal subscription has to exist before the call, otherwise a fast
/// response is lost. Returns `None` once `dismissed` is closed. A dialog that
/// is already open at that point is closed first. If `dismissed` is closed
/// before the call, the call is never made.
pub async fn run(
    session: &Connection,
    expected: &OwnedObjectPath,
    dismissed: &Receiver<()>,
    call: impl Future<Output = Result<OwnedObjectPath, PortalError>>,
) -> Result<Option<(u32, SelectionResults)>, PortalError> {
    let mut responses = request_proxy(session, expected)
        .await?
        .receive_response()
        .await
        .map_err(PortalError::SubscribeResponse)?;
    if dismissed.is_closed() {
        return Ok(None);
    }
    let handle = call.await?;
    if handle.as_str() != expected.as_str() {
        // Portals older than version 0.9 ignore handle_token.
        log::warn!(
            "Portal returned request handle {}, expected {}",
            handle.as_str(),
            expected.as_str(),
        );
        responses = request_proxy(session, &handle)
            .await?
            .receive_response()
            .await
            .map_err(PortalError::SubscribeResponse)?;
    }
    let next = pin!(responses.next());
    let closed = pin!(dismissed.recv());
    let response = match future::select(next, closed).await {
        Either::Left((response, _)) => response.ok_or(PortalError::ResponseStreamEnded)?,
        Either::Right(_) => {
            log::debug!("Closing dismissed dialog {}", handle.as_str());
            close(session, &handle).await?;
            return Ok(None);
        }
    };
    let args = response.args().map_err(PortalError::DecodeResponse)?;
    let results = SelectionResults {
        uris: args.results().uris.clone(),
        current_filter: args.results().current_filter.clone(),
    };
    Ok(Some((*args.response(), results)))
}

/// Asks the portal to close the dialog belonging to the request at `path`.
pub async fn close(session: &Connection, path: &OwnedObjectPath) -> Result<(), PortalError> {
    request_proxy(session, path)
        .await?
        .close()
        .await
        .map_err(PortalError::CloseRequest)
}
