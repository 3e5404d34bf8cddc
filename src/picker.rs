//! Correlates fire-and-forget native dialog requests with their results.
//!
//! A [`PickerService`] is attached to the [`ServiceRegistry`] of a running
//! session. Every invocation creates a [`DialogRequest`] which is handed to the
//! [`NativeDialogAdapter`]. The adapter eventually reports an [`Envelope`] for
//! the request's [`Correlation`], which the registry routes back to the picker.

pub use {
    envelope::{Envelope, EnvelopeError, EnvelopeKind, SelectedPath},
    registry::ServiceRegistry,
    request::{
        ConfigError, Correlation, DialogConfig, DialogMode, DialogRequest, FileType, RequestId,
        ServiceId,
    },
    service::{PendingResult, PickerService},
};
use thiserror::Error;

mod envelope;
mod registry;
mod request;
mod service;
#[cfg(test)]
pub mod testing;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickerError {
    #[error("A dialog request is already in progress ({0})")]
    RequestAlreadyInProgress(Correlation),
    #[error("Invalid dialog configuration")]
    InvalidConfig(#[source] ConfigError),
    #[error("The picker is not attached to a session")]
    NotAttached,
    #[error("The picker is attached to a different session")]
    AttachedElsewhere,
    #[error("No result handler has been registered")]
    MissingHandler,
    #[error("The session is no longer running")]
    SessionEnded,
}

/// Presents platform dialogs.
///
/// Implementations must eventually report exactly one result per presented
/// request, usually through [`SessionProxy::dispatch`](crate::session::SessionProxy::dispatch).
/// User dismissal is reported as [`Envelope::cancelled`].
pub trait NativeDialogAdapter {
    fn present(&self, request: &DialogRequest);

    /// Called when the picker owning the request went away before a result
    /// arrived. Any result reported afterwards is dropped.
    fn dismiss(&self, _correlation: Correlation) {}
}
