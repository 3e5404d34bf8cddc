use {
    crate::picker::{DialogMode, Envelope, EnvelopeError, SelectedPath},
    std::str::FromStr,
    thiserror::Error,
    url::Url,
    zbus::zvariant::{DeserializeDict, Type},
};

const PORTAL_SUCCESS: u32 = 0;
const PORTAL_CANCELLED: u32 = 1;

pub type FileFilter = (String, Vec<(u32, String)>);

#[derive(DeserializeDict, Type, Debug, Default)]
#[zvariant(signature = "dict")]
pub struct SelectionResults {
    pub uris: Option<Vec<String>>,
    pub current_filter: Option<FileFilter>,
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("The dialog ended with response code {0}")]
    Ended(u32),
    #[error("`{0}` is not a valid URI")]
    InvalidUri(String, #[source] url::ParseError),
    #[error("`{0}` does not refer to a local file")]
    NotAFile(String),
    #[error(transparent)]
    Envelope(EnvelopeError),
}

/// Turns a portal `Response` signal into the envelope for `mode`.
pub fn decode(
    mode: DialogMode,
    code: u32,
    results: &SelectionResults,
) -> Result<Envelope, ResponseError> {
    match code {
        PORTAL_SUCCESS => {}
        PORTAL_CANCELLED => return Ok(Envelope::cancelled()),
        other => return Err(ResponseError::Ended(other)),
    }
    if let Some(filter) = &results.current_filter {
        log::debug!("User finished with filter `{}`", filter.0);
    }
    let mut paths = vec![];
    for uri in results.uris.as_deref().unwrap_or_default() {
        let url = Url::from_str(uri).map_err(|e| ResponseError::InvalidUri(uri.clone(), e))?;
        let path = url
            .to_file_path()
            .map_err(|_| ResponseError::NotAFile(uri.clone()))?;
        paths.push(SelectedPath::new(path));
    }
    Envelope::for_mode(mode, paths).map_err(ResponseError::Envelope)
}
