use {
    crate::picker::request::DialogMode,
    bstr::{ByteSlice, ByteVec},
    std::path::{Path, PathBuf},
    thiserror::Error,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("{mode:?} dialogs produce exactly one path but {count} were reported")]
    NotExactlyOnePath { mode: DialogMode, count: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnvelopeKind {
    FilesSelected,
    DirectorySelected,
    SavePathChosen,
    Cancelled,
}

/// A path chosen in a native dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedPath {
    pub name: String,
    pub location: PathBuf,
}

impl SelectedPath {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        let mut location = location.into();
        if location.is_relative() {
            if let Ok(absolute) = std::path::absolute(&location) {
                location = absolute;
            }
        }
        Self {
            name: display_name(&location),
            location,
        }
    }
}

fn display_name(location: &Path) -> String {
    match location.file_name() {
        Some(name) => <Vec<u8>>::from_os_str_lossy(name).to_str_lossy().into_owned(),
        None => location.display().to_string(),
    }
}

/// The terminal result of a dialog session.
///
/// `Cancelled` is the only kind with an empty path list. Directory and save
/// sessions always carry exactly one path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    kind: EnvelopeKind,
    paths: Vec<SelectedPath>,
}

impl Envelope {
    pub fn cancelled() -> Self {
        Self {
            kind: EnvelopeKind::Cancelled,
            paths: vec![],
        }
    }

    /// An empty selection is reported as a cancellation.
    pub fn files_selected(paths: Vec<SelectedPath>) -> Self {
        if paths.is_empty() {
            return Self::cancelled();
        }
        Self {
            kind: EnvelopeKind::FilesSelected,
            paths,
        }
    }

    pub fn directory_selected(path: SelectedPath) -> Self {
        Self {
            kind: EnvelopeKind::DirectorySelected,
            paths: vec![path],
        }
    }

    pub fn save_path_chosen(path: SelectedPath) -> Self {
        Self {
            kind: EnvelopeKind::SavePathChosen,
            paths: vec![path],
        }
    }

    /// Builds the envelope a dialog of the given mode produces for `paths`.
    pub fn for_mode(mode: DialogMode, mut paths: Vec<SelectedPath>) -> Result<Self, EnvelopeError> {
        if paths.is_empty() {
            return Ok(Self::cancelled());
        }
        match mode {
            DialogMode::PickFiles | DialogMode::PickFilesMultiple => {
                Ok(Self::files_selected(paths))
            }
            DialogMode::PickDirectory | DialogMode::SaveFile => {
                if paths.len() != 1 {
                    return Err(EnvelopeError::NotExactlyOnePath {
                        mode,
                        count: paths.len(),
                    });
                }
                let path = paths.remove(0);
                Ok(match mode {
                    DialogMode::PickDirectory => Self::directory_selected(path),
                    _ => Self::save_path_chosen(path),
                })
            }
        }
    }

    pub fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == EnvelopeKind::Cancelled
    }

    pub fn paths(&self) -> &[SelectedPath] {
        &self.paths
    }

    /// The single path of a directory or save result.
    pub fn path(&self) -> Option<&SelectedPath> {
        match self.kind {
            EnvelopeKind::DirectorySelected | EnvelopeKind::SavePathChosen => self.paths.first(),
            _ => None,
        }
    }
}
