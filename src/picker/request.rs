use {
    std::{
        collections::BTreeSet,
        fmt,
        path::PathBuf,
        sync::atomic::{AtomicU64, Ordering::Relaxed},
    },
    thiserror::Error,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DialogMode {
    PickFiles,
    PickFilesMultiple,
    PickDirectory,
    SaveFile,
}

/// Coarse content filter offered by most native dialogs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FileType {
    #[default]
    Any,
    Image,
    Video,
    Audio,
    Media,
    /// Only the configured extensions.
    Custom,
}

impl FileType {
    pub fn mime_types(self) -> &'static [&'static str] {
        match self {
            FileType::Any | FileType::Custom => &[],
            FileType::Image => &["image/*"],
            FileType::Video => &["video/*"],
            FileType::Audio => &["audio/*"],
            FileType::Media => &["image/*", "video/*"],
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Extensions must not be empty")]
    EmptyExtension,
    #[error("Extension `{0}` must be given without a leading `.`")]
    LeadingSeparator(String),
    #[error("Extension `{0}` contains a path separator")]
    PathSeparator(String),
    #[error("Saving requires a default file name")]
    MissingFileName,
    #[error("A custom file type requires at least one extension")]
    CustomWithoutExtensions,
    #[error("Extensions can only be combined with a custom file type, not {0:?}")]
    ExtensionsRequireCustom(FileType),
}

/// How a native dialog should be presented.
///
/// An empty extension set means that every file is accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialogConfig {
    pub title: Option<String>,
    pub extensions: BTreeSet<String>,
    pub allow_multiple: bool,
    pub file_name: Option<String>,
    pub initial_directory: Option<PathBuf>,
    pub file_type: FileType,
}

impl DialogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.extend(extensions.into_iter().map(Into::into));
        self
    }

    pub fn with_multiple(mut self, allow_multiple: bool) -> Self {
        self.allow_multiple = allow_multiple;
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_initial_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.initial_directory = Some(dir.into());
        self
    }

    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = file_type;
        self
    }

    /// Checks the configuration and returns the form the adapter sees.
    pub(super) fn validate_for(mut self, mode: DialogMode) -> Result<Self, ConfigError> {
        for ext in &self.extensions {
            if ext.trim().is_empty() {
                return Err(ConfigError::EmptyExtension);
            }
            if ext.starts_with('.') {
                return Err(ConfigError::LeadingSeparator(ext.clone()));
            }
            if ext.contains(['/', '\\']) {
                return Err(ConfigError::PathSeparator(ext.clone()));
            }
        }
        match (self.file_type, self.extensions.is_empty()) {
            (FileType::Custom, true) => return Err(ConfigError::CustomWithoutExtensions),
            (FileType::Any, false) => self.file_type = FileType::Custom,
            (FileType::Custom, false) | (_, true) => {}
            (other, false) => return Err(ConfigError::ExtensionsRequireCustom(other)),
        }
        match mode {
            DialogMode::PickFiles => {}
            DialogMode::PickFilesMultiple => self.allow_multiple = true,
            DialogMode::PickDirectory => self.allow_multiple = false,
            DialogMode::SaveFile => {
                if self.file_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                    return Err(ConfigError::MissingFileName);
                }
                self.allow_multiple = false;
            }
        }
        Ok(self)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId(u64);

impl ServiceId {
    pub(super) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Relaxed))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(super) u64);

/// Links a native dialog session to the picker that started it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Correlation {
    pub service: ServiceId,
    pub request: RequestId,
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "picker-{}/request-{}", self.service.0, self.request.0)
    }
}

/// One outstanding dialog invocation.
#[derive(Clone, Debug)]
pub struct DialogRequest {
    pub correlation: Correlation,
    pub mode: DialogMode,
    pub config: DialogConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_extension_set_is_unrestricted() {
        let config = DialogConfig::new().validate_for(DialogMode::PickFiles).unwrap();
        assert!(config.extensions.is_empty());
        assert_eq!(config.file_type, FileType::Any);
    }

    #[test]
    fn extensions_imply_custom() {
        let config = DialogConfig::new()
            .with_extensions(["txt", "pdf"])
            .validate_for(DialogMode::PickFiles)
            .unwrap();
        assert_eq!(config.file_type, FileType::Custom);
        assert_eq!(config.extensions.len(), 2);
    }

    #[test]
    fn rejects_malformed_extensions() {
        let check = |ext: &str| {
            DialogConfig::new()
                .with_extensions([ext])
                .validate_for(DialogMode::PickFiles)
        };
        assert_eq!(check(""), Err(ConfigError::EmptyExtension));
        assert_eq!(check(" "), Err(ConfigError::EmptyExtension));
        assert_eq!(check(".txt"), Err(ConfigError::LeadingSeparator(".txt".into())));
        assert_eq!(check("a/b"), Err(ConfigError::PathSeparator("a/b".into())));
    }

    #[test]
    fn save_requires_file_name() {
        assert_eq!(
            DialogConfig::new().validate_for(DialogMode::SaveFile),
            Err(ConfigError::MissingFileName),
        );
        assert_eq!(
            DialogConfig::new()
                .with_file_name("")
                .validate_for(DialogMode::SaveFile),
            Err(ConfigError::MissingFileName),
        );
        assert!(DialogConfig::new()
            .with_file_name("out.log")
            .validate_for(DialogMode::SaveFile)
            .is_ok());
    }

    #[test]
    fn file_type_rules() {
        assert_eq!(
            DialogConfig::new()
                .with_file_type(FileType::Custom)
                .validate_for(DialogMode::PickFiles),
            Err(ConfigError::CustomWithoutExtensions),
        );
        assert_eq!(
            DialogConfig::new()
                .with_file_type(FileType::Image)
                .with_extensions(["png"])
                .validate_for(DialogMode::PickFiles),
            Err(ConfigError::ExtensionsRequireCustom(FileType::Image)),
        );
        assert!(DialogConfig::new()
            .with_file_type(FileType::Audio)
            .validate_for(DialogMode::PickFiles)
            .is_ok());
    }

    #[test]
    fn mode_decides_multiplicity() {
        let multiple = DialogConfig::new()
            .validate_for(DialogMode::PickFilesMultiple)
            .unwrap();
        assert!(multiple.allow_multiple);
        let dir = DialogConfig::new()
            .with_multiple(true)
            .validate_for(DialogMode::PickDirectory)
            .unwrap();
        assert!(!dir.allow_multiple);
        let single = DialogConfig::new()
            .with_multiple(true)
            .validate_for(DialogMode::PickFiles)
            .unwrap();
        assert!(single.allow_multiple);
    }
}
