use {
    crate::{
        picker::{DialogConfig, DialogMode, FileType},
        portal::response::FileFilter,
    },
    rust_i18n::t,
    std::{os::unix::ffi::OsStrExt, path::Path},
    zbus::zvariant::{SerializeDict, Type},
};

const FILTER_GLOB: u32 = 0;
const FILTER_MIME: u32 = 1;

#[derive(SerializeDict, Type, Debug, Default, PartialEq)]
#[zvariant(signature = "dict")]
pub struct OpenFileOptions {
    pub handle_token: Option<String>,
    pub accept_label: Option<String>,
    pub modal: Option<bool>,
    pub multiple: Option<bool>,
    pub directory: Option<bool>,
    pub filters: Option<Vec<FileFilter>>,
    pub current_filter: Option<FileFilter>,
    pub current_folder: Option<Vec<u8>>,
}

#[derive(SerializeDict, Type, Debug, Default, PartialEq)]
#[zvariant(signature = "dict")]
pub struct SaveFileOptions {
    pub handle_token: Option<String>,
    pub accept_label: Option<String>,
    pub modal: Option<bool>,
    pub filters: Option<Vec<FileFilter>>,
    pub current_filter: Option<FileFilter>,
    pub current_name: Option<String>,
    pub current_folder: Option<Vec<u8>>,
}

pub fn open_file_options(mode: DialogMode, config: &DialogConfig, token: &str) -> OpenFileOptions {
    let filters = filters(config);
    OpenFileOptions {
        handle_token: Some(token.to_string()),
        accept_label: (mode == DialogMode::PickDirectory).then(|| t!("_Select").to_string()),
        modal: Some(true),
        multiple: Some(config.allow_multiple),
        directory: Some(mode == DialogMode::PickDirectory),
        current_filter: filters.as_ref().and_then(|f| f.first().cloned()),
        filters,
        current_folder: config.initial_directory.as_deref().map(folder_bytes),
    }
}

pub fn save_file_options(config: &DialogConfig, token: &str) -> SaveFileOptions {
    let filters = filters(config);
    SaveFileOptions {
        handle_token: Some(token.to_string()),
        accept_label: None,
        modal: Some(true),
        current_filter: filters.as_ref().and_then(|f| f.first().cloned()),
        filters,
        current_name: config.file_name.clone(),
        current_folder: config.initial_directory.as_deref().map(folder_bytes),
    }
}

fn filters(config: &DialogConfig) -> Option<Vec<FileFilter>> {
    if !config.extensions.is_empty() {
        let globs: Vec<_> = config
            .extensions
            .iter()
            .map(|ext| (FILTER_GLOB, format!("*.{ext}")))
            .collect();
        let name = globs
            .iter()
            .map(|(_, g)| g.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Some(vec![(name, globs)]);
    }
    let mimes = config.file_type.mime_types();
    if mimes.is_empty() {
        return None;
    }
    let name = match config.file_type {
        FileType::Image => t!("Images").to_string(),
        FileType::Video => t!("Videos").to_string(),
        FileType::Audio => t!("Audio files").to_string(),
        _ => t!("Media files").to_string(),
    };
    let elements = mimes
        .iter()
        .map(|m| (FILTER_MIME, m.to_string()))
        .collect();
    Some(vec![(name, elements)])
}

/// The portal expects a nul-terminated byte string.
fn folder_bytes(dir: &Path) -> Vec<u8> {
    let mut bytes = dir.as_os_str().as_bytes().to_vec();
    bytes.push(0);
    bytes
}
