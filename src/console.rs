use {
    crate::{
        picker::{DialogMode, DialogRequest, Envelope, NativeDialogAdapter, SelectedPath},
        session::SessionProxy,
    },
    error_reporter::Report,
    rust_i18n::t,
    std::{
        io::{self, BufRead, Write},
        thread,
    },
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Could not write the prompt")]
    Prompt(#[source] io::Error),
    #[error("Could not read the answer")]
    Read(#[source] io::Error),
}

/// Asks for paths on the terminal instead of showing a native dialog.
///
/// An empty answer cancels the dialog. In multi-selection mode paths are read
/// one per line until an empty line.
pub struct ConsoleAdapter {
    proxy: SessionProxy,
}

impl ConsoleAdapter {
    pub fn new(proxy: &SessionProxy) -> Self {
        Self {
            proxy: proxy.clone(),
        }
    }
}

impl NativeDialogAdapter for ConsoleAdapter {
    fn present(&self, request: &DialogRequest) {
        let request = request.clone();
        let proxy = self.proxy.clone();
        thread::spawn(move || {
            let stdin = io::stdin();
            let stderr = io::stderr();
            let envelope = match ask(&request, &mut stdin.lock(), &mut stderr.lock()) {
                Ok(envelope) => envelope,
                Err(e) => {
                    log::error!("Console dialog failed: {}", Report::new(e));
                    Envelope::cancelled()
                }
            };
            proxy.dispatch(request.correlation, envelope);
        });
    }
}

fn ask(
    request: &DialogRequest,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<Envelope, ConsoleError> {
    let config = &request.config;
    if let Some(title) = &config.title {
        writeln!(output, "{title}").map_err(ConsoleError::Prompt)?;
    }
    let prompt = match request.mode {
        DialogMode::PickDirectory => t!("Directory:").to_string(),
        DialogMode::SaveFile => t!(
            "Save as (suggested %{name}, empty line cancels):",
            name = config.file_name.as_deref().unwrap_or_default()
        )
        .to_string(),
        _ if config.allow_multiple => t!("Files, one per line, empty line to finish:").to_string(),
        _ => t!("File:").to_string(),
    };
    if !config.extensions.is_empty() {
        let extensions = config.extensions.iter().cloned().collect::<Vec<_>>();
        writeln!(output, "[{}]", extensions.join(", ")).map_err(ConsoleError::Prompt)?;
    }
    write!(output, "{prompt} ").map_err(ConsoleError::Prompt)?;
    output.flush().map_err(ConsoleError::Prompt)?;

    let mut paths = vec![];
    loop {
        let mut line = String::new();
        if input.read_line(&mut line).map_err(ConsoleError::Read)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        paths.push(SelectedPath::new(line));
        if !config.allow_multiple {
            break;
        }
    }
    Ok(match Envelope::for_mode(request.mode, paths) {
        Ok(envelope) => envelope,
        Err(e) => {
            log::warn!("{}", Report::new(e));
            Envelope::cancelled()
        }
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::picker::{Correlation, DialogConfig, EnvelopeKind, PickerService, RequestId},
        std::path::PathBuf,
    };

    fn request(mode: DialogMode, config: DialogConfig) -> DialogRequest {
        DialogRequest {
            correlation: Correlation {
                service: PickerService::new().id(),
                request: RequestId::default(),
            },
            mode,
            config,
        }
    }

    fn answer(request: &DialogRequest, input: &str) -> (Envelope, String) {
        let mut output = vec![];
        let env = ask(request, &mut input.as_bytes(), &mut output).unwrap();
        (env, String::from_utf8(output).unwrap())
    }

    #[test]
    fn empty_answer_cancels() {
        let (env, _) = answer(&request(DialogMode::PickDirectory, DialogConfig::new()), "\n");
        assert!(env.is_cancelled());
        let (env, _) = answer(&request(DialogMode::PickDirectory, DialogConfig::new()), "");
        assert!(env.is_cancelled());
    }

    #[test]
    fn multiple_reads_until_blank_line() {
        let config = DialogConfig::new().with_multiple(true).with_title("Pick");
        let (env, prompt) = answer(
            &request(DialogMode::PickFilesMultiple, config),
            "/a.txt\n/b.pdf\n\n/c\n",
        );
        assert!(prompt.starts_with("Pick\n"));
        assert_eq!(env.kind(), EnvelopeKind::FilesSelected);
        let locations: Vec<_> = env.paths().iter().map(|p| p.location.clone()).collect();
        assert_eq!(locations, [PathBuf::from("/a.txt"), PathBuf::from("/b.pdf")]);
    }

    #[test]
    fn single_file_reads_one_line() {
        let config = DialogConfig::new().with_extensions(["txt"]);
        let (env, prompt) = answer(&request(DialogMode::PickFiles, config), "/a.txt\n/b.txt\n");
        assert!(prompt.contains("[txt]"));
        assert_eq!(env.paths().len(), 1);
    }

    #[test]
    fn empty_save_answer_cancels() {
        let config = DialogConfig::new().with_file_name("out.log");
        let (env, prompt) = answer(&request(DialogMode::SaveFile, config), "\n");
        assert!(prompt.contains("suggested out.log"));
        assert!(prompt.contains("empty line cancels"));
        assert!(env.is_cancelled());
    }

    #[test]
    fn save_answer() {
        let config = DialogConfig::new().with_file_name("out.log");
        let (env, prompt) = answer(&request(DialogMode::SaveFile, config), "/tmp/out.log\n");
        assert!(prompt.contains("out.log"));
        assert_eq!(env.kind(), EnvelopeKind::SavePathChosen);
    }
}
