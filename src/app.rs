use {
    crate::{
        picker::{DialogConfig, DialogMode, Envelope, PickerService},
        session::{Session, SessionProxy},
    },
    clap::ValueEnum,
    error_reporter::Report,
    futures_util::task::LocalSpawnExt,
    rust_i18n::t,
    std::{
        cell::RefCell,
        collections::VecDeque,
        rc::{Rc, Weak},
    },
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Button {
    PickFile,
    PickFiles,
    PickDirectory,
    SaveFile,
}

impl Button {
    pub const ALL: [Button; 4] = [
        Button::PickFile,
        Button::PickFiles,
        Button::PickDirectory,
        Button::SaveFile,
    ];

    pub fn mode(self) -> DialogMode {
        match self {
            Button::PickFile => DialogMode::PickFiles,
            Button::PickFiles => DialogMode::PickFilesMultiple,
            Button::PickDirectory => DialogMode::PickDirectory,
            Button::SaveFile => DialogMode::SaveFile,
        }
    }

    pub fn config(self) -> DialogConfig {
        match self {
            Button::PickFile => DialogConfig::new()
                .with_title(t!("Pick a single file").to_string())
                .with_extensions(["txt", "pdf", "png", "jpg", "jpeg"]),
            Button::PickFiles => DialogConfig::new()
                .with_title(t!("Pick multiple files").to_string())
                .with_multiple(true),
            Button::PickDirectory => DialogConfig::new().with_title(t!("Pick a directory").to_string()),
            Button::SaveFile => DialogConfig::new()
                .with_title(t!("Save file as...").to_string())
                .with_file_name("output.txt")
                .with_extensions(["txt", "log", "md"]),
        }
    }

    fn panel(self) -> Panel {
        match self {
            Button::PickFile | Button::PickFiles => Panel::Files,
            Button::PickDirectory => Panel::Directory,
            Button::SaveFile => Panel::Save,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Style {
    /// Results are delivered to handlers registered on the pickers.
    Callback,
    /// Each button press awaits its result.
    Await,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Panel {
    Files,
    Directory,
    Save,
}

/// The status and result labels of the demo window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct View {
    pub status: String,
    pub result: String,
}

impl Default for View {
    fn default() -> Self {
        Self {
            status: t!("Ready to pick files").to_string(),
            result: t!("No file selected yet").to_string(),
        }
    }
}

impl View {
    fn opening(&mut self, panel: Panel) {
        self.status = match panel {
            Panel::Files => t!("Opening file picker...").to_string(),
            Panel::Directory => t!("Opening directory picker...").to_string(),
            Panel::Save => t!("Opening save dialog...").to_string(),
        };
    }

    fn show(&mut self, panel: Panel, envelope: &Envelope) {
        let (status, result) = match (panel, envelope.is_cancelled()) {
            (Panel::Files, false) => {
                let paths: Vec<_> = envelope
                    .paths()
                    .iter()
                    .map(|p| p.location.display().to_string())
                    .collect();
                (
                    t!("%{count} file(s) selected", count = paths.len()).to_string(),
                    format!("{}\n{}", t!("Selected file(s):"), paths.join("\n")),
                )
            }
            (Panel::Files, true) => (
                t!("File selection cancelled").to_string(),
                t!("No file selected (cancelled)").to_string(),
            ),
            (Panel::Directory, false) => (
                t!("Directory selected").to_string(),
                format!("{}\n{}", t!("Selected directory:"), first_path(envelope)),
            ),
            (Panel::Directory, true) => (
                t!("Directory selection cancelled").to_string(),
                t!("No directory selected (cancelled)").to_string(),
            ),
            (Panel::Save, false) => (
                t!("Save path selected").to_string(),
                format!("{}\n{}", t!("Save file path:"), first_path(envelope)),
            ),
            (Panel::Save, true) => (
                t!("Save operation cancelled").to_string(),
                t!("Save file cancelled").to_string(),
            ),
        };
        self.status = status;
        self.result = result;
    }

    pub fn render(&self) -> String {
        format!(
            "== {} ==\n{}\n\n{}\n",
            t!("File picker demo"),
            self.status,
            self.result
        )
    }
}

fn first_path(envelope: &Envelope) -> String {
    envelope
        .paths()
        .first()
        .map(|p| p.location.display().to_string())
        .unwrap_or_default()
}

/// Presses a sequence of buttons, one after the other, and renders every
/// change of the view.
pub struct Demo {
    files: PickerService,
    directory: PickerService,
    save: PickerService,
    proxy: SessionProxy,
    view: RefCell<View>,
    queue: RefCell<VecDeque<Button>>,
    frames: RefCell<Vec<String>>,
    echo: bool,
}

impl Demo {
    pub fn new(session: &Session, buttons: &[Button], echo: bool) -> Rc<Self> {
        Rc::new_cyclic(|slf: &Weak<Demo>| {
            let picker = |panel: Panel| {
                let slf = slf.clone();
                let picker = session.picker();
                picker.on_result(move |envelope| {
                    if let Some(slf) = slf.upgrade() {
                        slf.show(panel, &envelope);
                        slf.press_next();
                    }
                });
                picker
            };
            Self {
                files: picker(Panel::Files),
                directory: picker(Panel::Directory),
                save: picker(Panel::Save),
                proxy: session.proxy().clone(),
                view: Default::default(),
                queue: RefCell::new(buttons.iter().copied().collect()),
                frames: Default::default(),
                echo,
            }
        })
    }

    pub fn start(self: &Rc<Self>, session: &Session, style: Style) {
        self.render();
        match style {
            Style::Callback => self.press_next(),
            Style::Await => {
                let slf = self.clone();
                if let Err(e) = session.spawner().spawn_local(slf.run_awaiting()) {
                    log::error!("Could not start the demo: {e}");
                    self.proxy.quit();
                }
            }
        }
    }

    pub fn view(&self) -> View {
        self.view.borrow().clone()
    }

    pub fn frames(&self) -> Vec<String> {
        self.frames.borrow().clone()
    }

    fn picker(&self, panel: Panel) -> &PickerService {
        match panel {
            Panel::Files => &self.files,
            Panel::Directory => &self.directory,
            Panel::Save => &self.save,
        }
    }

    fn next_button(&self) -> Option<Button> {
        let button = self.queue.borrow_mut().pop_front()?;
        self.view.borrow_mut().opening(button.panel());
        self.render();
        Some(button)
    }

    fn press_next(&self) {
        while let Some(button) = self.next_button() {
            let picker = self.picker(button.panel());
            match picker.request(button.mode(), button.config()) {
                Ok(()) => return,
                Err(e) => log::error!("Could not press {:?}: {}", button, Report::new(e)),
            }
        }
        self.proxy.quit();
    }

    async fn run_awaiting(self: Rc<Self>) {
        while let Some(button) = self.next_button() {
            let panel = button.panel();
            let pending = match self.picker(panel).invoke(button.mode(), button.config()) {
                Ok(pending) => pending,
                Err(e) => {
                    log::error!("Could not press {:?}: {}", button, Report::new(e));
                    continue;
                }
            };
            let envelope = pending.await;
            self.show(panel, &envelope);
        }
        self.proxy.quit();
    }

    fn show(&self, panel: Panel, envelope: &Envelope) {
        log::info!("{:?} finished with {:?}", panel, envelope.kind());
        self.view.borrow_mut().show(panel, envelope);
        self.render();
    }

    fn render(&self) {
        let frame = self.view.borrow().render();
        if self.echo {
            println!("{frame}");
        }
        self.frames.borrow_mut().push(frame);
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::picker::{testing::RecordingAdapter, SelectedPath},
    };

    fn answer(adapter: &RecordingAdapter, session: &mut Session, paths: &[&str]) {
        let request = adapter.last().unwrap();
        let paths = paths.iter().map(SelectedPath::new).collect();
        let envelope = Envelope::for_mode(request.mode, paths).unwrap();
        session.proxy().dispatch(request.correlation, envelope);
    }

    fn run_demo(style: Style) {
        let adapter = RecordingAdapter::default();
        let mut session = Session::new(|_| adapter.clone());
        let demo = Demo::new(&session, &Button::ALL, false);
        demo.start(&session, style);
        assert!(session.run_until_stalled());
        assert_eq!(demo.view().status, "Opening file picker...");

        answer(&adapter, &mut session, &["/a.txt"]);
        assert!(session.run_until_stalled());
        answer(&adapter, &mut session, &[]);
        assert!(session.run_until_stalled());
        assert_eq!(demo.view().result, "No file selected (cancelled)");
        answer(&adapter, &mut session, &["/srv"]);
        assert!(session.run_until_stalled());
        assert_eq!(demo.view().result, "Selected directory:\n/srv");
        answer(&adapter, &mut session, &["/tmp/output.txt"]);
        assert!(!session.run_until_stalled());

        let view = demo.view();
        assert_eq!(view.status, "Save path selected");
        assert_eq!(view.result, "Save file path:\n/tmp/output.txt");
        let modes: Vec<_> = adapter.presented().iter().map(|r| r.mode).collect();
        assert_eq!(modes, Button::ALL.map(Button::mode));
        assert!(demo
            .frames()
            .iter()
            .any(|f| f.contains("1 file(s) selected") && f.contains("/a.txt")));
    }

    #[test]
    fn callback_style_runs_all_buttons() {
        run_demo(Style::Callback);
    }

    #[test]
    fn await_style_runs_all_buttons() {
        run_demo(Style::Await);
    }

    #[test]
    fn files_view_lists_every_path() {
        let mut view = View::default();
        let envelope = Envelope::files_selected(vec![
            SelectedPath::new("/a.txt"),
            SelectedPath::new("/b.pdf"),
        ]);
        view.show(Panel::Files, &envelope);
        assert_eq!(view.status, "2 file(s) selected");
        assert_eq!(view.result, "Selected file(s):\n/a.txt\n/b.pdf");
    }

    #[test]
    fn button_configs_are_valid() {
        let adapter = RecordingAdapter::default();
        let session = Session::new(|_| adapter.clone());
        for button in Button::ALL {
            let picker = session.picker();
            assert!(picker.invoke(button.mode(), button.config()).is_ok());
        }
        let save = adapter.last().unwrap();
        assert_eq!(save.config.file_name.as_deref(), Some("output.txt"));
    }
}
