use {
    crate::{
        app::{Button, Demo, Style},
        console::ConsoleAdapter,
        portal::PortalAdapter,
        session::Session,
    },
    clap::{Parser, ValueEnum},
    error_reporter::Report,
};

/// Presses the buttons of a file picker demo and prints what the dialogs return.
#[derive(Parser, Debug)]
struct Cli {
    /// How dialogs are presented.
    #[clap(long, value_enum, default_value_t = Backend::Portal)]
    pub backend: Backend,
    /// How results are delivered to the demo.
    #[clap(long, value_enum, default_value_t = Style::Callback)]
    pub style: Style,
    /// The window identifier passed to the portal, e.g. `wayland:HANDLE`.
    #[clap(long, default_value = "")]
    pub parent_window: String,
    /// The buttons to press, in order. Defaults to all of them.
    #[clap(value_enum)]
    pub buttons: Vec<Button>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Backend {
    /// The xdg-desktop-portal file chooser.
    Portal,
    /// Prompts on the terminal.
    Console,
}

pub fn main() {
    let args = Cli::parse();
    let session = match args.backend {
        Backend::Portal => {
            Session::try_new(|proxy| PortalAdapter::new(proxy, args.parent_window.clone()))
        }
        Backend::Console => Ok(Session::new(ConsoleAdapter::new)),
    };
    let mut session = match session {
        Ok(s) => s,
        Err(e) => {
            log::error!("Could not connect to the portal: {}", Report::new(e));
            std::process::exit(1);
        }
    };
    let buttons = match args.buttons.is_empty() {
        true => Button::ALL.to_vec(),
        false => args.buttons,
    };
    let demo = Demo::new(&session, &buttons, true);
    demo.start(&session, args.style);
    session.run();
}
