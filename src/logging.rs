use {
    log::{Level, LevelFilter},
    std::{
        env,
        fs::File,
        io::{self, Write},
        os::{fd::AsFd, linux::fs::MetadataExt},
    },
};

pub fn init() {
    let mut builder = env_logger::builder();
    if stderr_is_journal() {
        builder.format(|f, r| {
            write!(f, "<{}>", journal_priority(r.level()))?;
            if let Some(path) = r.module_path() {
                write!(f, "{path}: ")?;
            }
            writeln!(f, "{}", r.args())
        });
    } else {
        builder.default_format();
    }
    builder
        .filter_level(LevelFilter::Info)
        // zbus logs every message at debug level
        .filter_module("zbus", LevelFilter::Warn)
        .parse_default_env()
        .init();
}

/// The syslog priority journald expects as a line prefix.
fn journal_priority(level: Level) -> u8 {
    match level {
        Level::Error => 3,
        Level::Warn => 4,
        Level::Info => 6,
        Level::Debug | Level::Trace => 7,
    }
}

fn parse_journal_stream(value: &str) -> Option<(u64, u64)> {
    let (dev, ino) = value.split_once(':')?;
    Some((dev.parse().ok()?, ino.parse().ok()?))
}

fn stderr_is_journal() -> bool {
    let Some((dev, ino)) = env::var("JOURNAL_STREAM")
        .ok()
        .and_then(|v| parse_journal_stream(&v))
    else {
        return false;
    };
    let Ok(stderr) = io::stderr().as_fd().try_clone_to_owned() else {
        return false;
    };
    let Ok(metadata) = File::from(stderr).metadata() else {
        return false;
    };
    metadata.st_dev() == dev && metadata.st_ino() == ino
}
