use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const SERVER_DIRECTIVES: &str = "tasktrack=debug,tower_http=debug";
pub const CLIENT_DIRECTIVES: &str = "tasktrack=info";

fn filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directives.into())
}

/// Logs to stderr. A second call is a no-op.
pub fn init_stderr(default_directives: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter(default_directives))
        .with(fmt::layer().with_writer(io::stderr))
        .try_init();
}

/// Logs to an append-only file, for when the terminal belongs to the board.
pub fn init_file(path: &Path, default_directives: &str) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = tracing_subscriber::registry()
        .with(filter(default_directives))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init();
    Ok(())
}
