use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};

/// Daily rolling `<log_dir>/app.log`. Keep the guard alive for the life of the
/// process or buffered lines are lost.
pub fn init_file(log_dir: &str, level: Level) -> WorkerGuard {
    let file_appender = rolling::daily(log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    guard
}

/// Plain stdout logging for the one-shot tools.
pub fn init_stdout(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}
