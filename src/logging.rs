use crate::error::ConfigError;
use slog::{o, Discard, Logger};
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

/// A terminal logger writing to stderr at `level`
pub fn terminal_logger(level: Severity) -> Result<Logger, ConfigError> {
    let mut builder = TerminalLoggerBuilder::new();
    builder.level(level);
    builder.destination(Destination::Stderr);

    builder
        .build()
        .map_err(|e| ConfigError::Logger(e.to_string()))
}

/// Used when the caller doesn't hand us a logger
pub fn discard_logger() -> Logger {
    Logger::root(Discard, o!())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slog::info;

    #[test]
    fn build_terminal_logger() {
        let logger = terminal_logger(Severity::Warning).unwrap();
        info!(logger, "filtered out"; "level" => "info");
    }

    #[test]
    fn discard_accepts_anything() {
        let logger = discard_logger();
        info!(logger, "nobody hears this");
    }
}
