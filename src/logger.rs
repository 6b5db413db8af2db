use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;

/// Target used by the `print` prelude function for script output.
pub const CONSOLE_TARGET: &str = "js-console";

const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Script output goes to stdout between separator lines; everything else is
/// a diagnostic on stderr.
pub struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if record.target() == CONSOLE_TARGET {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", SEPARATOR);
            let _ = writeln!(out, "{}", console_line(record.level(), &record.args().to_string()));
            let _ = writeln!(out, "{}", SEPARATOR);
        } else {
            let location = match (record.file(), record.line()) {
                (Some(file), Some(line)) => format!("{}:{}", file, line),
                (Some(file), None) => file.to_string(),
                (None, _) => String::from("unknown location"),
            };
            eprintln!(
                "[{level}][{target}][{location}] {message}",
                level = record.level(),
                target = record.target(),
                location = location,
                message = record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

fn console_line(level: Level, message: &str) -> String {
    match level {
        Level::Info => message.to_string(),
        level => format!("[{}] {}", level, message),
    }
}

pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    static LOGGER: ConsoleLogger = ConsoleLogger;
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_line() {
        assert_eq!(console_line(Level::Info, "hello 3"), "hello 3");
        assert_eq!(console_line(Level::Warn, "careful"), "[WARN] careful");
    }
}
