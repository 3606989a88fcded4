use crate::sink::{PutC, console_write};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct ConsoleLogger {
    max_level: LevelFilter,
    putc: PutC,
}

impl ConsoleLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter, putc: PutC) -> Self {
        Self { max_level, putc }
    }

    #[must_use]
    pub const fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    /// Install this logger. Call once during early init.
    ///
    /// # Errors
    /// [`SetLoggerError`] if a logger has already been installed.
    pub fn init(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.max_level);
        Ok(())
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Format: "[LEVEL] target: message\r\n"
        console_write(
            self.putc,
            format_args!("[{}] {}: {}\n", record.level(), record.target(), record.args()),
        );
    }

    fn flush(&self) {
        // unbuffered
    }
}

#[cfg(all(test, feature = "enabled"))]
mod tests {
    use super::*;
    use log::Level;
    use std::cell::RefCell;

    thread_local! {
        static CAPTURED: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
    }

    fn capture(b: u8) {
        CAPTURED.with_borrow_mut(|buf| buf.push(b));
    }

    fn captured() -> String {
        CAPTURED.with_borrow_mut(|buf| String::from_utf8(std::mem::take(buf)).expect("ascii"))
    }

    fn log_at(logger: &ConsoleLogger, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .target("sli_link::train")
                .args(format_args!("{message}"))
                .build(),
        );
    }

    #[test]
    fn formats_level_target_and_message() {
        let logger = ConsoleLogger::new(LevelFilter::Debug, capture);
        log_at(&logger, Level::Info, "SLI linked");
        assert_eq!(captured(), "[INFO] sli_link::train: SLI linked\r\n");
    }

    #[test]
    fn drops_records_above_the_maximum_level() {
        let logger = ConsoleLogger::new(LevelFilter::Warn, capture);
        log_at(&logger, Level::Debug, "tap 3: pass");
        log_at(&logger, Level::Error, "aborted");
        assert_eq!(captured(), "[ERROR] sli_link::train: aborted\r\n");
    }

    #[test]
    fn embedded_line_feeds_get_carriage_returns() {
        let logger = ConsoleLogger::new(LevelFilter::Trace, capture);
        log_at(&logger, Level::Warn, "a\nb");
        assert_eq!(captured(), "[WARN] sli_link::train: a\r\nb\r\n");
    }
}
