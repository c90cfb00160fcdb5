//! Logger used by the demo binary.

use owo_colors::OwoColorize;
use std::fmt;

struct Logger;

impl log::Log for Logger {
    #[allow(unused_variables)]
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        #[cfg(any(debug_assertions, feature = "logging"))]
        return true;
        #[cfg(all(not(debug_assertions), not(feature = "logging")))]
        return metadata.level() <= log::Level::Info;
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            let mod_path = record
                .module_path_static()
                .or_else(|| record.module_path())
                .unwrap_or("<n/a>");

            println!("[ {} ] [{}] {}", Level(record.level()), mod_path, record.args());
        }
    }

    fn flush(&self) {}
}

/// A log level, printed padded and in its own color.
struct Level(log::Level);

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = format!("{:>5}", self.0);
        match self.0 {
            log::Level::Error => write!(f, "{}", name.red()),
            log::Level::Warn => write!(f, "{}", name.yellow()),
            log::Level::Info => write!(f, "{}", name.cyan()),
            log::Level::Debug => write!(f, "{}", name.magenta()),
            log::Level::Trace => write!(f, "{}", name.dimmed()),
        }
    }
}

pub fn init_logging() {
    log::set_logger(&Logger).expect("failed to init logging");
    log::set_max_level(log::LevelFilter::Trace);
}
