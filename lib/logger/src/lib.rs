//! `log` front end for the loader.
//!
//! Records are forwarded to whatever implements [`LogInterface`]; the loader
//! binary provides it and owns the console.

#![cfg_attr(not(test), no_std)]

use crate_interface::call_interface;
use log::{Level, LevelFilter};

struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        call_interface!(LogInterface::print_log(record));
    }

    fn flush(&self) {}
}

/// Output side of the logger, implemented once by the binary.
#[crate_interface::def_interface]
pub trait LogInterface: Send + Sync {
    fn print_log(record: &log::Record);
}

/// Installs the logger. The level comes from `LOG` at build time and
/// defaults to `info`.
pub fn init() {
    static LOGGER: SimpleLogger = SimpleLogger;
    log::set_logger(&LOGGER).ok();
    log::set_max_level(level_filter(option_env!("LOG")));
}

fn level_filter(name: Option<&str>) -> LevelFilter {
    match name {
        Some("trace") => LevelFilter::Trace,
        Some("debug") => LevelFilter::Debug,
        Some("info") => LevelFilter::Info,
        Some("warn") => LevelFilter::Warn,
        Some("error") => LevelFilter::Error,
        Some("off") => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// ANSI color code for `level`.
pub fn level2color(level: Level) -> u8 {
    match level {
        Level::Error => 31, // Red
        Level::Warn => 93,  // BrightYellow
        Level::Info => 36,  // Cyan
        Level::Debug => 32, // Green
        Level::Trace => 90, // BrightBlack
    }
}
