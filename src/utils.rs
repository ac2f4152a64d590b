//! Ease of use functions to make cleaner code.

use log::error;
use log::LevelFilter;

/// Initialize the global logger.
///
/// The verbosity level is meant to come from the CLI verbosity flag, but any
/// [log][LevelFilter] works. Calling this twice panics (the logger can only
/// be set once), so library users who bring their own logger should simply
/// not call it.
pub fn activate_logging(log_level: LevelFilter) {
    env_logger::Builder::new().filter_level(log_level).init();
}

// -------------------------------------------------------------------------------------------------

pub trait LogOnErr {
    fn log_on_err(self) -> Self;
}

/// Log the error at error-level before handing it back, otherwise do nothing.
impl<T, E: std::fmt::Display> LogOnErr for Result<T, E> {
    fn log_on_err(self) -> Self {
        if let Err(ref err) = self {
            error!("{}", err);
        }
        self
    }
}
