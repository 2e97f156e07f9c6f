//! FILENAME: core/engine/src/logging.rs
// PURPOSE: Category-tagged logging macros shared by the workspace crates.
// The category becomes the `log` target, so a host can route or filter
// "TABLE", "PIVOT", "CSV" output independently. Library code never installs
// a logger; that is up to the embedding binary.

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        $crate::log::debug!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        $crate::log::info!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        $crate::log::warn!(target: $cat, $($arg)*)
    };
}

// Re-export the macros so they can be imported via `use engine::logging::log_info;`
pub use log_debug;
pub use log_info;
pub use log_warn;
