//! Utility modules for common functionality
//!
//! Logging and progress reporting used by the command-line front end.

pub mod logger;
pub mod progress;

pub use logger::Logger;
pub use progress::ProgressTracker;
