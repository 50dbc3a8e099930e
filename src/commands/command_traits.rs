//! Command pattern interfaces
//!
//! Each CLI subcommand is parsed into a [`Command`] object by a
//! [`CommandFactory`], keeping argument handling apart from execution.

use crate::errors::TreeKitResult;

/// Represents an executable command in the application
pub trait Command {
    /// Execute the command
    ///
    /// # Returns
    /// Result indicating success or an error
    fn execute(&self) -> TreeKitResult<()>;
}

/// Factory for creating commands from CLI arguments
pub trait CommandFactory {
    /// Create a new Command instance based on CLI arguments
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    ///
    /// # Returns
    /// A command that implements the Command trait, or an error
    fn create_command(&self, args: &clap::ArgMatches) -> TreeKitResult<Box<dyn Command>>;
}
