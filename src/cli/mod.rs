// CLI module for sonotag
//
// Command-line front end over the library. Only compiled into the binary.

pub mod commands;
pub mod config;
pub mod output;

pub use commands::run;
pub use config::{Commands, Config, OutputFormat};
pub use output::OutputFormatter;
