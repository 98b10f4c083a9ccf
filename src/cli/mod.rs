pub mod commands;
pub mod handlers;
pub mod output;
pub mod repl;

pub use commands::{CliArgs, Commands};
pub use output::{OutputFormat, OutputFormatter};
pub use repl::{ChatMode, Session, SessionSummary};
