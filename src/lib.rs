pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod organize;
pub mod progress;
pub mod undo;
pub mod verify;

pub use config::AppConfig;
pub use engine::{OrganizeEngine, RunResult};
pub use error::Error;
pub use progress::{CliReporter, ProgressReporter, SilentReporter};
