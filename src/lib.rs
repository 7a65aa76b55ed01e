pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod report;
pub mod runner;
pub mod state;

pub use config::Config;
pub use diagnostics::{Diagnosis, IssueMatch, IssueType, PacmanDiagnostics};
pub use engine::{ConflictEngine, RemovalOutcome, Status, FIX_ALL};
pub use error::{FixError, FixResult};
pub use runner::{CommandRunner, ShellRunner};
pub use state::ResolverContext;

pub const PACFIX_VERSION: &str = "0.2.0";

use lazy_static::lazy_static;
use std::path::PathBuf;

lazy_static! {
    pub static ref PACFIX_HOME: PathBuf = {
        if let Ok(home) = std::env::var("PACFIX_HOME") {
            PathBuf::from(home)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".pacfix")
        } else {
            PathBuf::from("/tmp/.pacfix")
        }
    };
    pub static ref PACFIX_CONFIG: PathBuf = {
        if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(config_home).join("pacfix")
        } else {
            PACFIX_HOME.join("config")
        }
    };
}
