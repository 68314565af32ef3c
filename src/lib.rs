pub mod charset;
pub mod cli;
pub mod config;
pub mod engines;
pub mod error;
pub mod opener;
pub mod percent;
pub mod platform;
pub mod resolver;

pub use crate::config::{Config, Environment};
pub use crate::engines::EngineTable;
pub use crate::error::{Result, WebSearchError};
pub use crate::opener::{DryRunLauncher, HostInfo, Launcher, OpenTarget, Opener, SystemLauncher};
pub use crate::percent::{encode, EncodingOptions};
pub use crate::resolver::{Outcome, Resolver};
pub use cli::{Action, Cli};
