//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod batch;
pub mod config;
pub mod error;
pub mod execution;
pub mod installable;
pub mod platform;
pub mod resolver;

#[allow(unused_imports)]
pub use batch::{BatchKind, BatchPhase, BatchReport, BatchState, ItemResult, PendingItem};
#[allow(unused_imports)]
pub use config::{RigupConfig, validate_config_key, validate_config_value};
#[allow(unused_imports)]
pub use error::{BatchError, ConfigError, DependencyError, FetchError, InstallError};
#[allow(unused_imports)]
pub use execution::{ExecutionResult, FailureCause, Stream, TranscriptLine};
#[allow(unused_imports)]
pub use installable::{Action, Installable, ItemKind};
#[allow(unused_imports)]
pub use platform::Platform;
#[allow(unused_imports)]
pub use resolver::{resolve, validate_dependencies};
