//! Application layer - use cases behind the CLI commands.

mod check;
mod install;
mod update;

pub use check::{CheckOutcome, PackageChecker};
pub use install::InstallUseCase;
pub use update::{UpdateReport, UpdateUseCase};
