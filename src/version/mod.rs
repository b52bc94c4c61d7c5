//! Local version discovery and comparison.

mod compare;
mod local;

pub use compare::is_up_to_date;
pub use local::{LocalVersion, local_version, strip_ansi};
