//! Asset selection module
//!
//! Chooses which file of a hosted release to download for this host.

mod picker;

pub use picker::{AssetPicker, LinuxAmd64Picker, find_deb_signature};
