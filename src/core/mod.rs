//! Core data structures for phpnar.
//!
//! - Platform descriptors and their resolution ([`aol`], [`flags`])
//! - The build matrix ([`matrix`])
//! - Configure arguments ([`feature`])
//! - Output layout and product versions ([`layout`], [`version`])

pub mod aol;
pub mod feature;
pub mod flags;
pub mod layout;
pub mod matrix;
pub mod version;

pub use aol::{Aol, AolDescriptor, HostPlatform, TargetFamily};
pub use feature::Extension;
pub use flags::FlagTable;
pub use layout::{ArtifactRole, Layout};
pub use matrix::{AolItem, BuildMatrix, CrossCompile};
pub use version::ProductVersion;
