//! phpnar - builds the PHP runtime across an architecture/OS/linker matrix
//!
//! The crate resolves the declared platforms against a flag table,
//! generates the configure/make (Unix) or SDK/nmake (Windows) build script
//! for each one, runs it and packages the result as NAR archives together
//! with the `nar.properties` metadata downstream consumers read.

pub mod builder;
pub mod core;
pub mod ops;
pub mod package;
pub mod util;

pub use crate::core::aol::{Aol, AolDescriptor, HostPlatform, TargetFamily};
pub use crate::core::matrix::{AolItem, BuildMatrix};
pub use crate::ops::Pipeline;
pub use crate::util::errors::NarError;
