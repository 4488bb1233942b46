//! High-level operations.
//!
//! One module per pipeline stage. Every stage takes the [`Pipeline`] built
//! once per run and processes the selected platforms in declaration order.

pub mod build;
pub mod compile;
pub mod matrix;
pub mod package;
pub mod pipeline;
pub mod prepare_deps;
pub mod publish;
pub mod stage_sources;
pub mod validate;

pub use build::build;
pub use compile::{compile, CompileOptions};
pub use matrix::{describe_matrix, format_matrix, MatrixRow};
pub use package::package;
pub use pipeline::Pipeline;
pub use prepare_deps::prepare_deps;
pub use publish::{nar_properties, publish_metadata};
pub use stage_sources::stage_sources;
pub use validate::validate;

pub use crate::package::PackagedArtifact;
