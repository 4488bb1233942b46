//! Implementation of `phpnar matrix`.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::core::aol::TargetFamily;
use crate::ops::Pipeline;

/// One declared platform as reported by `phpnar matrix`.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixRow {
    pub key: String,
    pub classifier: String,
    pub family: TargetFamily,
    /// Built on this host with the current cross-compile settings
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deps_folder: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configure_args: Option<String>,
}

/// Resolve the declared matrix and describe it.
pub fn describe_matrix(pipeline: &mut Pipeline) -> Result<Vec<MatrixRow>> {
    pipeline.resolve_all()?;

    let rows = pipeline
        .matrix()
        .entries()
        .filter_map(|(item, selected)| {
            item.descriptor.resolved().map(|aol| MatrixRow {
                key: aol.key(),
                classifier: aol.classifier(),
                family: aol.family(),
                selected,
                deps_folder: item.deps_folder.clone(),
                configure_args: item.configure_args.clone(),
            })
        })
        .collect();
    Ok(rows)
}

/// Plain text rendering, one platform per line.
pub fn format_matrix(rows: &[MatrixRow]) -> String {
    let width = rows.iter().map(|r| r.classifier.len()).max().unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        let family = match row.family {
            TargetFamily::Unix => "unix",
            TargetFamily::Windows => "windows",
        };
        let state = if row.selected { "build" } else { "skip" };
        let _ = writeln!(out, "{:<width$}  {:<7}  {}", row.classifier, family, state);
    }
    out
}
