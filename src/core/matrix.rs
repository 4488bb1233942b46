//! The build matrix.
//!
//! The matrix keeps every declared item in declaration order. Filtering for
//! the current host only selects a subset; the full list stays available
//! because metadata must describe every declared platform, including the
//! ones skipped in this run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::aol::{Aol, AolDescriptor, HostPlatform};
use crate::core::flags::FlagTable;
use crate::util::errors::NarError;

/// One platform to build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AolItem {
    #[serde(flatten)]
    pub descriptor: AolDescriptor,

    /// Extracted Windows dependency bundle for this platform
    pub deps_folder: Option<PathBuf>,

    /// Configure arguments for this platform only
    pub configure_args: Option<String>,
}

impl AolItem {
    pub fn new(
        arch: impl Into<String>,
        os: impl Into<String>,
        linker: impl Into<String>,
        deps_folder: Option<PathBuf>,
        configure_args: Option<String>,
    ) -> Self {
        AolItem {
            descriptor: AolDescriptor::new(arch, os, linker),
            deps_folder,
            configure_args,
        }
    }

    pub fn resolve(&mut self, flags: &FlagTable, host: &HostPlatform) -> Result<&Aol, NarError> {
        self.descriptor.resolve(flags, host)
    }
}

/// Cross-compilation policy applied when filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossCompile {
    /// Build items for other operating systems
    pub any: bool,
    /// Build Windows items (only possible on a Windows host)
    pub windows: bool,
}

/// Declared items plus the subset selected for this host.
#[derive(Debug, Clone, Default)]
pub struct BuildMatrix {
    items: Vec<AolItem>,
    selected: Vec<usize>,
}

impl BuildMatrix {
    /// Build a matrix and select the items this host can build.
    pub fn new(items: Vec<AolItem>, host: &HostPlatform, cross: CrossCompile) -> Self {
        let selected = items
            .iter()
            .enumerate()
            .filter(|(_, item)| keep(item, host, cross))
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();

        for (idx, item) in items.iter().enumerate() {
            if !selected.contains(&idx) {
                tracing::debug!("skipping {} on this host", item.descriptor);
            }
        }

        BuildMatrix { items, selected }
    }

    /// Every declared item, in declaration order.
    pub fn original(&self) -> impl Iterator<Item = &AolItem> {
        self.items.iter()
    }

    /// The items to build in this run, in declaration order.
    pub fn effective(&self) -> impl Iterator<Item = &AolItem> {
        self.selected.iter().map(|&idx| &self.items[idx])
    }

    /// Every declared item with whether this run builds it.
    pub fn entries(&self) -> impl Iterator<Item = (&AolItem, bool)> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item, self.selected.contains(&idx)))
    }

    pub fn effective_len(&self) -> usize {
        self.selected.len()
    }

    pub fn original_len(&self) -> usize {
        self.items.len()
    }

    /// Resolve the selected items, failing on the first unresolvable one.
    pub fn resolve_effective(&mut self, flags: &FlagTable, host: &HostPlatform) -> Result<(), NarError> {
        for &idx in &self.selected {
            self.items[idx].resolve(flags, host)?;
        }
        Ok(())
    }

    /// Resolve every declared item.
    pub fn resolve_all(&mut self, flags: &FlagTable, host: &HostPlatform) -> Result<(), NarError> {
        for item in &mut self.items {
            item.resolve(flags, host)?;
        }
        Ok(())
    }

    /// Selected items with their resolved platform.
    ///
    /// Must be called after [`BuildMatrix::resolve_effective`]; unresolved
    /// items are skipped.
    pub fn resolved_effective(&self) -> impl Iterator<Item = (&AolItem, &Aol)> {
        self.effective()
            .filter_map(|item| item.descriptor.resolved().map(|aol| (item, aol)))
    }

    /// Every declared item with its resolved platform.
    pub fn resolved_original(&self) -> impl Iterator<Item = (&AolItem, &Aol)> {
        self.original()
            .filter_map(|item| item.descriptor.resolved().map(|aol| (item, aol)))
    }
}

fn keep(item: &AolItem, host: &HostPlatform, cross: CrossCompile) -> bool {
    if cross.any && cross.windows {
        return true;
    }
    if cross.windows && !host.is_windows() {
        return false;
    }
    if !cross.any && item.descriptor.effective_os(host) != host.os {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<AolItem> {
        vec![
            AolItem::new("amd64", "Windows", "msvc", None, None),
            AolItem::new("amd64", "Linux", "", None, None),
        ]
    }

    fn oses<'a>(it: impl Iterator<Item = &'a AolItem>) -> Vec<String> {
        it.map(|i| i.descriptor.os.clone()).collect()
    }

    #[test]
    fn test_native_build_drops_foreign_os() {
        let host = HostPlatform::new("Linux", "amd64");
        let matrix = BuildMatrix::new(items(), &host, CrossCompile::default());
        assert_eq!(oses(matrix.effective()), vec!["Linux"]);
        assert_eq!(oses(matrix.original()), vec!["Windows", "Linux"]);
    }

    #[test]
    fn test_cross_compile_keeps_everything() {
        let host = HostPlatform::new("Linux", "amd64");
        let cross = CrossCompile {
            any: true,
            windows: false,
        };
        let matrix = BuildMatrix::new(items(), &host, cross);
        assert_eq!(oses(matrix.effective()), vec!["Windows", "Linux"]);
        assert_eq!(matrix.original_len(), 2);
    }

    #[test]
    fn test_windows_cross_needs_windows_host() {
        let cross = CrossCompile {
            any: false,
            windows: true,
        };
        let linux = BuildMatrix::new(items(), &HostPlatform::new("Linux", "amd64"), cross);
        assert_eq!(linux.effective_len(), 0);
        assert_eq!(linux.original_len(), 2);

        let windows = BuildMatrix::new(items(), &HostPlatform::new("Windows", "amd64"), cross);
        assert_eq!(oses(windows.effective()), vec!["Windows"]);
    }

    #[test]
    fn test_both_flags_keep_everything() {
        let cross = CrossCompile {
            any: true,
            windows: true,
        };
        let matrix = BuildMatrix::new(items(), &HostPlatform::new("Linux", "amd64"), cross);
        assert_eq!(matrix.effective_len(), 2);
    }

    #[test]
    fn test_auto_detected_os_matches_host() {
        let host = HostPlatform::new("Linux", "amd64");
        let matrix = BuildMatrix::new(
            vec![AolItem::new("amd64", "", "", None, None)],
            &host,
            CrossCompile::default(),
        );
        assert_eq!(matrix.effective_len(), 1);
    }

    #[test]
    fn test_resolve_effective_leaves_skipped_items_alone() {
        let host = HostPlatform::new("Linux", "amd64");
        let mut matrix = BuildMatrix::new(items(), &host, CrossCompile::default());
        matrix
            .resolve_effective(&FlagTable::bundled(), &host)
            .unwrap();

        let resolved: Vec<_> = matrix
            .resolved_original()
            .map(|(_, aol)| aol.key())
            .collect();
        assert_eq!(resolved, vec!["amd64.Linux.gpp"]);
    }

    #[test]
    fn test_deserialize_item() {
        let item: AolItem = toml::from_str(
            "arch = \"x86\"\nos = \"Windows\"\nlinker = \"msvc\"\nconfigure-args = \"--enable-cli\"\n",
        )
        .unwrap();
        assert_eq!(item.descriptor.arch, "x86");
        assert_eq!(item.configure_args.as_deref(), Some("--enable-cli"));
        assert!(item.deps_folder.is_none());
    }
}
