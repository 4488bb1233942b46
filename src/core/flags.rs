//! Per-platform compiler flag table.
//!
//! Keys follow the `{arch}.{os}.{linker}.{property}` scheme, plus
//! `{arch}.{os}.linker` entries naming the default linker of a platform. The
//! table is seeded from a bundled properties resource and may be overlaid
//! with a project file. It is loaded once per run by the pipeline entry
//! point and then only read.

use std::path::Path;

use anyhow::Result;

use crate::util::properties::Properties;

/// The bundled platform table.
const BUNDLED_AOL_PROPERTIES: &str = include_str!("../../resources/aol.properties");

/// Lookup table of platform build flags.
#[derive(Debug, Clone, Default)]
pub struct FlagTable {
    props: Properties,
}

impl FlagTable {
    /// Table containing only the bundled entries.
    pub fn bundled() -> Self {
        FlagTable::from_properties(Properties::parse(BUNDLED_AOL_PROPERTIES))
    }

    /// Bundled entries overlaid with `overlay` when given.
    pub fn load(overlay: Option<&Path>) -> Result<Self> {
        let mut table = FlagTable::bundled();
        if let Some(path) = overlay {
            tracing::debug!("loading platform flags from {}", path.display());
            table.props.merge(Properties::load(path)?);
        }
        tracing::debug!("platform flag table has {} entries", table.props.len());
        Ok(table)
    }

    pub fn from_properties(props: Properties) -> Self {
        FlagTable { props }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key)
    }

    /// Whether the table has any property for the platform `key`.
    pub fn contains_aol(&self, key: &str) -> bool {
        self.props.has_prefix(&format!("{}.", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_table_covers_common_platforms() {
        let table = FlagTable::bundled();
        for key in [
            "amd64.Linux.gpp",
            "i386.Linux.gpp",
            "aarch64.Linux.gpp",
            "amd64.MacOSX.gpp",
            "amd64.Windows.msvc",
            "x86.Windows.msvc",
        ] {
            assert!(table.contains_aol(key), "missing {key}");
        }
        assert_eq!(table.get("amd64.Linux.linker"), Some("g++"));
        assert_eq!(table.get("amd64.Linux.gpp.ArchFlags"), Some("-m64"));
    }

    #[test]
    fn test_overlay_wins() {
        let tmp = TempDir::new().unwrap();
        let overlay = tmp.path().join("aol.properties");
        std::fs::write(
            &overlay,
            "amd64.Linux.gpp.c.options=-O3\nsparc.SunOS.CC.HostOs=sparc-sun-solaris2.10\n",
        )
        .unwrap();

        let table = FlagTable::load(Some(&overlay)).unwrap();
        assert_eq!(table.get("amd64.Linux.gpp.c.options"), Some("-O3"));
        assert!(table.contains_aol("sparc.SunOS.CC"));
    }
}
