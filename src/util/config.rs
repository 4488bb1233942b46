//! Configuration for a phpnar project.
//!
//! Two files are read:
//! - Global: `~/.phpnar/config.toml` - user-wide `[build]` and `[windows]` defaults
//! - Project: `Nar.toml` - project identity, matrix and extensions
//!
//! Project values take precedence over global ones, and command line
//! overrides take precedence over both. The merged result is a plain
//! [`NarConfig`] that is passed explicitly to every stage.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::aol::HostPlatform;
use crate::core::feature::Extension;
use crate::core::matrix::AolItem;

/// Manifest file name searched for in the current directory and its parents.
pub const MANIFEST_NAME: &str = "Nar.toml";

/// Project manifest (`Nar.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NarConfig {
    /// Project identity and layout
    pub project: ProjectConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Windows SDK settings
    pub windows: WindowsConfig,

    /// Declared platforms. Empty means one default item from `[build]`.
    pub aol: Vec<AolItem>,

    /// Extensions switched on or off at configure time
    pub extension: Vec<Extension>,
}

/// Project identity and directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProjectConfig {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,

    /// PHP source tree copied into each platform directory
    pub source_dir: PathBuf,

    /// Output root; platform directories and artifacts live here
    pub output_dir: PathBuf,

    /// Directory receiving `META-INF/nar/...` metadata
    pub classes_dir: PathBuf,

    /// Directory that may hold a hand-written `nar.properties` to extend
    pub resources_dir: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            group_id: String::new(),
            artifact_id: String::new(),
            version: String::new(),
            source_dir: PathBuf::from("src/main/php"),
            output_dir: PathBuf::from("target"),
            classes_dir: PathBuf::from("target/classes"),
            resources_dir: PathBuf::from("src/main/resources"),
        }
    }
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Architecture of the default item; host architecture when unset
    pub arch: Option<String>,

    /// Operating system of the default item; empty means auto-detect
    pub os: Option<String>,

    /// Linker of the default item; empty means auto-detect
    pub linker: Option<String>,

    /// Configure arguments used when an item has no override
    pub configure_args: Option<String>,

    /// Build items whose OS differs from the host
    pub cross_compile: Option<bool>,

    /// Allow Windows cross builds (requires a Windows host)
    pub cross_compile_windows: Option<bool>,

    /// Archive format for generated packages
    pub archive_format: Option<ArchiveFormat>,

    /// Extra platform flag table merged over the bundled one
    pub aol_properties: Option<PathBuf>,
}

/// Windows SDK configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WindowsConfig {
    /// Extracted php-sdk directory
    pub php_sdk_home: Option<PathBuf>,

    /// Extracted dependency bundle, used by the default item
    pub php_deps_home: Option<PathBuf>,

    /// Compiler toolchain directory name (e.g. `vc9`)
    pub toolchain: Option<String>,

    /// Target passed to `setenv` (e.g. `win7`)
    pub sdk_target: Option<String>,
}

/// Archive container used for generated packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    /// Zip container with the `.nar` extension
    #[default]
    Nar,
    /// Gzip-compressed tarball
    TarGz,
}

impl ArchiveFormat {
    /// File extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Nar => "nar",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }
}

impl std::str::FromStr for ArchiveFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nar" | "zip" => Ok(ArchiveFormat::Nar),
            "tar-gz" | "tar.gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            _ => Err(format!(
                "invalid archive format '{}'; expected 'nar' or 'tar-gz'",
                s
            )),
        }
    }
}

/// Command line overrides applied on top of the files.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cross_compile: bool,
    pub cross_compile_windows: bool,
    pub configure_args: Option<String>,
    pub php_sdk_home: Option<PathBuf>,
}

/// User-wide defaults (`~/.phpnar/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GlobalConfig {
    pub build: BuildConfig,
    pub windows: WindowsConfig,
}

impl GlobalConfig {
    /// Load with fallback to defaults if the file is missing or unreadable.
    ///
    /// Relative paths resolve against the directory holding the file.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return GlobalConfig::default();
        }
        let mut config = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|s| toml::from_str::<GlobalConfig>(&s).map_err(anyhow::Error::from))
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                GlobalConfig::default()
            });
        if let Some(dir) = path.parent() {
            config.absolutize(dir);
        }
        config
    }

    fn absolutize(&mut self, root: &Path) {
        for p in [
            self.build.aol_properties.as_mut(),
            self.windows.php_sdk_home.as_mut(),
            self.windows.php_deps_home.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        }
    }
}

impl BuildConfig {
    /// Fill unset fields from `other`.
    fn fill_from(&mut self, other: BuildConfig) {
        self.arch = self.arch.take().or(other.arch);
        self.os = self.os.take().or(other.os);
        self.linker = self.linker.take().or(other.linker);
        self.configure_args = self.configure_args.take().or(other.configure_args);
        self.cross_compile = self.cross_compile.or(other.cross_compile);
        self.cross_compile_windows = self.cross_compile_windows.or(other.cross_compile_windows);
        self.archive_format = self.archive_format.or(other.archive_format);
        self.aol_properties = self.aol_properties.take().or(other.aol_properties);
    }
}

impl WindowsConfig {
    fn fill_from(&mut self, other: WindowsConfig) {
        self.php_sdk_home = self.php_sdk_home.take().or(other.php_sdk_home);
        self.php_deps_home = self.php_deps_home.take().or(other.php_deps_home);
        self.toolchain = self.toolchain.take().or(other.toolchain);
        self.sdk_target = self.sdk_target.take().or(other.sdk_target);
    }
}

impl NarConfig {
    /// Parse a manifest from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse Nar.toml")
    }

    /// Load a manifest and make its relative paths absolute.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(manifest_path)
            .with_context(|| format!("failed to read manifest: {}", manifest_path.display()))?;
        let mut config: NarConfig = toml::from_str(&contents)
            .with_context(|| format!("failed to parse manifest: {}", manifest_path.display()))?;

        let root = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        config.absolutize(root);
        config.validate()?;
        Ok(config)
    }

    /// Resolve every relative path in the manifest against `root`.
    pub fn absolutize(&mut self, root: &Path) {
        let abs = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        };
        abs(&mut self.project.source_dir);
        abs(&mut self.project.output_dir);
        abs(&mut self.project.classes_dir);
        abs(&mut self.project.resources_dir);
        if let Some(p) = self.build.aol_properties.as_mut() {
            abs(p);
        }
        if let Some(p) = self.windows.php_sdk_home.as_mut() {
            abs(p);
        }
        if let Some(p) = self.windows.php_deps_home.as_mut() {
            abs(p);
        }
        for item in &mut self.aol {
            if let Some(p) = item.deps_folder.as_mut() {
                abs(p);
            }
        }
    }

    /// Check the project identity is complete.
    pub fn validate(&self) -> Result<()> {
        if self.project.group_id.is_empty() {
            bail!("[project] group-id must be set");
        }
        if self.project.artifact_id.is_empty() {
            bail!("[project] artifact-id must be set");
        }
        if self.project.version.is_empty() {
            bail!("[project] version must be set");
        }
        Ok(())
    }

    /// Merge global defaults underneath this manifest and apply overrides.
    pub fn with_defaults(mut self, global: GlobalConfig, overrides: &Overrides) -> Self {
        self.build.fill_from(global.build);
        self.windows.fill_from(global.windows);

        if overrides.cross_compile {
            self.build.cross_compile = Some(true);
        }
        if overrides.cross_compile_windows {
            self.build.cross_compile_windows = Some(true);
        }
        if let Some(ref args) = overrides.configure_args {
            self.build.configure_args = Some(args.clone());
        }
        if let Some(ref sdk) = overrides.php_sdk_home {
            self.windows.php_sdk_home = Some(sdk.clone());
        }
        self
    }

    pub fn cross_compile(&self) -> bool {
        self.build.cross_compile.unwrap_or(false)
    }

    pub fn cross_compile_windows(&self) -> bool {
        self.build.cross_compile_windows.unwrap_or(false)
    }

    pub fn archive_format(&self) -> ArchiveFormat {
        self.build.archive_format.unwrap_or_default()
    }

    /// Windows toolchain directory name, `vc9` by default.
    pub fn windows_toolchain(&self) -> &str {
        self.windows.toolchain.as_deref().unwrap_or("vc9")
    }

    /// Windows SDK target, `win7` by default.
    pub fn sdk_target(&self) -> &str {
        self.windows.sdk_target.as_deref().unwrap_or("win7")
    }

    /// Declared items, or the single default item built from `[build]`.
    pub fn declared_items(&self, host: &HostPlatform) -> Vec<AolItem> {
        if !self.aol.is_empty() {
            return self.aol.clone();
        }
        vec![AolItem::new(
            self.build.arch.clone().unwrap_or_else(|| host.arch.clone()),
            self.build.os.clone().unwrap_or_default(),
            self.build.linker.clone().unwrap_or_default(),
            self.windows.php_deps_home.clone(),
            self.build.configure_args.clone(),
        )]
    }
}

/// Get the global phpnar config directory (`~/.phpnar`).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".phpnar"))
}

/// Get the global config path (`~/.phpnar/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Find `Nar.toml` in `start` or one of its parents.
pub fn find_manifest(start: &Path) -> Result<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        current = dir.parent();
    }
    bail!(
        "could not find `{}` in `{}` or any parent directory",
        MANIFEST_NAME,
        start.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[project]
group-id = "org.phpmaven"
artifact-id = "php"
version = "5.3.10"

[build]
configure-args = "--enable-cli"
archive-format = "tar-gz"

[windows]
php-sdk-home = "sdk"

[[aol]]
arch = "amd64"
os = "Windows"
linker = "msvc"
deps-folder = "deps/x64"

[[aol]]
arch = "amd64"
os = "Linux"

[[extension]]
name = "gd"
enable = true
shared = true
"#;

    #[test]
    fn test_load_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&path, MANIFEST).unwrap();

        let config = NarConfig::load(&path).unwrap();
        assert_eq!(config.project.artifact_id, "php");
        assert_eq!(config.project.output_dir, tmp.path().join("target"));
        assert_eq!(config.archive_format(), ArchiveFormat::TarGz);
        assert_eq!(config.aol.len(), 2);
        assert_eq!(
            config.aol[0].deps_folder.as_deref(),
            Some(tmp.path().join("deps/x64").as_path())
        );
        assert_eq!(config.aol[1].descriptor.linker, "");
        assert_eq!(config.extension[0].name, "gd");
        assert_eq!(config.windows_toolchain(), "vc9");
    }

    #[test]
    fn test_missing_identity_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&path, "[project]\nartifact-id = \"php\"\n").unwrap();

        let err = NarConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("group-id"));
    }

    #[test]
    fn test_defaults_and_overrides() {
        let config = NarConfig::parse(MANIFEST).unwrap();
        let global = GlobalConfig {
            build: BuildConfig {
                configure_args: Some("--from-global".into()),
                cross_compile: Some(false),
                ..Default::default()
            },
            windows: WindowsConfig {
                toolchain: Some("vc11".into()),
                ..Default::default()
            },
        };
        let overrides = Overrides {
            cross_compile: true,
            ..Default::default()
        };

        let merged = config.with_defaults(global, &overrides);
        // Project wins over global
        assert_eq!(merged.build.configure_args.as_deref(), Some("--enable-cli"));
        // Global fills gaps
        assert_eq!(merged.windows_toolchain(), "vc11");
        // Command line wins over both
        assert!(merged.cross_compile());
        assert!(!merged.cross_compile_windows());
    }

    #[test]
    fn test_default_item_uses_build_section() {
        let mut config = NarConfig::parse(MANIFEST).unwrap();
        config.aol.clear();
        let host = HostPlatform::new("Linux", "amd64");

        let items = config.declared_items(&host);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].descriptor.arch, "amd64");
        assert_eq!(items[0].descriptor.os, "");
        assert_eq!(items[0].configure_args.as_deref(), Some("--enable-cli"));
    }

    #[test]
    fn test_global_paths_resolve_against_config_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[build]\naol-properties = \"aol.properties\"\n\n\
             [windows]\nphp-sdk-home = \"sdk\"\n",
        )
        .unwrap();

        let global = GlobalConfig::load_or_default(&path);
        assert_eq!(
            global.build.aol_properties,
            Some(tmp.path().join("aol.properties"))
        );
        assert_eq!(global.windows.php_sdk_home, Some(tmp.path().join("sdk")));

        let merged = NarConfig::parse(MANIFEST)
            .unwrap()
            .with_defaults(global, &Overrides::default());
        assert_eq!(
            merged.build.aol_properties,
            Some(tmp.path().join("aol.properties"))
        );
    }

    #[test]
    fn test_find_manifest_walks_up() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), MANIFEST).unwrap();
        let nested = tmp.path().join("src/main/php");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_manifest(&nested).unwrap(),
            tmp.path().join(MANIFEST_NAME)
        );
    }

    #[test]
    fn test_archive_format_from_str() {
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Nar);
        assert_eq!("tgz".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::TarGz);
        assert!("rar".parse::<ArchiveFormat>().is_err());
        assert_eq!(ArchiveFormat::TarGz.extension(), "tar.gz");
    }
}
