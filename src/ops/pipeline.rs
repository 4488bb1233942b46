//! Shared state of a phpnar run.

use std::path::Path;

use anyhow::Result;

use crate::core::aol::{Aol, HostPlatform, TargetFamily};
use crate::core::feature::{configure_args, DEFAULT_UNIX_CONFIGURE_ARGS, DEFAULT_WINDOWS_CONFIGURE_ARGS};
use crate::core::flags::FlagTable;
use crate::core::layout::Layout;
use crate::core::matrix::{AolItem, BuildMatrix, CrossCompile};
use crate::core::version::ProductVersion;
use crate::util::config::{global_config_path, GlobalConfig, NarConfig, Overrides};

/// Configuration, flag table and build matrix, loaded once and handed to
/// every stage.
#[derive(Debug)]
pub struct Pipeline {
    config: NarConfig,
    layout: Layout,
    host: HostPlatform,
    flags: FlagTable,
    matrix: BuildMatrix,
    version: ProductVersion,
}

impl Pipeline {
    /// Load `Nar.toml`, merge the global config and apply `overrides`.
    pub fn load(manifest_path: &Path, overrides: &Overrides) -> Result<Self> {
        let global = global_config_path()
            .map(|p| GlobalConfig::load_or_default(&p))
            .unwrap_or_default();
        let config = NarConfig::load(manifest_path)?.with_defaults(global, overrides);
        Pipeline::new(config, HostPlatform::detect())
    }

    /// Build a pipeline from a merged configuration.
    pub fn new(config: NarConfig, host: HostPlatform) -> Result<Self> {
        let flags = FlagTable::load(config.build.aol_properties.as_deref())?;
        let cross = CrossCompile {
            any: config.cross_compile(),
            windows: config.cross_compile_windows(),
        };
        let matrix = BuildMatrix::new(config.declared_items(&host), &host, cross);
        tracing::debug!(
            "{} of {} platforms selected on {}/{}",
            matrix.effective_len(),
            matrix.original_len(),
            host.os,
            host.arch
        );

        Ok(Pipeline {
            layout: Layout::from_config(&config),
            version: ProductVersion::parse(&config.project.version),
            config,
            host,
            flags,
            matrix,
        })
    }

    pub fn config(&self) -> &NarConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn host(&self) -> &HostPlatform {
        &self.host
    }

    pub fn flags(&self) -> &FlagTable {
        &self.flags
    }

    pub fn matrix(&self) -> &BuildMatrix {
        &self.matrix
    }

    pub fn version(&self) -> &ProductVersion {
        &self.version
    }

    /// Resolve the platforms selected for this host.
    pub fn resolve_effective(&mut self) -> Result<()> {
        self.matrix.resolve_effective(&self.flags, &self.host)?;
        Ok(())
    }

    /// Resolve every declared platform.
    pub fn resolve_all(&mut self) -> Result<()> {
        self.matrix.resolve_all(&self.flags, &self.host)?;
        Ok(())
    }

    /// Selected items with their resolved platform. Call
    /// [`Pipeline::resolve_effective`] first.
    pub fn targets(&self) -> impl Iterator<Item = (&AolItem, &Aol)> {
        self.matrix.resolved_effective()
    }

    /// Configure arguments for one item.
    pub fn configure_args(&self, item: &AolItem, aol: &Aol) -> Result<String> {
        let default = match aol.family() {
            TargetFamily::Unix => DEFAULT_UNIX_CONFIGURE_ARGS,
            TargetFamily::Windows => DEFAULT_WINDOWS_CONFIGURE_ARGS,
        };
        let args = configure_args(
            item.configure_args.as_deref(),
            self.config.build.configure_args.as_deref(),
            default,
            &self.config.extension,
        )?;
        Ok(args)
    }
}
