//! Architecture/OS/linker (AOL) platform descriptors.
//!
//! An [`AolDescriptor`] holds what the user declared, possibly with an empty
//! OS or linker meaning "auto-detect". Resolving it against the
//! [`FlagTable`] produces an [`Aol`]: a concrete triple with a dotted lookup
//! key (`amd64.Linux.gpp`) and a filename-safe classifier
//! (`amd64-Linux-gpp`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::flags::FlagTable;
use crate::util::errors::NarError;

/// Operating system name used for Windows targets.
pub const WINDOWS: &str = "Windows";

/// The machine running the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostPlatform {
    /// OS in AOL spelling (`Linux`, `Windows`, `MacOSX`, ...)
    pub os: String,
    /// Architecture in AOL spelling (`amd64`, `i386`, `aarch64`, ...)
    pub arch: String,
}

impl HostPlatform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        HostPlatform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Detect the current host.
    pub fn detect() -> Self {
        HostPlatform::new(
            aol_os_name(std::env::consts::OS),
            aol_arch_name(std::env::consts::ARCH),
        )
    }

    pub fn is_windows(&self) -> bool {
        self.os.eq_ignore_ascii_case(WINDOWS)
    }
}

/// Map a Rust OS name onto the AOL spelling.
pub fn aol_os_name(os: &str) -> String {
    match os {
        "linux" => "Linux".to_string(),
        "windows" => WINDOWS.to_string(),
        "macos" => "MacOSX".to_string(),
        "solaris" | "illumos" => "SunOS".to_string(),
        "freebsd" => "FreeBSD".to_string(),
        other => other.replace(' ', ""),
    }
}

/// Map a Rust architecture name onto the AOL spelling.
pub fn aol_arch_name(arch: &str) -> String {
    match arch {
        "x86_64" => "amd64".to_string(),
        "x86" => "i386".to_string(),
        "powerpc" => "ppc".to_string(),
        other => other.to_string(),
    }
}

/// Normalize a linker name for use inside a key (`g++` becomes `gpp`).
pub fn normalize_linker(linker: &str) -> String {
    linker.replace("++", "pp")
}

/// Linker used when neither the item nor the flag table names one.
fn default_linker(os: &str) -> &'static str {
    if os.eq_ignore_ascii_case(WINDOWS) {
        "msvc"
    } else if os == "SunOS" {
        "CC"
    } else {
        "gpp"
    }
}

/// The build procedure family a resolved platform uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFamily {
    /// configure/make/make install
    Unix,
    /// Windows SDK + nmake
    Windows,
}

impl TargetFamily {
    pub fn for_os(os: &str) -> Self {
        if os.eq_ignore_ascii_case(WINDOWS) {
            TargetFamily::Windows
        } else {
            TargetFamily::Unix
        }
    }
}

/// A resolved platform triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aol {
    arch: String,
    os: String,
    linker: String,
    family: TargetFamily,
}

impl Aol {
    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn linker(&self) -> &str {
        &self.linker
    }

    pub fn family(&self) -> TargetFamily {
        self.family
    }

    /// Flag table key, e.g. `amd64.Linux.gpp`.
    pub fn key(&self) -> String {
        format!("{}.{}.{}", self.arch, self.os, self.linker)
    }

    /// Filename-safe classifier, e.g. `amd64-Linux-gpp`.
    ///
    /// Every `.` of the key becomes `-`, including dots inside a
    /// version-qualified OS name.
    pub fn classifier(&self) -> String {
        self.key().replace('.', "-")
    }

    /// Look up `{key}.{suffix}` in the flag table.
    pub fn property<'a>(&self, flags: &'a FlagTable, suffix: &str) -> Option<&'a str> {
        flags.get(&format!("{}.{}", self.key(), suffix))
    }

    /// Like [`Aol::property`] but missing values are an error.
    pub fn require_property<'a>(
        &self,
        flags: &'a FlagTable,
        suffix: &str,
    ) -> Result<&'a str, NarError> {
        self.property(flags, suffix)
            .ok_or_else(|| NarError::MissingPlatformFlag {
                property: format!("{}.{}", self.key(), suffix),
            })
    }
}

impl fmt::Display for Aol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.arch, self.os, self.linker)
    }
}

/// A declared platform, resolved at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AolDescriptor {
    pub arch: String,
    /// Empty means the host OS
    pub os: String,
    /// Empty means the flag table's or OS's default linker
    pub linker: String,
    #[serde(skip)]
    resolved: Option<Aol>,
}

impl AolDescriptor {
    pub fn new(arch: impl Into<String>, os: impl Into<String>, linker: impl Into<String>) -> Self {
        AolDescriptor {
            arch: arch.into(),
            os: os.into(),
            linker: linker.into(),
            resolved: None,
        }
    }

    /// The OS this descriptor targets, with auto-detection applied.
    pub fn effective_os(&self, host: &HostPlatform) -> String {
        if self.os.is_empty() {
            host.os.clone()
        } else {
            self.os.clone()
        }
    }

    /// Resolve against the flag table. A second call returns the stored
    /// result without looking anything up again.
    pub fn resolve(&mut self, flags: &FlagTable, host: &HostPlatform) -> Result<&Aol, NarError> {
        if self.resolved.is_none() {
            let aol = self.lookup(flags, host)?;
            tracing::info!("check prerequisites for {}", aol.key());
            self.resolved = Some(aol);
        }
        self.resolved.as_ref().ok_or_else(|| self.unresolved())
    }

    fn unresolved(&self) -> NarError {
        NarError::UnresolvedPlatform {
            arch: self.arch.clone(),
            os: self.os.clone(),
            linker: self.linker.clone(),
        }
    }

    fn lookup(&self, flags: &FlagTable, host: &HostPlatform) -> Result<Aol, NarError> {
        if self.arch.trim().is_empty() {
            return Err(self.unresolved());
        }

        let arch = self.arch.trim().to_string();
        let os = self.effective_os(host);
        let linker = if self.linker.is_empty() {
            flags
                .get(&format!("{}.{}.linker", arch, os))
                .map(normalize_linker)
                .unwrap_or_else(|| default_linker(&os).to_string())
        } else {
            normalize_linker(&self.linker)
        };

        let aol = Aol {
            family: TargetFamily::for_os(&os),
            arch,
            os,
            linker,
        };

        if !flags.contains_aol(&aol.key()) {
            return Err(self.unresolved());
        }
        Ok(aol)
    }

    /// The resolved platform, if [`AolDescriptor::resolve`] succeeded.
    pub fn resolved(&self) -> Option<&Aol> {
        self.resolved.as_ref()
    }
}

impl fmt::Display for AolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved {
            Some(ref aol) => write!(f, "{}", aol.key()),
            None => write!(f, "{}/{}/{}", self.arch, self.os, self.linker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::properties::Properties;

    fn table() -> FlagTable {
        FlagTable::from_properties(Properties::parse(
            "amd64.Linux.linker=g++\n\
             amd64.Linux.gpp.HostOs=x86_64-pc-linux-gnu\n\
             amd64.Linux.gpp.ArchFlags=-m64\n\
             amd64.Windows.msvc.ArchFlags=\n\
             i386.MacOSX10.6.gpp.ArchFlags=-m32\n",
        ))
    }

    fn linux() -> HostPlatform {
        HostPlatform::new("Linux", "amd64")
    }

    #[test]
    fn test_auto_detects_os_and_linker() {
        let mut desc = AolDescriptor::new("amd64", "", "");
        let aol = desc.resolve(&table(), &linux()).unwrap();
        assert_eq!(aol.key(), "amd64.Linux.gpp");
        assert_eq!(aol.family(), TargetFamily::Unix);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let flags = table();
        let mut desc = AolDescriptor::new("amd64", "", "");
        let first = desc.resolve(&flags, &linux()).unwrap().clone();
        // An empty table would fail a fresh lookup; the stored value is reused.
        let second = desc.resolve(&FlagTable::default(), &linux()).unwrap();
        assert_eq!(&first, second);
    }

    #[test]
    fn test_missing_arch_fails() {
        let mut desc = AolDescriptor::new("", "Linux", "gpp");
        let err = desc.resolve(&table(), &linux()).unwrap_err();
        assert!(matches!(err, NarError::UnresolvedPlatform { .. }));
        assert!(desc.resolved().is_none());
    }

    #[test]
    fn test_unknown_triple_fails_naming_request() {
        let mut desc = AolDescriptor::new("sparc", "SunOS", "");
        match desc.resolve(&table(), &linux()).unwrap_err() {
            NarError::UnresolvedPlatform { arch, os, linker } => {
                assert_eq!(arch, "sparc");
                assert_eq!(os, "SunOS");
                assert_eq!(linker, "");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_windows_default_linker() {
        let mut desc = AolDescriptor::new("amd64", "Windows", "");
        let aol = desc.resolve(&table(), &linux()).unwrap();
        assert_eq!(aol.key(), "amd64.Windows.msvc");
        assert_eq!(aol.family(), TargetFamily::Windows);
    }

    #[test]
    fn test_classifier_replaces_dots_only() {
        let mut plain = AolDescriptor::new("amd64", "Linux", "g++");
        let aol = plain.resolve(&table(), &linux()).unwrap();
        assert_eq!(aol.classifier(), "amd64-Linux-gpp");

        let mut versioned = AolDescriptor::new("i386", "MacOSX10.6", "gpp");
        let aol = versioned.resolve(&table(), &linux()).unwrap();
        assert_eq!(aol.key(), "i386.MacOSX10.6.gpp");
        assert_eq!(aol.classifier(), "i386-MacOSX10-6-gpp");
        assert_eq!(aol.property(&table(), "ArchFlags"), Some("-m32"));
    }

    #[test]
    fn test_display() {
        let mut desc = AolDescriptor::new("amd64", "", "");
        assert_eq!(desc.to_string(), "amd64//");
        desc.resolve(&table(), &linux()).unwrap();
        assert_eq!(desc.to_string(), "amd64.Linux.gpp");
    }

    #[test]
    fn test_host_names() {
        assert_eq!(aol_os_name("macos"), "MacOSX");
        assert_eq!(aol_arch_name("x86_64"), "amd64");
        assert!(HostPlatform::new("windows", "x86").is_windows());
    }
}
