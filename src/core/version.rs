//! Product version handling.
//!
//! PHP versions are mostly semver shaped (`5.3.10`, `7.4.33`), but release
//! candidates and snapshots sometimes are not (`5.4.0RC1`). Parsing is
//! lenient: anything with a numeric `major.minor` prefix is accepted.

use semver::Version;

/// A parsed product version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductVersion {
    raw: String,
    parsed: Option<Version>,
}

impl ProductVersion {
    pub fn parse(raw: &str) -> Self {
        ProductVersion {
            raw: raw.to_string(),
            parsed: parse_lenient(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> Option<u64> {
        self.parsed.as_ref().map(|v| v.major)
    }

    pub fn minor(&self) -> Option<u64> {
        self.parsed.as_ref().map(|v| v.minor)
    }

    /// Third version component (`10` for `5.3.10`).
    pub fn release(&self) -> Option<u64> {
        self.parsed.as_ref().map(|v| v.patch)
    }

    /// 5.3.x releases: upstream did not generate the Windows phpize files,
    /// so their developer packs are incomplete.
    pub fn is_legacy_devel_pack(&self) -> bool {
        self.major() == Some(5) && self.minor() == Some(3)
    }

    /// Shared library installed by `--enable-embed=shared`.
    pub fn embed_library(&self) -> &'static str {
        match self.major() {
            Some(5) | None => "libphp5.so",
            Some(7) => "libphp7.so",
            Some(_) => "libphp.so",
        }
    }

    /// Import library of a thread-safe Windows build.
    pub fn import_library(&self) -> String {
        format!("php{}ts.lib", self.major().unwrap_or(5))
    }
}

fn parse_lenient(raw: &str) -> Option<Version> {
    if let Ok(v) = Version::parse(raw) {
        return Some(v);
    }

    let mut parts = [0u64; 3];
    let mut count = 0;
    for (idx, part) in raw.split('.').take(3).enumerate() {
        let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            break;
        }
        parts[idx] = digits.parse().ok()?;
        count += 1;
        if digits.len() != part.len() {
            break;
        }
    }

    (count >= 2).then(|| Version::new(parts[0], parts[1], parts[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semver_versions() {
        let v = ProductVersion::parse("5.3.10");
        assert_eq!(v.release(), Some(10));
        assert!(v.is_legacy_devel_pack());

        let snapshot = ProductVersion::parse("5.3.8-SNAPSHOT");
        assert!(snapshot.is_legacy_devel_pack());
        assert_eq!(snapshot.release(), Some(8));
    }

    #[test]
    fn test_lenient_versions() {
        let rc = ProductVersion::parse("5.4.0RC1");
        assert_eq!(rc.major(), Some(5));
        assert_eq!(rc.minor(), Some(4));
        assert!(!rc.is_legacy_devel_pack());

        let short = ProductVersion::parse("5.3");
        assert!(short.is_legacy_devel_pack());
        assert_eq!(short.release(), Some(0));

        assert_eq!(ProductVersion::parse("trunk").major(), None);
    }

    #[test]
    fn test_legacy_range() {
        assert!(!ProductVersion::parse("5.2.17").is_legacy_devel_pack());
        assert!(!ProductVersion::parse("5.4.1").is_legacy_devel_pack());
        assert!(!ProductVersion::parse("53.1.0").is_legacy_devel_pack());
    }

    #[test]
    fn test_library_names() {
        assert_eq!(ProductVersion::parse("5.3.10").embed_library(), "libphp5.so");
        assert_eq!(ProductVersion::parse("7.4.33").embed_library(), "libphp7.so");
        assert_eq!(ProductVersion::parse("8.2.1").embed_library(), "libphp.so");
        assert_eq!(ProductVersion::parse("8.2.1").import_library(), "php8ts.lib");
        assert_eq!(ProductVersion::parse("5.3.1").import_library(), "php5ts.lib");
    }
}
