//! Developer pack synthesis for 5.3.x Windows builds.
//!
//! Early 5.3 releases do not produce a usable `php-devel-pack-*.zip`: the
//! phpize scripts for Windows were only added later. The pack is assembled
//! here from the build tree, and files missing from it are taken from
//! templates of a later 5.3 release.

use std::path::Path;

use crate::core::version::ProductVersion;
use crate::package::archive::ArchiveSpec;

const EXT_DEPS_JS: &str = include_str!("../../resources/php5.3.x/ext_deps.js");
const PHPIZE_JS: &str = include_str!("../../resources/php5.3.x/phpize.js");
const CONFIG_PHPIZE_JS: &str = include_str!("../../resources/php5.3.x/config.phpize.js");
const PHPIZE_BAT: &str = include_str!("../../resources/php5.3.x/phpize.bat");
const MAKEFILE_PHPIZE: &str = include_str!("../../resources/php5.3.x/Makefile.phpize");
const CONFIG_W32_PHPIZE_IN: &str = include_str!("../../resources/php5.3.x/config.w32.phpize.in");

/// Header directories copied into `include/`, relative to the build root.
pub const HEADER_DIRS: &[&str] = &[
    "TSRM",
    "Zend",
    "main",
    "main/streams",
    "win32",
    "ext/ereg/regex",
    "ext/iconv",
    "ext/mysqlnd",
    "ext/pcre/pcrelib",
    "ext/standard",
    "ext/xml",
];

/// Describe the synthesized developer pack.
///
/// `toolchain_tag` and `arch` appear in the top level directory name,
/// e.g. `php-5.3.1-devel-VC9-x64/`.
pub fn devel_pack_spec(
    build_root: &Path,
    version: &ProductVersion,
    toolchain_tag: &str,
    arch: &str,
) -> ArchiveSpec {
    let prefix = format!("php-{}-devel-{}-{}", version.as_str(), toolchain_tag, arch);
    let at = |rel: &str| format!("{}/{}", prefix, rel);
    let win32_build = build_root.join("win32").join("build");
    let devel = build_root.join("Release_TS").join("devel");

    let release = version.release().unwrap_or(0).to_string();
    let phpize_js = PHPIZE_JS.replace("${PHP_RELEASE_VERSION}", &release);

    let mut spec = ArchiveSpec::new()
        .path(win32_build.join("confutils.js"), &at("script/confutils.js"))
        .path(win32_build.join("configure.tail"), &at("script/configure.tail"));

    spec = file_or_template(
        spec,
        &win32_build.join("config.w32.phpize.in"),
        &at("script/config.w32.phpize.in"),
        CONFIG_W32_PHPIZE_IN,
    );
    spec = file_or_template(
        spec,
        &win32_build.join("Makefile.phpize"),
        &at("script/Makefile.phpize"),
        MAKEFILE_PHPIZE,
    );
    spec = file_or_template(
        spec,
        &win32_build.join("phpize.bat"),
        &at("phpize.bat"),
        PHPIZE_BAT,
    );
    spec = file_or_template(
        spec,
        &devel.join("config.phpize.js"),
        &at("script/config.phpize.js"),
        CONFIG_PHPIZE_JS,
    );
    spec = file_or_template(spec, &devel.join("phpize.js"), &at("script/phpize.js"), &phpize_js);
    spec = file_or_template(
        spec,
        &devel.join("ext_deps.js"),
        &at("script/ext_deps.js"),
        EXT_DEPS_JS,
    );

    let import_lib = version.import_library();
    spec = spec.path(build_root.join(&import_lib), &at(&format!("lib/{}", import_lib)));

    for dir in HEADER_DIRS {
        spec = spec.headers(build_root.join(dir), &at(&format!("include/{}", dir)));
    }
    spec
}

/// The real file when the build produced one, the template otherwise.
fn file_or_template(spec: ArchiveSpec, source: &Path, dest: &str, template: &str) -> ArchiveSpec {
    if source.is_file() {
        spec.path(source, dest)
    } else {
        tracing::debug!("{} missing, using bundled template", source.display());
        spec.generated(dest, template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::archive::Entry;
    use tempfile::TempDir;

    fn generated<'a>(spec: &'a ArchiveSpec, dest: &str) -> Option<&'a [u8]> {
        spec.entries().iter().find_map(|e| match e {
            Entry::Generated { dest: d, contents, .. } if d == dest => Some(contents.as_slice()),
            _ => None,
        })
    }

    #[test]
    fn test_templates_fill_missing_files() {
        let tmp = TempDir::new().unwrap();
        let version = ProductVersion::parse("5.3.1");
        let spec = devel_pack_spec(tmp.path(), &version, "VC9", "x64");

        let phpize = generated(&spec, "php-5.3.1-devel-VC9-x64/script/phpize.js").unwrap();
        let phpize = String::from_utf8_lossy(phpize);
        assert!(phpize.contains("var PHP_RELEASE_VERSION = 1;"));
        assert!(!phpize.contains("${PHP_RELEASE_VERSION}"));

        for dest in [
            "script/config.w32.phpize.in",
            "script/Makefile.phpize",
            "phpize.bat",
            "script/config.phpize.js",
            "script/ext_deps.js",
        ] {
            assert!(
                generated(&spec, &format!("php-5.3.1-devel-VC9-x64/{}", dest)).is_some(),
                "{dest} should fall back to the template"
            );
        }
    }

    #[test]
    fn test_present_file_wins() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().join("win32/build");
        std::fs::create_dir_all(&build).unwrap();
        std::fs::write(build.join("phpize.bat"), "@echo real").unwrap();

        let spec = devel_pack_spec(tmp.path(), &ProductVersion::parse("5.3.2"), "VC9", "x86");
        assert!(generated(&spec, "php-5.3.2-devel-VC9-x86/phpize.bat").is_none());
        assert!(spec.entries().contains(&Entry::Path {
            source: build.join("phpize.bat"),
            dest: "php-5.3.2-devel-VC9-x86/phpize.bat".into(),
        }));
    }

    #[test]
    fn test_headers_and_import_library() {
        let spec = devel_pack_spec(Path::new("/b"), &ProductVersion::parse("5.3.0"), "VC9", "x86");

        assert!(spec.entries().contains(&Entry::Path {
            source: Path::new("/b").join("php5ts.lib"),
            dest: "php-5.3.0-devel-VC9-x86/lib/php5ts.lib".into(),
        }));
        assert!(spec.entries().contains(&Entry::Headers {
            source: Path::new("/b").join("ext/iconv"),
            dest: "php-5.3.0-devel-VC9-x86/include/ext/iconv".into(),
        }));
        let headers = spec
            .entries()
            .iter()
            .filter(|e| matches!(e, Entry::Headers { .. }))
            .count();
        assert_eq!(headers, HEADER_DIRS.len());
    }
}
