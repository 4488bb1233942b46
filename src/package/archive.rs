//! Archive assembly.
//!
//! An [`ArchiveSpec`] lists what goes into an archive; [`write_archive`]
//! materializes it through an [`ArchiveWriter`]. Output is written to a
//! temporary file next to the destination and only persisted once the
//! archive is complete, so a failed run never leaves a truncated package.

use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Timelike};
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::util::config::ArchiveFormat;
use crate::util::fs::{ensure_dir, modified, newest_mtime};

/// Placeholder substituted for the absolute install root in filtered files.
pub const INSTALL_ROOT_PLACEHOLDER: &str = "${NAR.INSTALL.ROOT}";

/// Timestamp used for entries without a source file (1980-01-01, the zip epoch).
const FALLBACK_MTIME_SECS: u64 = 315_532_800;

/// One source of archive content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A file or a whole directory tree. Skipped when the source is absent.
    Path { source: PathBuf, dest: String },
    /// A text file with every occurrence of `from` replaced by the install
    /// root placeholder. Skipped when absent.
    Filtered {
        source: PathBuf,
        dest: String,
        from: String,
    },
    /// `*.h` files directly inside `source`, placed below `dest`.
    Headers { source: PathBuf, dest: String },
    /// Literal content with no backing file.
    Generated {
        dest: String,
        contents: Vec<u8>,
        mtime: Option<SystemTime>,
    },
}

impl Entry {
    fn source(&self) -> Option<&Path> {
        match self {
            Entry::Path { source, .. }
            | Entry::Filtered { source, .. }
            | Entry::Headers { source, .. } => Some(source),
            Entry::Generated { .. } => None,
        }
    }
}

/// Ordered archive content.
#[derive(Debug, Clone, Default)]
pub struct ArchiveSpec {
    entries: Vec<Entry>,
}

impl ArchiveSpec {
    pub fn new() -> Self {
        ArchiveSpec::default()
    }

    pub fn path(mut self, source: impl Into<PathBuf>, dest: &str) -> Self {
        self.entries.push(Entry::Path {
            source: source.into(),
            dest: normalize_dest(dest),
        });
        self
    }

    pub fn filtered(mut self, source: impl Into<PathBuf>, dest: &str, from: &Path) -> Self {
        self.entries.push(Entry::Filtered {
            source: source.into(),
            dest: normalize_dest(dest),
            from: from.display().to_string(),
        });
        self
    }

    pub fn headers(mut self, source: impl Into<PathBuf>, dest: &str) -> Self {
        self.entries.push(Entry::Headers {
            source: source.into(),
            dest: normalize_dest(dest),
        });
        self
    }

    pub fn generated(mut self, dest: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.entries.push(Entry::Generated {
            dest: normalize_dest(dest),
            contents: contents.into(),
            mtime: None,
        });
        self
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Newest modification time over every existing source.
    pub fn newest_source(&self) -> Option<SystemTime> {
        self.entries
            .iter()
            .filter_map(Entry::source)
            .filter_map(newest_mtime)
            .max()
    }

    /// `true` when `output` exists and no source is newer than it.
    pub fn is_up_to_date(&self, output: &Path) -> bool {
        match (modified(output), self.newest_source()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(out), Some(src)) => out >= src,
        }
    }
}

/// Strip leading `/` and convert `\` separators.
fn normalize_dest(dest: &str) -> String {
    dest.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Sink for archive entries.
pub trait ArchiveWriter {
    /// What [`ArchiveWriter::finish`] hands back.
    type Output;

    /// Add a directory entry. `name` ends with `/`.
    fn add_directory(&mut self, name: &str, mtime: SystemTime, mode: u32) -> Result<()>;

    /// Add a file entry of `size` bytes read from `data`.
    fn add_file(
        &mut self,
        name: &str,
        data: &mut dyn Read,
        size: u64,
        mtime: SystemTime,
        mode: u32,
    ) -> Result<()>;

    /// Finalize the container and return the underlying writer.
    fn finish(self) -> Result<Self::Output>;
}

/// Zip container (`.nar`).
pub struct ZipArchiveWriter<W: Write + Seek> {
    inner: ZipWriter<W>,
}

impl<W: Write + Seek> ZipArchiveWriter<W> {
    pub fn new(writer: W) -> Self {
        ZipArchiveWriter {
            inner: ZipWriter::new(writer),
        }
    }

    fn options(mtime: SystemTime, mode: u32) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip_time(mtime))
            .unix_permissions(mode)
    }
}

impl<W: Write + Seek> ArchiveWriter for ZipArchiveWriter<W> {
    type Output = W;

    fn add_directory(&mut self, name: &str, mtime: SystemTime, mode: u32) -> Result<()> {
        self.inner
            .add_directory(name, Self::options(mtime, mode))
            .with_context(|| format!("failed to add directory {}", name))
    }

    fn add_file(
        &mut self,
        name: &str,
        data: &mut dyn Read,
        _size: u64,
        mtime: SystemTime,
        mode: u32,
    ) -> Result<()> {
        self.inner
            .start_file(name, Self::options(mtime, mode))
            .with_context(|| format!("failed to add {}", name))?;
        io::copy(data, &mut self.inner).with_context(|| format!("failed to write {}", name))?;
        Ok(())
    }

    fn finish(self) -> Result<W> {
        self.inner.finish().context("failed to finish zip archive")
    }
}

/// Gzip-compressed tarball.
pub struct TarGzArchiveWriter<W: Write> {
    inner: tar::Builder<GzEncoder<W>>,
}

impl<W: Write> TarGzArchiveWriter<W> {
    pub fn new(writer: W) -> Self {
        let mut inner = tar::Builder::new(GzEncoder::new(writer, Compression::default()));
        inner.follow_symlinks(false);
        TarGzArchiveWriter { inner }
    }

    fn header(kind: tar::EntryType, size: u64, mtime: SystemTime, mode: u32) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(kind);
        header.set_size(size);
        header.set_mode(mode);
        header.set_mtime(unix_secs(mtime));
        header.set_cksum();
        header
    }
}

impl<W: Write> ArchiveWriter for TarGzArchiveWriter<W> {
    type Output = W;

    fn add_directory(&mut self, name: &str, mtime: SystemTime, mode: u32) -> Result<()> {
        let mut header = Self::header(tar::EntryType::Directory, 0, mtime, mode);
        self.inner
            .append_data(&mut header, name, io::empty())
            .with_context(|| format!("failed to add directory {}", name))
    }

    fn add_file(
        &mut self,
        name: &str,
        data: &mut dyn Read,
        size: u64,
        mtime: SystemTime,
        mode: u32,
    ) -> Result<()> {
        let mut header = Self::header(tar::EntryType::Regular, size, mtime, mode);
        self.inner
            .append_data(&mut header, name, data)
            .with_context(|| format!("failed to add {}", name))
    }

    fn finish(self) -> Result<W> {
        let encoder = self
            .inner
            .into_inner()
            .context("failed to finish tar archive")?;
        encoder.finish().context("failed to finish gzip stream")
    }
}

/// Write `spec` to `output` in the given format.
///
/// The archive is assembled in a temporary file in the same directory and
/// renamed over `output` on success; on error the temporary file is removed.
pub fn write_archive(spec: &ArchiveSpec, output: &Path, format: ArchiveFormat) -> Result<()> {
    let dir = output
        .parent()
        .with_context(|| format!("{} has no parent directory", output.display()))?;
    ensure_dir(dir)?;

    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;

    let tmp = match format {
        ArchiveFormat::Nar => {
            let mut writer = ZipArchiveWriter::new(tmp);
            write_entries(spec, &mut writer)?;
            writer.finish()?
        }
        ArchiveFormat::TarGz => {
            let mut writer = TarGzArchiveWriter::new(tmp);
            write_entries(spec, &mut writer)?;
            writer.finish()?
        }
    };

    tmp.as_file()
        .sync_all()
        .with_context(|| format!("failed to flush {}", output.display()))?;
    tmp.persist(output)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write archive {}", output.display()))?;

    tracing::info!("created {}", output.display());
    Ok(())
}

/// Like [`write_archive`], but leaves an up-to-date archive alone.
///
/// Returns `true` when the archive was written.
pub fn write_archive_if_stale(
    spec: &ArchiveSpec,
    output: &Path,
    format: ArchiveFormat,
) -> Result<bool> {
    if spec.is_up_to_date(output) {
        tracing::info!("{} is up to date", output.display());
        return Ok(false);
    }
    write_archive(spec, output, format)?;
    Ok(true)
}

/// Feed every entry of `spec` into `writer`, in order.
pub fn write_entries<A: ArchiveWriter>(spec: &ArchiveSpec, writer: &mut A) -> Result<()> {
    for entry in spec.entries() {
        match entry {
            Entry::Path { source, dest } => {
                if source.exists() {
                    add_tree(writer, source, dest)?;
                }
            }
            Entry::Filtered { source, dest, from } => {
                if source.is_file() {
                    let meta = fs::metadata(source)
                        .with_context(|| format!("failed to stat {}", source.display()))?;
                    let text = fs::read_to_string(source)
                        .with_context(|| format!("failed to read {}", source.display()))?;
                    let filtered = text.replace(from.as_str(), INSTALL_ROOT_PLACEHOLDER);
                    writer.add_file(
                        dest,
                        &mut filtered.as_bytes(),
                        filtered.len() as u64,
                        meta.modified().unwrap_or_else(|_| fallback_mtime()),
                        file_mode(&meta),
                    )?;
                }
            }
            Entry::Headers { source, dest } => add_headers(writer, source, dest)?,
            Entry::Generated {
                dest,
                contents,
                mtime,
            } => {
                writer.add_file(
                    dest,
                    &mut contents.as_slice(),
                    contents.len() as u64,
                    mtime.unwrap_or_else(fallback_mtime),
                    0o644,
                )?;
            }
        }
    }
    Ok(())
}

/// Add a file, or a directory and everything below it, sorted by name.
fn add_tree<A: ArchiveWriter>(writer: &mut A, source: &Path, dest: &str) -> Result<()> {
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", source.display()))?;
        let meta = entry
            .metadata()
            .with_context(|| format!("failed to stat {}", entry.path().display()))?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("{} escapes {}", entry.path().display(), source.display()))?;
        let name = entry_name(dest, rel);
        let mtime = meta.modified().unwrap_or_else(|_| fallback_mtime());

        if meta.is_dir() {
            if !name.is_empty() {
                writer.add_directory(&format!("{}/", name), mtime, 0o755)?;
            }
        } else if meta.is_file() {
            let mut file = File::open(entry.path())
                .with_context(|| format!("failed to open {}", entry.path().display()))?;
            writer.add_file(&name, &mut file, meta.len(), mtime, file_mode(&meta))?;
        }
    }
    Ok(())
}

fn add_headers<A: ArchiveWriter>(writer: &mut A, source: &Path, dest: &str) -> Result<()> {
    if !source.is_dir() {
        return Ok(());
    }

    let mut headers = fs::read_dir(source)
        .with_context(|| format!("failed to read {}", source.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "h"))
        .collect::<Vec<_>>();
    headers.sort();

    for path in headers {
        let meta =
            fs::metadata(&path).with_context(|| format!("failed to stat {}", path.display()))?;
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        let Some(file_name) = file_name else {
            continue;
        };
        let mut file =
            File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
        writer.add_file(
            &format!("{}/{}", dest.trim_end_matches('/'), file_name),
            &mut file,
            meta.len(),
            meta.modified().unwrap_or_else(|_| fallback_mtime()),
            file_mode(&meta),
        )?;
    }
    Ok(())
}

/// `dest` plus `rel` with `/` separators.
fn entry_name(dest: &str, rel: &Path) -> String {
    let rel = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    let dest = dest.trim_end_matches('/');
    match (dest.is_empty(), rel.is_empty()) {
        (_, true) => dest.to_string(),
        (true, false) => rel,
        (false, false) => format!("{}/{}", dest, rel),
    }
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(_meta: &fs::Metadata) -> u32 {
    0o644
}

fn fallback_mtime() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(FALLBACK_MTIME_SECS)
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Zip timestamps are local time without zone; out of range values fall
/// back to the zip epoch.
fn zip_time(time: SystemTime) -> zip::DateTime {
    let local: chrono::DateTime<Local> = time.into();
    u16::try_from(local.year())
        .ok()
        .and_then(|year| {
            zip::DateTime::from_date_and_time(
                year,
                local.month() as u8,
                local.day() as u8,
                local.hour() as u8,
                local.minute() as u8,
                local.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}
