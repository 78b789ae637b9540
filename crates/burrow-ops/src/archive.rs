//! ZIP archive codec: DEFLATE compression with optional AES-256 encryption.
//!
//! Both directions are all-or-nothing. `write` builds the archive in a
//! temporary file next to the target and only moves it into place once
//! every source has been added. `read` opens every entry with the given
//! password before writing anything, and removes whatever it created if a
//! later step fails or the token fires.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use zip::result::ZipError;
use zip::write::{FileOptions, SimpleFileOptions};
use zip::{AesMode, CompressionMethod, ZipArchive, ZipWriter};

use crate::delete::remove_path;
use crate::error::ArchiveError;

/// DEFLATE level used unless configured otherwise ("normal").
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 5;

/// Files at least this large get ZIP64 headers.
const LARGE_FILE_THRESHOLD: u64 = 0xFFFF_FFFF;

/// Progress of one archive step.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveProgress<'a> {
    /// Source added (write) or entry extracted (read).
    pub path: &'a Path,
    pub completed: usize,
    pub total: usize,
    /// Uncompressed bytes handled so far.
    pub bytes: u64,
}

/// Reads and writes ZIP containers.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveCodec {
    compression_level: i64,
}

impl Default for ArchiveCodec {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ArchiveCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a DEFLATE level between 0 and 9.
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = level.clamp(0, 9);
        self
    }

    /// Write `sources` into a new archive at `container`.
    ///
    /// Each source is stored under its base name; directories are added
    /// recursively with their relative structure. With a password, every
    /// file entry is AES-256 encrypted. `on_progress` is called once per
    /// top-level source. Returns the uncompressed bytes written.
    pub fn write(
        &self,
        container: &Path,
        sources: &[PathBuf],
        password: Option<&str>,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(ArchiveProgress<'_>),
    ) -> Result<u64, ArchiveError> {
        let parent = container
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let temp = tempfile::Builder::new()
            .prefix(".burrow-")
            .suffix(".zip.part")
            .tempfile_in(parent)
            .map_err(|e| write_error(container, e))?;
        let temp_path = temp.path().to_path_buf();

        let mut writer = ZipWriter::new(temp);
        let mut bytes = 0u64;

        for (index, source) in sources.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(ArchiveError::Cancelled);
            }

            let name = source
                .file_name()
                .map(PathBuf::from)
                .ok_or_else(|| write_error(container, format!("{} has no name", source.display())))?;
            bytes += self.add_path(&mut writer, source, &name, password, cancel, &temp_path)?;

            on_progress(ArchiveProgress {
                path: source,
                completed: index + 1,
                total: sources.len(),
                bytes,
            });
        }

        let temp: NamedTempFile = writer.finish().map_err(|e| write_error(container, e))?;
        temp.persist(container)
            .map_err(|e| write_error(container, e.error))?;
        Ok(bytes)
    }

    fn add_path(
        &self,
        writer: &mut ZipWriter<NamedTempFile>,
        path: &Path,
        name: &Path,
        password: Option<&str>,
        cancel: &CancellationToken,
        skip: &Path,
    ) -> Result<u64, ArchiveError> {
        let mut metadata = fs::symlink_metadata(path).map_err(|e| ArchiveError::io(path, e))?;
        if metadata.file_type().is_symlink() {
            metadata = fs::metadata(path).map_err(|e| ArchiveError::io(path, e))?;
            if metadata.is_dir() {
                debug!(path = %path.display(), "not following directory symlink");
                return Ok(0);
            }
        }

        let entry_name = entry_name(name);

        if metadata.is_dir() {
            writer
                .add_directory(format!("{entry_name}/"), SimpleFileOptions::default())
                .map_err(|e| write_error(path, e))?;

            let mut children = fs::read_dir(path)
                .map_err(|e| ArchiveError::io(path, e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ArchiveError::io(path, e))?;
            children.sort_by_key(|entry| entry.file_name());

            let mut bytes = 0u64;
            for child in children {
                if cancel.is_cancelled() {
                    return Err(ArchiveError::Cancelled);
                }
                let child_path = child.path();
                if child_path == skip {
                    continue;
                }
                bytes += self.add_path(
                    writer,
                    &child_path,
                    &name.join(child.file_name()),
                    password,
                    cancel,
                    skip,
                )?;
            }
            return Ok(bytes);
        }

        writer
            .start_file(entry_name, self.file_options(password, metadata.len()))
            .map_err(|e| write_error(path, e))?;
        let mut file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        let copied = io::copy(&mut file, writer).map_err(|e| ArchiveError::io(path, e))?;
        Ok(copied)
    }

    fn file_options<'k>(&self, password: Option<&'k str>, size: u64) -> FileOptions<'k, ()> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.compression_level))
            .large_file(size >= LARGE_FILE_THRESHOLD);

        match password {
            Some(password) => options.with_aes_encryption(AesMode::Aes256, password),
            None => options,
        }
    }

    /// Expand `container` into `destination`.
    ///
    /// Wrong or missing passwords, corrupt containers and entries whose
    /// names escape `destination` fail the whole call before any file is
    /// written. Existing files with the same name are overwritten.
    /// Returns the uncompressed bytes written.
    pub fn read(
        &self,
        container: &Path,
        destination: &Path,
        password: Option<&str>,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(ArchiveProgress<'_>),
    ) -> Result<u64, ArchiveError> {
        let file = File::open(container).map_err(|e| ArchiveError::io(container, e))?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| map_zip_error(container, e, password))?;
        let total = archive.len();

        // Verify every entry up front so nothing is written for a bad password.
        let mut plan = Vec::with_capacity(total);
        for index in 0..total {
            let entry = match password {
                Some(password) => archive.by_index_decrypt(index, password.as_bytes()),
                None => archive.by_index(index),
            }
            .map_err(|e| map_zip_error(container, e, password))?;

            let relative = entry
                .enclosed_name()
                .filter(|p| is_plain_relative(p))
                .ok_or_else(|| ArchiveError::UnsafeEntry {
                    name: entry.name().to_string(),
                })?;
            plan.push((relative, entry.is_dir()));
        }

        let mut created = Created::default();
        created.note(destination);
        fs::create_dir_all(destination).map_err(|e| ArchiveError::io(destination, e))?;

        let mut bytes = 0u64;
        for (index, (relative, is_dir)) in plan.iter().enumerate() {
            if cancel.is_cancelled() {
                created.undo();
                return Err(ArchiveError::Cancelled);
            }

            let target = destination.join(relative);
            created.note_under(destination, relative);

            let result = if *is_dir {
                fs::create_dir_all(&target)
                    .map(|()| 0)
                    .map_err(|e| ArchiveError::io(&target, e))
            } else {
                match password {
                    Some(password) => archive.by_index_decrypt(index, password.as_bytes()),
                    None => archive.by_index(index),
                }
                .map_err(|e| map_zip_error(container, e, password))
                .and_then(|mut entry| extract_file(&mut entry, &target))
            };

            match result {
                Ok(written) => bytes += written,
                Err(err) => {
                    created.undo();
                    return Err(err);
                }
            }

            on_progress(ArchiveProgress {
                path: &target,
                completed: index + 1,
                total,
                bytes,
            });
        }

        Ok(bytes)
    }

    /// Number of entries in `container`.
    pub fn entry_count(container: &Path) -> Result<usize, ArchiveError> {
        let file = File::open(container).map_err(|e| ArchiveError::io(container, e))?;
        let archive = ZipArchive::new(file).map_err(|e| map_zip_error(container, e, None))?;
        Ok(archive.len())
    }
}

fn extract_file(entry: &mut impl io::Read, target: &Path) -> Result<u64, ArchiveError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
    }
    let mut out = File::create(target).map_err(|e| ArchiveError::io(target, e))?;
    io::copy(entry, &mut out).map_err(|e| ArchiveError::io(target, e))
}

/// Paths created during one extraction, outermost first.
#[derive(Default)]
struct Created {
    paths: Vec<PathBuf>,
}

impl Created {
    /// Remember `path` if it does not exist yet.
    fn note(&mut self, path: &Path) {
        if fs::symlink_metadata(path).is_err() {
            self.paths.push(path.to_path_buf());
        }
    }

    /// Remember the outermost missing ancestor of `destination/relative`.
    fn note_under(&mut self, destination: &Path, relative: &Path) {
        let mut current = destination.to_path_buf();
        for component in relative.components() {
            current.push(component);
            if fs::symlink_metadata(&current).is_err() {
                self.paths.push(current);
                return;
            }
        }
    }

    fn undo(self) {
        for path in self.paths.iter().rev() {
            if fs::symlink_metadata(path).is_err() {
                continue;
            }
            if let Err(err) = remove_path(path) {
                debug!(path = %path.display(), error = %err, "rollback failed");
            }
        }
    }
}

fn is_plain_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Archive entry name for a relative path: `/`-separated on every platform.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn write_error(path: &Path, reason: impl ToString) -> ArchiveError {
    ArchiveError::Write {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn map_zip_error(path: &Path, error: ZipError, password: Option<&str>) -> ArchiveError {
    match error {
        ZipError::UnsupportedArchive(detail)
            if detail == ZipError::PASSWORD_REQUIRED && password.is_none() =>
        {
            ArchiveError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
        ZipError::InvalidPassword => ArchiveError::InvalidPassword {
            path: path.to_path_buf(),
        },
        ZipError::Io(source) => ArchiveError::io(path, source),
        other => ArchiveError::Corrupt {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}
