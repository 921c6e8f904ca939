//! Recursive traversal of directories and nested jar archives.

use anyhow::{Context, Result};
use ignore::{DirEntry, WalkBuilder};
use memmap2::Mmap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::staging_path;
use crate::metadata::MetadataRemapper;
use crate::rewrite::rewrite_class;

pub const CLASS_EXTENSION: &str = "class";
pub const ARCHIVE_EXTENSION: &str = "jar";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Class,
    Archive,
    Other,
}

impl EntryKind {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(CLASS_EXTENSION) => EntryKind::Class,
            Some(ARCHIVE_EXTENSION) => EntryKind::Archive,
            _ => EntryKind::Other,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkReport {
    pub classes_seen: usize,
    pub classes_rewritten: usize,
    pub archives_seen: usize,
    pub archives_rewritten: usize,
}

impl WalkReport {
    /// Whether anything anywhere in the tree was rewritten.
    pub fn changed(&self) -> bool {
        self.classes_rewritten > 0
    }
}

/// Every entry under `root` (including `root`), sorted by file name, without
/// following symlinks or honoring ignore files.
pub fn walk_entries(root: &Path) -> Result<Vec<DirEntry>> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| anyhow::anyhow!("Failed to walk {}: {e}", root.display()))?;
        entries.push(entry);
    }
    Ok(entries)
}

pub struct ContainerWalker<'a> {
    remapper: &'a MetadataRemapper<'a>,
}

impl<'a> ContainerWalker<'a> {
    pub fn new(remapper: &'a MetadataRemapper<'a>) -> Self {
        Self { remapper }
    }

    /// Remaps `root` in place. Files are collected before anything is
    /// written so staging files never show up in the walk.
    pub fn visit(&self, root: &Path) -> Result<WalkReport> {
        let files: Vec<PathBuf> = walk_entries(root)?
            .into_iter()
            .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
            .map(DirEntry::into_path)
            .collect();

        let mut report = WalkReport::default();
        for path in files {
            self.visit_file(&path, &mut report)?;
        }
        Ok(report)
    }

    fn visit_file(&self, path: &Path, report: &mut WalkReport) -> Result<()> {
        match EntryKind::of(path) {
            EntryKind::Class => {
                report.classes_seen += 1;
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read class: {}", path.display()))?;
                let rewritten = rewrite_class(&bytes, self.remapper)
                    .with_context(|| format!("Failed to remap class: {}", path.display()))?;
                if let Some(rewritten) = rewritten {
                    std::fs::write(path, rewritten)
                        .with_context(|| format!("Failed to write class: {}", path.display()))?;
                    report.classes_rewritten += 1;
                    debug!(path = %path.display(), "remapped class metadata");
                }
            }
            EntryKind::Archive => self.visit_archive_file(path, report)?,
            EntryKind::Other => trace!(path = %path.display(), "skipping"),
        }
        Ok(())
    }

    fn visit_archive_file(&self, path: &Path, report: &mut WalkReport) -> Result<()> {
        report.archives_seen += 1;
        let staging = staging_path(path);

        let changed = match self.rebuild_archive_file(path, &staging, report) {
            Ok(changed) => changed,
            Err(e) => {
                let _ = std::fs::remove_file(&staging);
                return Err(e);
            }
        };

        if changed {
            std::fs::rename(&staging, path).with_context(|| {
                format!(
                    "Failed to replace archive: {} -> {}",
                    staging.display(),
                    path.display()
                )
            })?;
            report.archives_rewritten += 1;
            debug!(path = %path.display(), "rewrote archive");
        } else {
            std::fs::remove_file(&staging).with_context(|| {
                format!("Failed to remove staging file: {}", staging.display())
            })?;
            trace!(path = %path.display(), "archive unchanged");
        }
        Ok(())
    }

    fn rebuild_archive_file(
        &self,
        path: &Path,
        staging: &Path,
        report: &mut WalkReport,
    ) -> Result<bool> {
        let file =
            File::open(path).with_context(|| format!("Failed to open jar: {}", path.display()))?;
        // SAFETY: The file is opened read-only and the mapping is dropped at the
        // end of this function, before the archive is replaced.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to mmap jar: {}", path.display()))?;
        let mut archive = ZipArchive::new(Cursor::new(&mmap[..]))
            .with_context(|| format!("Failed to read zip structure: {}", path.display()))?;

        let out = File::create(staging)
            .with_context(|| format!("Failed to create staging file: {}", staging.display()))?;
        let mut writer = ZipWriter::new(out);
        let label = path.display().to_string();
        let changed = self.remap_archive(&mut archive, &mut writer, &label, report)?;
        writer
            .finish()
            .with_context(|| format!("Failed to finish archive: {}", staging.display()))?;
        Ok(changed)
    }

    /// Copies every entry of `archive` into `writer`, rewriting classes and
    /// recursing into nested jars. Untouched entries are copied raw.
    pub fn remap_archive<R, W>(
        &self,
        archive: &mut ZipArchive<R>,
        writer: &mut ZipWriter<W>,
        label: &str,
        report: &mut WalkReport,
    ) -> Result<bool>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        let mut changed = false;

        for i in 0..archive.len() {
            let (name, kind, options) = {
                let entry = archive.by_index_raw(i)?;
                let name = entry.name().trim_start_matches('/').to_string();
                let kind = if entry.is_dir() {
                    EntryKind::Other
                } else {
                    EntryKind::of(Path::new(&name))
                };
                (name, kind, entry_options(&entry))
            };
            let location = format!("{label}!/{name}");

            let replacement = match kind {
                EntryKind::Class => {
                    report.classes_seen += 1;
                    let bytes = read_entry(archive, i, &location)?;
                    let rewritten = rewrite_class(&bytes, self.remapper)
                        .with_context(|| format!("Failed to remap class: {location}"))?;
                    if rewritten.is_some() {
                        report.classes_rewritten += 1;
                        debug!(entry = %location, "remapped class metadata");
                    }
                    rewritten
                }
                EntryKind::Archive => {
                    report.archives_seen += 1;
                    let bytes = read_entry(archive, i, &location)?;
                    let mut inner = ZipArchive::new(Cursor::new(bytes.as_slice()))
                        .with_context(|| format!("Failed to read zip structure: {location}"))?;
                    let mut inner_writer = ZipWriter::new(Cursor::new(Vec::new()));
                    let inner_changed =
                        self.remap_archive(&mut inner, &mut inner_writer, &location, report)?;
                    let rebuilt = inner_writer.finish()?.into_inner();
                    if inner_changed {
                        report.archives_rewritten += 1;
                        debug!(entry = %location, "rewrote nested archive");
                        Some(rebuilt)
                    } else {
                        None
                    }
                }
                EntryKind::Other => None,
            };

            match replacement {
                Some(bytes) => {
                    writer
                        .start_file(name.as_str(), options)
                        .with_context(|| format!("Failed to start entry: {location}"))?;
                    writer.write_all(&bytes)?;
                    changed = true;
                }
                None => {
                    let entry = archive.by_index_raw(i)?;
                    writer
                        .raw_copy_file_rename(entry, name.as_str())
                        .with_context(|| format!("Failed to copy entry: {location}"))?;
                    trace!(entry = %location, "copied entry");
                }
            }
        }

        Ok(changed)
    }
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    location: &str,
) -> Result<Vec<u8>> {
    let mut entry = archive
        .by_index(index)
        .with_context(|| format!("Failed to open entry: {location}"))?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read entry: {location}"))?;
    Ok(bytes)
}

fn entry_options(entry: &zip::read::ZipFile<'_>) -> FileOptions {
    let method = match entry.compression() {
        CompressionMethod::Stored => CompressionMethod::Stored,
        _ => CompressionMethod::Deflated,
    };
    let options = FileOptions::default()
        .compression_method(method)
        .last_modified_time(entry.last_modified());
    match entry.unix_mode() {
        Some(mode) => options.unix_permissions(mode),
        None => options,
    }
}
