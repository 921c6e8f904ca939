use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::{Cli, SourceNamespaceArg};

/// Package root shared by every unmapped class reference.
pub const PACKAGE_ROOT: &str = "net/minecraft/";

/// Which unmapped naming scheme the metadata refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceMode {
    Intermediary,
    Hashed,
}

impl NamespaceMode {
    /// Hashed mappings carry the `hashed` token in their header line.
    pub fn detect(first_line: &str) -> Self {
        if first_line.contains("hashed") {
            NamespaceMode::Hashed
        } else {
            NamespaceMode::Intermediary
        }
    }

    /// Namespace name in the mapping table.
    pub fn namespace(self) -> &'static str {
        match self {
            NamespaceMode::Intermediary => "intermediary",
            NamespaceMode::Hashed => "hashed",
        }
    }

    pub fn class_marker(self) -> &'static str {
        match self {
            NamespaceMode::Intermediary => "class_",
            NamespaceMode::Hashed => "unmapped/C_",
        }
    }

    /// Substring that starts an unmapped class reference.
    pub fn sentinel(self) -> String {
        format!("{PACKAGE_ROOT}{}", self.class_marker())
    }
}

impl From<SourceNamespaceArg> for NamespaceMode {
    fn from(arg: SourceNamespaceArg) -> Self {
        match arg {
            SourceNamespaceArg::Intermediary => NamespaceMode::Intermediary,
            SourceNamespaceArg::Hashed => NamespaceMode::Hashed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceStrategy {
    /// Whole-string replace loop with marker splicing for misses.
    #[default]
    Legacy,
    /// One forward scan over reference spans, output rebuilt once.
    Spans,
}

#[derive(Debug, Clone)]
pub struct RemapConfig {
    pub target: PathBuf,
    pub mapping_path: PathBuf,
    pub mode: NamespaceMode,
    pub strategy: ReplaceStrategy,
}

impl RemapConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let target = std::path::absolute(&cli.path)
            .with_context(|| format!("Failed to resolve path: {}", cli.path.display()))?;
        if !target.exists() {
            anyhow::bail!("Path does not exist: {}", target.display());
        }
        let mapping_path = std::path::absolute(&cli.mapping)
            .with_context(|| format!("Failed to resolve path: {}", cli.mapping.display()))?;

        let mode = match cli.source_namespace {
            Some(arg) => arg.into(),
            None => NamespaceMode::detect(&read_first_line(&mapping_path)?),
        };
        let strategy = if cli.span_replace {
            ReplaceStrategy::Spans
        } else {
            ReplaceStrategy::Legacy
        };

        Ok(Self {
            target,
            mapping_path,
            mode,
            strategy,
        })
    }
}

fn read_first_line(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping file: {}", path.display()))?;
    text.lines()
        .next()
        .map(str::to_string)
        .with_context(|| format!("Mapping file is empty: {}", path.display()))
}

/// Sibling snapshot location: `<name>-backup` for directories,
/// `<stem>-backup.<ext>` for files.
pub fn backup_path(target: &Path) -> PathBuf {
    let file_name = if target.is_dir() {
        format!("{}-backup", lossy_name(target.file_name()))
    } else {
        let stem = lossy_name(target.file_stem());
        match target.extension() {
            Some(ext) => format!("{stem}-backup.{}", ext.to_string_lossy()),
            None => format!("{stem}-backup"),
        }
    };

    match target.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Temporary artifact an archive is rebuilt into before replacing it.
pub fn staging_path(archive: &Path) -> PathBuf {
    let mut os = archive.as_os_str().to_os_string();
    os.push(".remap-tmp");
    PathBuf::from(os)
}

fn lossy_name(name: Option<&std::ffi::OsStr>) -> String {
    name.map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "target".to_string())
}
