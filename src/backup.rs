//! Snapshot-and-restore wrapper around an in-place mutation of a path.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::backup_path;
use crate::walk::walk_entries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The mutation changed something and was kept.
    Remapped,
    /// Nothing changed; the target was restored from the snapshot.
    Restored,
}

/// Snapshots `target`, runs `mutate` on it and keeps the result only if
/// `mutate` reports a change. The snapshot is removed either way. If
/// `mutate` fails, the snapshot is left on disk for manual recovery.
pub fn run_transaction<F>(target: &Path, mutate: F) -> Result<Outcome>
where
    F: FnOnce(&Path) -> Result<bool>,
{
    if !target.exists() {
        anyhow::bail!("Path does not exist: {}", target.display());
    }

    let backup = backup_path(target);
    remove_recursively(&backup)?;
    copy_recursively(target, &backup)
        .with_context(|| format!("Failed to create backup: {}", backup.display()))?;
    println!("Backup created: {}", backup.display());

    let changed = mutate(target)?;

    if changed {
        println!("One or more annotations were remapped");
        remove_recursively(&backup)?;
        Ok(Outcome::Remapped)
    } else {
        println!("No remapping occurred - restoring backup");
        remove_recursively(target)?;
        copy_recursively(&backup, target)
            .with_context(|| format!("Failed to restore backup: {}", backup.display()))?;
        remove_recursively(&backup)?;
        info!(target = %target.display(), "restored from backup");
        Ok(Outcome::Restored)
    }
}

pub fn remove_recursively(path: &Path) -> Result<()> {
    let Ok(meta) = std::fs::symlink_metadata(path) else {
        return Ok(());
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))
    } else {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))
    }
}

/// Copies a file, or a directory tree, to `to`. `to` must not exist.
/// Symlinks are recreated as links, never followed.
pub fn copy_recursively(from: &Path, to: &Path) -> Result<()> {
    if std::fs::symlink_metadata(to).is_ok() {
        anyhow::bail!("Copy target already exists: {}", to.display());
    }
    let meta = std::fs::symlink_metadata(from)
        .with_context(|| format!("Failed to stat {}", from.display()))?;
    if meta.file_type().is_symlink() {
        return copy_symlink(from, to);
    }
    if !meta.is_dir() {
        std::fs::copy(from, to).with_context(|| {
            format!("Failed to copy {} -> {}", from.display(), to.display())
        })?;
        return Ok(());
    }

    for entry in walk_entries(from)? {
        let relative = entry
            .path()
            .strip_prefix(from)
            .with_context(|| format!("Walked outside of {}", from.display()))?;
        let dest = to.join(relative);
        match entry.file_type() {
            Some(t) if t.is_dir() => std::fs::create_dir_all(&dest)
                .with_context(|| format!("Failed to create directory: {}", dest.display()))?,
            Some(t) if t.is_file() => {
                std::fs::copy(entry.path(), &dest).with_context(|| {
                    format!(
                        "Failed to copy {} -> {}",
                        entry.path().display(),
                        dest.display()
                    )
                })?;
            }
            Some(t) if t.is_symlink() => copy_symlink(entry.path(), &dest)?,
            _ => {}
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    let link = std::fs::read_link(from)
        .with_context(|| format!("Failed to read link: {}", from.display()))?;
    std::os::unix::fs::symlink(&link, to).with_context(|| {
        format!("Failed to create link {} -> {}", to.display(), link.display())
    })
}

#[cfg(windows)]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    let link = std::fs::read_link(from)
        .with_context(|| format!("Failed to read link: {}", from.display()))?;
    let created = if from.is_dir() {
        std::os::windows::fs::symlink_dir(&link, to)
    } else {
        std::os::windows::fs::symlink_file(&link, to)
    };
    created.with_context(|| {
        format!("Failed to create link {} -> {}", to.display(), link.display())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "metadata_remapper_backup_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    fn populate(dir: &Path) {
        std::fs::create_dir_all(dir.join("nested/deeper")).unwrap();
        std::fs::write(dir.join("a.txt"), b"a").unwrap();
        std::fs::write(dir.join("nested/deeper/b.bin"), [0u8, 1, 2]).unwrap();
        std::fs::create_dir_all(dir.join("empty")).unwrap();
    }

    #[test]
    fn copy_recursively_mirrors_tree() -> Result<()> {
        let base = temp_dir("copy");
        let from = base.join("src");
        let to = base.join("dst");
        populate(&from);

        copy_recursively(&from, &to)?;
        assert_eq!(std::fs::read(to.join("a.txt"))?, b"a");
        assert_eq!(std::fs::read(to.join("nested/deeper/b.bin"))?, vec![0, 1, 2]);
        assert!(to.join("empty").is_dir());
        assert!(copy_recursively(&from, &to).is_err());

        std::fs::remove_dir_all(base)?;
        Ok(())
    }

    #[test]
    fn unchanged_run_restores_and_removes_backup() -> Result<()> {
        let base = temp_dir("restore");
        let target = base.join("work");
        populate(&target);

        let outcome = run_transaction(&target, |path| {
            std::fs::write(path.join("a.txt"), b"scribbled")?;
            Ok(false)
        })?;
        assert_eq!(outcome, Outcome::Restored);
        assert_eq!(std::fs::read(target.join("a.txt"))?, b"a");
        assert!(!backup_path(&target).exists());

        std::fs::remove_dir_all(base)?;
        Ok(())
    }

    #[test]
    fn changed_run_keeps_mutation() -> Result<()> {
        let base = temp_dir("keep");
        std::fs::create_dir_all(&base)?;
        let target = base.join("lib.jar");
        std::fs::write(&target, b"old")?;
        std::fs::write(base.join("lib-backup.jar"), b"stale backup")?;

        let outcome = run_transaction(&target, |path| {
            assert_eq!(std::fs::read(base.join("lib-backup.jar"))?, b"old");
            std::fs::write(path, b"new")?;
            Ok(true)
        })?;
        assert_eq!(outcome, Outcome::Remapped);
        assert_eq!(std::fs::read(&target)?, b"new");
        assert!(!base.join("lib-backup.jar").exists());

        std::fs::remove_dir_all(base)?;
        Ok(())
    }

    #[test]
    fn failed_mutation_leaves_backup() -> Result<()> {
        let base = temp_dir("fail");
        let target = base.join("work");
        populate(&target);

        let result = run_transaction(&target, |_| anyhow::bail!("disk full"));
        assert!(result.is_err());
        assert!(backup_path(&target).join("a.txt").exists());

        std::fs::remove_dir_all(base)?;
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn restore_keeps_symlinks() -> Result<()> {
        let base = temp_dir("symlinks");
        let target = base.join("work");
        populate(&target);
        std::os::unix::fs::symlink("a.txt", target.join("link.txt"))?;
        std::os::unix::fs::symlink("nested", target.join("libs"))?;
        std::os::unix::fs::symlink("gone.txt", target.join("dangling"))?;

        let outcome = run_transaction(&target, |_| Ok(false))?;
        assert_eq!(outcome, Outcome::Restored);
        for (link, points_to) in [("link.txt", "a.txt"), ("libs", "nested"), ("dangling", "gone.txt")] {
            let path = target.join(link);
            assert!(std::fs::symlink_metadata(&path)?.file_type().is_symlink());
            assert_eq!(std::fs::read_link(&path)?, PathBuf::from(points_to));
        }
        assert_eq!(std::fs::read(target.join("link.txt"))?, b"a");
        assert!(target.join("libs/deeper/b.bin").exists());
        assert!(!backup_path(&target).exists());

        std::fs::remove_dir_all(base)?;
        Ok(())
    }

    #[test]
    fn missing_target_is_rejected_before_backup() {
        let base = temp_dir("missing");
        let target = base.join("nope");
        assert!(run_transaction(&target, |_| Ok(true)).is_err());
        assert!(!backup_path(&target).exists());
    }
}
