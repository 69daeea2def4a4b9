//! Backup and restore of source files
//!
//! Backups sit next to the original with an extra suffix, e.g.
//! `engine.cpp` -> `engine.cpp.orig`. Restoring copies them back, which is the
//! only way to undo an instrumentation run.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codegen::clear_readonly;
use crate::error::{MutationError, Result};

/// Path of the backup copy for `file`
pub fn backup_path(file: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(file.as_os_str());
    name.push(extension);
    PathBuf::from(name)
}

/// What a backup pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// No backup extension configured
    Disabled,
    /// Existing backups were kept; only files without one were copied
    Kept { existing: usize, copied: usize },
    /// Every file was copied
    Completed { copied: usize },
}

/// Copy every file to its backup path.
///
/// When backups already exist `confirm` is asked once whether to overwrite
/// them. Refusing keeps every existing backup, since those most likely hold
/// the pristine sources of an earlier run, but files without a backup are
/// still copied.
pub fn backup_sources<F>(files: &[PathBuf], extension: &str, confirm: F) -> Result<BackupOutcome>
where
    F: FnOnce(&str) -> bool,
{
    if extension.is_empty() {
        return Ok(BackupOutcome::Disabled);
    }

    let existing = files
        .iter()
        .filter(|file| backup_path(file, extension).exists())
        .count();
    let overwrite = existing == 0 || {
        let question = format!(
            "{} backup file(s) already exist. Overwrite existing backup files?",
            existing
        );
        confirm(&question)
    };

    let mut copied = 0;
    for file in files {
        let backup = backup_path(file, extension);
        if !overwrite && backup.exists() {
            continue;
        }
        let to_backup_error = |e: std::io::Error| MutationError::BackupError {
            file: file.clone(),
            backup: backup.clone(),
            error: e.to_string(),
        };
        clear_readonly(&backup).map_err(to_backup_error)?;
        fs::copy(file, &backup).map_err(to_backup_error)?;
        copied += 1;
    }

    info!(copied, extension, "backed up source files");
    if overwrite {
        Ok(BackupOutcome::Completed { copied })
    } else {
        info!(existing, "kept existing backups");
        Ok(BackupOutcome::Kept { existing, copied })
    }
}

/// Result of a restore pass
#[derive(Debug, Default)]
pub struct RestoreSummary {
    pub restored: usize,
    pub failures: Vec<MutationError>,
}

/// Copy every backup over its original.
///
/// A missing or unreadable backup is recorded and the remaining files are
/// still restored.
pub fn restore_sources(files: &[PathBuf], extension: &str) -> RestoreSummary {
    let mut summary = RestoreSummary::default();

    for file in files {
        let backup = backup_path(file, extension);
        let result = if backup.exists() {
            clear_readonly(file).and_then(|()| fs::copy(&backup, file).map(|_| ()))
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "backup file does not exist",
            ))
        };

        match result {
            Ok(()) => summary.restored += 1,
            Err(e) => {
                let err = MutationError::RestoreError {
                    file: file.clone(),
                    backup,
                    error: e.to_string(),
                };
                warn!(error = %err, "restore failed");
                summary.failures.push(err);
            }
        }
    }

    info!(restored = summary.restored, failed = summary.failures.len(), "restore finished");
    summary
}
