//! Source file discovery

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Sources;

/// List the files to instrument, in a reproducible order.
///
/// Include directories are walked in the order given, entries sorted by file
/// name. A file reachable from two include directories is listed once.
pub fn discover_sources(sources: &Sources) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for root in &sources.include_dirs {
        if !root.is_dir() {
            warn!(dir = %root.display(), "include directory does not exist");
            continue;
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || sources.directory_allowed(entry.path())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_file()
                && sources.file_allowed(entry.path())
                && seen.insert(entry.path().to_path_buf())
            {
                debug!(file = %entry.path().display(), "selected source file");
                files.push(entry.into_path());
            }
        }
    }

    info!(count = files.len(), "discovered source files");
    files
}
