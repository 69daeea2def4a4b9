//! Project-wide mutation run
//!
//! This module coordinates the instrumentation of a whole project:
//! - Mutates every file on a bounded worker pool
//! - Waits for all workers, then walks the files in discovery order
//! - Assigns each instrumented file its global index offset and writes it

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, error, info, info_span, warn};

use crate::codegen::{insert_index_definition, read_source, write_source};
use crate::error::Result;
use crate::mutator::{FileMutation, FileMutator, DEFAULT_MAX_PASSES};
use crate::report::{FileReport, FileStatus, RunReport};
use crate::rules::RuleSet;

/// Knobs for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub worker_threads: usize,
    pub max_passes: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            worker_threads: 1,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// A file after the parallel stage, before it is written
#[derive(Debug)]
pub struct MutatedFile {
    pub path: PathBuf,
    pub result: Result<FileMutation>,
}

/// Runs the file mutator over a project
pub struct MutationEngine<'r> {
    mutator: FileMutator<'r>,
    settings: EngineSettings,
}

impl<'r> MutationEngine<'r> {
    pub fn new(rules: &'r RuleSet, settings: EngineSettings) -> Self {
        Self {
            mutator: FileMutator::new(rules).with_max_passes(settings.max_passes),
            settings,
        }
    }

    /// Mutate and write every file, returning the run report
    pub fn run(&self, files: &[PathBuf]) -> RunReport {
        let start = Instant::now();
        info!(files = files.len(), workers = self.settings.worker_threads, "beginning file mutations");

        let mutated = self.mutate_files(files);
        let mut report = aggregate(mutated);
        report.duration = start.elapsed();

        info!(total = report.total_mutations, "mutation run finished");
        report
    }

    /// Mutate every file in memory, one worker per file.
    ///
    /// Results come back in the order of `files` once every worker is done.
    /// Falls back to sequential processing when one worker is configured or
    /// the pool cannot be built; the output is the same either way.
    pub fn mutate_files(&self, files: &[PathBuf]) -> Vec<MutatedFile> {
        let total = files.len();

        if self.settings.worker_threads > 1 {
            match ThreadPoolBuilder::new()
                .num_threads(self.settings.worker_threads)
                .thread_name(|i| format!("mutator-{}", i))
                .build()
            {
                Ok(pool) => {
                    return pool.install(|| {
                        files
                            .par_iter()
                            .enumerate()
                            .map(|(position, path)| self.mutate_file(path, position, total))
                            .collect()
                    });
                }
                Err(e) => {
                    warn!(error = %e, "worker pool unavailable, mutating files sequentially");
                }
            }
        }

        files
            .iter()
            .enumerate()
            .map(|(position, path)| self.mutate_file(path, position, total))
            .collect()
    }

    fn mutate_file(&self, path: &Path, position: usize, total: usize) -> MutatedFile {
        let span = info_span!("file", path = %path.display());
        let _entered = span.enter();
        debug!("starting to convert file {} of {}", position + 1, total);

        let result = read_source(path).and_then(|source| self.mutator.mutate(&source));
        match &result {
            Ok(mutation) => debug!(mutations = mutation.mutations, "file converted"),
            Err(e) => error!(error = %e, "file could not be mutated"),
        }

        MutatedFile {
            path: path.to_path_buf(),
            result,
        }
    }
}

/// Assign global offsets in discovery order and write instrumented files.
///
/// Files without mutations are not rewritten. A file that fails here or
/// earlier contributes no mutations and does not shift later offsets.
pub fn aggregate(files: Vec<MutatedFile>) -> RunReport {
    let mut offset = 0u64;
    let mut reports = Vec::with_capacity(files.len());

    for file in files {
        let status = match file.result {
            Err(e) => FileStatus::Failed(e.to_string()),
            Ok(mutation) if mutation.mutations == 0 => FileStatus::Unchanged,
            Ok(mutation) => {
                let instrumented = insert_index_definition(&mutation.source, offset);
                match write_source(&file.path, &instrumented) {
                    Ok(()) => {
                        info!(
                            file = %file.path.display(),
                            mutations = mutation.mutations,
                            offset,
                            "mutations added to file"
                        );
                        let status = FileStatus::Mutated {
                            mutations: mutation.mutations,
                            offset,
                        };
                        offset += mutation.mutations;
                        status
                    }
                    Err(e) => {
                        error!(error = %e, "could not write instrumented file");
                        FileStatus::Failed(e.to_string())
                    }
                }
            }
        };

        reports.push(FileReport {
            path: file.path,
            status,
        });
    }

    RunReport::new(reports, offset)
}
