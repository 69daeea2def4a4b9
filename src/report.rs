//! Report generation for instrumentation runs
//!
//! This module formats and displays the outcome of a mutation run.

use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

/// What happened to one discovered file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Instrumented and written; local indices are shifted by `offset`
    Mutated { mutations: u64, offset: u64 },
    /// No mutation applied, file left untouched
    Unchanged,
    /// Read, transform or write failed; contributes no mutations
    Failed(String),
}

/// Result for a single file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Summary of a whole run
#[derive(Debug)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub total_mutations: u64,
    pub duration: Duration,
    pub config_problems: Vec<String>,
}

impl RunReport {
    /// Create a new report from per-file results
    pub fn new(files: Vec<FileReport>, total_mutations: u64) -> Self {
        Self {
            files,
            total_mutations,
            duration: Duration::ZERO,
            config_problems: Vec::new(),
        }
    }

    /// Attach configuration problems that explain a thin or empty run
    pub fn with_config_problems(mut self, problems: Vec<String>) -> Self {
        self.config_problems.extend(problems);
        self
    }

    /// Count of files that were instrumented
    pub fn mutated(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Mutated { .. }))
            .count()
    }

    /// Count of files left untouched
    pub fn unchanged(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Unchanged)
            .count()
    }

    /// Count of files that failed
    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Failed(_)))
            .count()
    }

    /// Highest global index handed out, if any
    pub fn max_index(&self) -> Option<u64> {
        self.total_mutations.checked_sub(1)
    }

    /// Print the report to stdout
    pub fn print(&self) {
        println!();
        println!("{}", "Mutation Instrumentation Report".bold());
        println!("{}", "=".repeat(60));
        println!();

        for file in &self.files {
            match &file.status {
                FileStatus::Mutated { mutations, offset } => {
                    println!(
                        "{} {} {}",
                        "[MUTATED]".green().bold(),
                        file.path.display(),
                        format!(
                            "({} mutation(s), indices {}..{})",
                            mutations,
                            offset,
                            offset + mutations
                        )
                        .dimmed()
                    );
                }
                FileStatus::Unchanged => {
                    println!("{} {}", "[UNCHANGED]".dimmed(), file.path.display());
                }
                FileStatus::Failed(reason) => {
                    println!("{} {}", "[FAILED]".red().bold(), file.path.display());
                    println!("        {}", reason.dimmed());
                }
            }
        }

        println!();
        println!("{}", "Summary".bold());
        println!("{}", "-".repeat(40));
        println!("Files scanned:     {}", self.files.len());
        println!("Files mutated:     {}", self.mutated());
        println!("Files unchanged:   {}", self.unchanged());
        if self.failed() > 0 {
            println!("Files failed:      {}", self.failed().to_string().red());
        }
        println!(
            "Duration:          {:.2}s",
            self.duration.as_secs_f64()
        );
        println!();
        println!(
            "Total number of mutations: {}",
            self.total_mutations.to_string().bold()
        );

        if !self.config_problems.is_empty() {
            println!();
            let heading = if self.total_mutations == 0 {
                "No mutations were added because of configuration problems"
            } else {
                "Configuration problems"
            };
            println!("{}", heading.yellow().bold());
            println!("{}", "-".repeat(40));
            for problem in &self.config_problems {
                println!("  • {}", problem);
            }
        }
    }
}
