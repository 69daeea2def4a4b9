//! CLI for mutation instrumentation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Confirm;
use tracing_subscriber::EnvFilter;

use mutation_instrumenter::{
    backup_sources, discover_sources, restore_sources, BackupOutcome, EngineSettings,
    MutationEngine, ProjectConfig, RuleSet, RunReport,
};

#[derive(Parser)]
#[command(name = "mutation-instrumenter")]
#[command(author, version, about = "Regex-driven mutation instrumentation for C/C++", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up and instrument every selected source file
    Mutate {
        /// Path to the mutation rules file
        #[arg(short, long, default_value = "mutations.yaml")]
        rules: PathBuf,

        /// Path to the project config file
        #[arg(short, long, default_value = "project.yaml")]
        project: PathBuf,

        /// Override the configured number of worker threads
        #[arg(short, long)]
        workers: Option<usize>,

        /// Override the pass limit for operator groups
        #[arg(long)]
        max_passes: Option<usize>,

        /// Skip backing up sources before rewriting them
        #[arg(long)]
        no_backup: bool,

        /// Overwrite existing backups without asking
        #[arg(short, long)]
        yes: bool,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Restore every selected source file from its backup
    Restore {
        /// Path to the project config file
        #[arg(short, long, default_value = "project.yaml")]
        project: PathBuf,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check both config files and list what would be mutated
    Validate {
        /// Path to the mutation rules file
        #[arg(short, long, default_value = "mutations.yaml")]
        rules: PathBuf,

        /// Path to the project config file
        #[arg(short, long, default_value = "project.yaml")]
        project: PathBuf,
    },

    /// Show example configuration files
    Example,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Mutate {
            rules,
            project,
            workers,
            max_passes,
            no_backup,
            yes,
            verbose,
        } => {
            init_logging(verbose);
            let options = MutateOptions {
                workers,
                max_passes,
                backup: !no_backup,
                assume_yes: yes,
            };
            mutate(&rules, &project, options)
        }

        Commands::Restore { project, verbose } => {
            init_logging(verbose);
            restore(&project)
        }

        Commands::Validate { rules, project } => {
            init_logging(false);
            validate(&rules, &project)
        }

        Commands::Example => {
            print_example();
            Ok(ExitCode::SUCCESS)
        }
    };

    result.unwrap_or_else(|e| {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        ExitCode::FAILURE
    })
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct MutateOptions {
    workers: Option<usize>,
    max_passes: Option<usize>,
    backup: bool,
    assume_yes: bool,
}

/// Load the project config, falling back to defaults on failure
fn load_project(path: &Path, problems: &mut Vec<String>) -> ProjectConfig {
    println!("{}", "Reading project configuration...".dimmed());
    match ProjectConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Warning".yellow().bold(), e);
            problems.push(e.to_string());
            ProjectConfig::default()
        }
    }
}

/// Load the rule set, falling back to an empty one on failure
fn load_rules(path: &Path, problems: &mut Vec<String>) -> RuleSet {
    println!("{}", "Reading mutation rules...".dimmed());
    let rules = match RuleSet::load(path) {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("{}: {}", "Warning".yellow().bold(), e);
            problems.push(e.to_string());
            RuleSet::default()
        }
    };

    for rejected in rules.rejected() {
        problems.push(format!("rule {}", rejected));
    }
    if rules.is_empty() {
        problems.push(format!("no usable rule groups in '{}'", path.display()));
    }
    rules
}

fn mutate(rules_path: &Path, project_path: &Path, options: MutateOptions) -> anyhow::Result<ExitCode> {
    let mut problems = Vec::new();

    let mut project = load_project(project_path, &mut problems);
    if let Some(workers) = options.workers {
        project.settings.worker_threads = workers;
    }
    if let Some(max_passes) = options.max_passes {
        project.settings.max_passes = max_passes;
    }
    if let Err(errors) = project.validate() {
        eprintln!("{}", "Configuration errors found:".red().bold());
        for error in &errors {
            eprintln!("  • {}", error);
        }
        return Ok(ExitCode::from(2));
    }

    let rules = load_rules(rules_path, &mut problems);

    println!("{}", "Generating list of code files...".dimmed());
    let files = discover_sources(&project.sources);
    println!("Found {} code file(s)", files.len());
    if files.is_empty() {
        problems.push("no source files matched the project configuration".to_string());
    }

    if rules.is_empty() || files.is_empty() {
        RunReport::new(Vec::new(), 0)
            .with_config_problems(problems)
            .print();
        return Ok(ExitCode::from(2));
    }

    if options.backup {
        let extension = &project.settings.backup_extension;
        let outcome = backup_sources(&files, extension, |question| {
            options.assume_yes
                || Confirm::new()
                    .with_prompt(question)
                    .default(false)
                    .interact()
                    .unwrap_or(false)
        })
        .context("backing up source files")?;

        match outcome {
            BackupOutcome::Disabled => {
                println!("{}", "No backup extension configured, skipping backups".yellow());
            }
            BackupOutcome::Kept { existing, copied } => {
                println!(
                    "Keeping {} existing backup file(s), backed up {} new file(s)",
                    existing, copied
                );
            }
            BackupOutcome::Completed { copied } => {
                println!(
                    "Backed up {} file(s). To restore them, run: mutation-instrumenter restore",
                    copied
                );
            }
        }
    }

    println!("{}", "Beginning file mutations...".green());
    let settings = EngineSettings {
        worker_threads: project.settings.worker_threads,
        max_passes: project.settings.max_passes,
    };
    let report = MutationEngine::new(&rules, settings)
        .run(&files)
        .with_config_problems(problems);
    report.print();

    if report.failed() > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn restore(project_path: &Path) -> anyhow::Result<ExitCode> {
    let project = ProjectConfig::load(project_path).context("restore needs the project file")?;
    let extension = &project.settings.backup_extension;
    if extension.is_empty() {
        anyhow::bail!("no backup extension configured in '{}'", project_path.display());
    }

    println!("{}", "Restoring backed up code files...".dimmed());
    let files = discover_sources(&project.sources);
    let summary = restore_sources(&files, extension);

    for failure in &summary.failures {
        println!("{} {}", "✗".red(), failure);
    }
    println!(
        "{} Restored {} of {} file(s)",
        if summary.failures.is_empty() { "✓".green().bold() } else { "✗".red().bold() },
        summary.restored,
        files.len()
    );

    if summary.failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn validate(rules_path: &Path, project_path: &Path) -> anyhow::Result<ExitCode> {
    let mut problems = Vec::new();
    let project = load_project(project_path, &mut problems);
    if let Err(errors) = project.validate() {
        problems.extend(errors.iter().map(ToString::to_string));
    }
    let rules = load_rules(rules_path, &mut problems);
    println!();

    for (position, group) in rules.groups().iter().enumerate() {
        println!(
            "{} group #{} ({}) {}",
            "✓".green(),
            position,
            group.kind,
            group.pattern.as_str().dimmed()
        );
        for member in &group.members {
            println!(
                "    {} -> {} ({} mutation(s))",
                member.operator, member.function, member.mutations
            );
        }
    }

    let files = discover_sources(&project.sources);
    println!();
    println!("{} file(s) would be mutated:", files.len());
    for file in &files {
        println!("    {}", file.display());
    }

    println!();
    if problems.is_empty() {
        println!("{} Configuration is valid!", "✓".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        for problem in &problems {
            println!("{} {}", "✗".red(), problem);
        }
        Ok(ExitCode::from(2))
    }
}

fn print_example() {
    let example = r#"# Example mutations.yaml
version: "1.0"

groups:
  # Binary operators: lhs, operator and rhs captures are required
  - kind: binary
    pattern: '(?P<lhs>[^\n]*) (?P<operator>\+|-) (?P<rhs>[^;\n]*)'
    member_count: 2
    members:
      - { operator: "+", mutations: 3, function: MUT_ADD }
      - { operator: "-", mutations: 3, function: MUT_SUB }

  # Unary operators: operator and operand captures are required
  - kind: unary
    pattern: '(?P<operator>!)(?P<operand>\w+)'
    member_count: 1
    members:
      - { operator: "!", mutations: 1, function: MUT_NOT }

  # Literal values: lhs, operator and rhs captures are required
  - kind: literal
    pattern: '(?P<lhs>[^\n]*\w) (?P<operator>=) (?P<rhs>\d+)'
    member_count: 1
    members:
      - { operator: "=", mutations: 2, function: MUT_INT }

# Example project.yaml
version: "1.0"

settings:
  worker_threads: 4
  max_passes: 6
  backup_extension: .orig   # leave empty to disable backups

sources:
  include_dirs:
    - /home/me/project/src
  include_extensions: ["*.cpp", "*.c"]
  exclude_dirs: [bin]
  exclude_files: [test.cpp, "gui*"]
"#;

    println!("{}", example);
}
