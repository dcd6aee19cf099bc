use archivist::cli::{Cli, Commands, RunArgs, UndoArgs, VerifyArgs};
use archivist::config::{self, AppConfig};
use archivist::organize::reporter;
use archivist::{undo, verify, CliReporter, OrganizeEngine};
use clap::{CommandFactory, Parser};
use colored::*;
use dotenv::dotenv;
use std::io::{self, Write};
use std::process;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = archivist::logging::init_logger();

    let args = Cli::parse();

    match args.command {
        Some(Commands::Run(run_args)) => {
            let config = load_config_or_exit();
            let config = match apply_run_overrides(config, &run_args) {
                Ok(config) => config,
                Err(err) => {
                    error!("Error: {}", err);
                    process::exit(1);
                }
            };
            if let Err(err) = run_organize(config) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::Undo(undo_args)) => {
            if let Err(err) = run_undo(&undo_args) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::Verify(verify_args)) => {
            let config = load_config_or_exit();
            if let Err(err) = run_verify(&config, &verify_args) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::PrintConfig) => {
            let config = load_config_or_exit();
            match toml::to_string_pretty(&config) {
                Ok(rendered) => println!("{}", rendered),
                Err(_) => println!("{:?}", config),
            }
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }
}

fn load_config_or_exit() -> AppConfig {
    match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    }
}

fn apply_run_overrides(mut config: AppConfig, args: &RunArgs) -> anyhow::Result<AppConfig> {
    if !args.roots.is_empty() {
        config.root_paths = args.roots.clone();
    }
    config.exclude_patterns.extend(args.excludes.iter().cloned());
    if let Some(path) = &args.exclude_from {
        config
            .exclude_patterns
            .extend(config::load_exclude_file(path)?);
    }
    if let Some(dest) = &args.dest {
        config.dest_root = dest.clone();
    }
    if args.dry_run {
        config.dry_run = true;
    }
    if args.parallel {
        config.parallel_moves = true;
    }
    if let Some(report) = &args.report {
        config.report_dir = report.clone();
    }
    if let Some(format) = args.format {
        config.report_format = format;
    }
    Ok(config)
}

fn run_organize(config: AppConfig) -> anyhow::Result<()> {
    let engine = OrganizeEngine::new(config);
    let progress = CliReporter::new();
    let result = engine.run(&progress)?;

    println!();
    info!(
        "Scan: {}, Classify: {}, Resolve: {}, Move: {}",
        format!("{:.2}s", result.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.classify_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.resolve_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.move_duration.as_secs_f64()).green(),
    );
    info!(
        "{} records scanned, {} item groups, {} ungrouped",
        format!("{}", result.total_records).cyan(),
        format!("{}", result.group_count).cyan(),
        format!("{}", result.ungrouped_count).cyan(),
    );

    reporter::print_summary(&result.actions, &result.manifest_path);

    // Per-file errors are visible in the manifest and the log; they do not
    // fail the run.
    Ok(())
}

fn run_undo(args: &UndoArgs) -> anyhow::Result<()> {
    if !args.dry_run && !args.yes {
        match prompt_confirm(
            "Restore all files recorded in this manifest to their original locations?",
            Some(false),
        ) {
            Ok(true) => {}
            _ => process::exit(0),
        }
    }

    let summary = undo::undo_manifest(&args.manifest, args.dry_run)?;
    info!(
        "{} restored, {} skipped, {} errors",
        format!("{}", summary.restored).green(),
        format!("{}", summary.skipped).yellow(),
        format!("{}", summary.errors).red(),
    );
    Ok(())
}

fn run_verify(config: &AppConfig, args: &VerifyArgs) -> anyhow::Result<()> {
    let dest = match &args.dest {
        Some(dest) => dest.clone(),
        None => config.dest_root.clone(),
    };
    if dest.is_empty() {
        anyhow::bail!("no destination root configured");
    }

    let report = verify::verify_tree(std::path::Path::new(&dest), &args.primary, &args.required)?;

    if report.missing.is_empty() {
        println!(
            "{} {} items checked, all companions present",
            "OK".green(),
            report.items_checked
        );
    } else {
        println!(
            "{} {} missing companions across {} items:",
            "!!".red(),
            report.missing.len(),
            report.items_checked
        );
        for missing in &report.missing {
            println!("  {}  missing {}", missing.primary.display(), missing.suffix);
        }
    }
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
