//! Command implementations for tabcompare CLI

use crate::cache::SourceLabels;
use crate::cli::{Commands, OutputFormat};
use crate::config::{ComparisonConfig, NullKeyPolicy};
use crate::engine::ComparisonEngine;
use crate::error::{Result, TabcompareError};
use crate::fingerprint::comparison_fingerprint;
use crate::loader::{DatasetLoader, SourceDescriptor};
use crate::output::{short_id, CsvFormatter, JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::report::ComparisonReport;
use crate::workspace::TabcompareWorkspace;
use std::path::{Path, PathBuf};

/// Flags of a `compare` invocation
struct CompareArgs {
    base: PathBuf,
    compare: PathBuf,
    join: Vec<String>,
    columns: Vec<String>,
    abs_tol: Option<f64>,
    rel_tol: Option<f64>,
    ignore_case: bool,
    null_keys: Option<NullKeyPolicy>,
    format: String,
    output: Option<PathBuf>,
    no_cache: bool,
    limit: Option<usize>,
}

/// Execute a command
pub fn execute_command(command: Commands, workspace_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Init { force } => init_command(workspace_path, force),
        Commands::Compare {
            base,
            compare,
            join,
            columns,
            abs_tol,
            rel_tol,
            ignore_case,
            null_keys,
            format,
            output,
            no_cache,
            limit,
        } => compare_command(
            workspace_path,
            CompareArgs {
                base,
                compare,
                join,
                columns,
                abs_tol,
                rel_tol,
                ignore_case,
                null_keys,
                format,
                output,
                no_cache,
                limit,
            },
        ),
        Commands::Show { id, format, limit } => show_command(workspace_path, &id, &format, limit),
        Commands::List { format } => list_command(workspace_path, &format),
        Commands::Forget { id } => forget_command(workspace_path, &id),
    }
}

/// Initialize tabcompare workspace
fn init_command(workspace_path: Option<&Path>, force: bool) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let root = workspace_path.unwrap_or(&current_dir);

    // Always create in the given directory; parents are not searched
    let workspace = TabcompareWorkspace::create_new(root.to_path_buf())?;
    if force {
        workspace.create_config_with_force(true)?;
    }

    println!("✅ Initialized tabcompare workspace at: {}", workspace.root.display());
    println!("📁 Workspace directory: {}", workspace.workspace_dir.display());

    Ok(())
}

/// Compare two datasets
fn compare_command(workspace_path: Option<&Path>, args: CompareArgs) -> Result<()> {
    let output_format = OutputFormat::parse(&args.format).map_err(TabcompareError::invalid_input)?;
    let workspace = TabcompareWorkspace::find_or_create(workspace_path)?;
    let settings = workspace.load_settings()?;

    let base_source = SourceDescriptor::from_path(&resolve_input(&workspace, &args.base))?;
    let compare_source = SourceDescriptor::from_path(&resolve_input(&workspace, &args.compare))?;

    let config = build_config(&args, &settings);
    config.validate()?;

    let mut progress = match output_format {
        OutputFormat::Pretty => ProgressReporter::new_for_compare(),
        OutputFormat::Json | OutputFormat::Csv => ProgressReporter::new_minimal(),
    };

    let loader = DatasetLoader::new()?;
    progress.update_load(&format!("Loading {}...", base_source));
    let base = loader.load(&base_source)?;
    progress.update_load(&format!("Loading {}...", compare_source));
    let compare = loader.load(&compare_source)?;
    progress.finish_load(&format!(
        "✅ Loaded {} and {} rows",
        base.row_count(),
        compare.row_count()
    ));

    let use_cache = settings.cache_results && !args.no_cache;
    let cache = workspace.result_cache();
    let labels = SourceLabels::new(base_source.to_string(), compare_source.to_string());

    let fingerprint = if use_cache {
        Some(comparison_fingerprint(&base, &compare, &config)?)
    } else {
        None
    };

    let cached = match &fingerprint {
        Some(fingerprint) => reuse_cached(&workspace, fingerprint),
        None => None,
    };

    let (report, report_id) = match cached {
        Some((report, id)) => {
            progress.finish_compare(&format!("♻️  Reused cached comparison {}", short_id(&id)));
            (report, Some(id))
        }
        None => {
            let report = ComparisonEngine::new(config).run(&base, &compare)?;
            progress.finish_compare(&format!(
                "✅ Compared {} matched rows",
                report.row_partition.matched_count
            ));

            let report_id = match &fingerprint {
                Some(fingerprint) => {
                    progress.start_cache("Caching result...");
                    let id = cache.store(&report, fingerprint, &labels)?;
                    progress.finish_cache(&format!("💾 Cached as {}", short_id(&id)));
                    Some(id)
                }
                None => None,
            };
            (report, report_id)
        }
    };

    log::debug!("Comparison finished in {:.2?}", progress.elapsed());
    drop(progress);

    if let Some(path) = &args.output {
        std::fs::write(path, JsonFormatter::format_report(&report, report_id.as_deref())?)?;
        log::info!("Wrote report to {}", path.display());
    }

    match output_format {
        OutputFormat::Pretty => {
            let limit = args.limit.unwrap_or(settings.max_display_rows);
            let title = format!("{} → {}", labels.base, labels.compare);
            PrettyPrinter::print_report(&report, &title, limit);
            if let Some(id) = &report_id {
                println!("💾 Report id: {}", id);
            }
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::format_report(&report, report_id.as_deref())?);
        }
        OutputFormat::Csv => print!("{}", CsvFormatter::format_summary(&report)),
    }

    Ok(())
}

/// Show a cached report
fn show_command(
    workspace_path: Option<&Path>,
    id: &str,
    format: &str,
    limit: Option<usize>,
) -> Result<()> {
    let output_format = OutputFormat::parse(format).map_err(TabcompareError::invalid_input)?;
    let workspace = TabcompareWorkspace::find_or_create(workspace_path)?;
    let settings = workspace.load_settings()?;
    let cache = workspace.result_cache();

    let report = cache.retrieve(id)?;

    match output_format {
        OutputFormat::Pretty => {
            let limit = limit.unwrap_or(settings.max_display_rows);
            PrettyPrinter::print_report(&report, id, limit);
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::format_report(&report, Some(id))?);
        }
        OutputFormat::Csv => print!("{}", CsvFormatter::format_summary(&report)),
    }

    Ok(())
}

/// List cached comparisons
fn list_command(workspace_path: Option<&Path>, format: &str) -> Result<()> {
    let output_format = OutputFormat::parse(format).map_err(TabcompareError::invalid_input)?;
    let workspace = TabcompareWorkspace::find_or_create(workspace_path)?;
    let entries = workspace.result_cache().list()?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_cache_list(&entries),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&entries)?),
        OutputFormat::Csv => print!("{}", CsvFormatter::format_cache_list(&entries)),
    }

    Ok(())
}

/// Remove a cached comparison
fn forget_command(workspace_path: Option<&Path>, id: &str) -> Result<()> {
    let workspace = TabcompareWorkspace::find_or_create(workspace_path)?;
    let removed = workspace.result_cache().remove(id)?;
    println!("🗑️  Removed comparison {}", removed);
    Ok(())
}

/// Settings supply defaults; explicit flags win
fn build_config(args: &CompareArgs, settings: &crate::config::Settings) -> ComparisonConfig {
    let mut config = ComparisonConfig::new(args.join.iter().map(|c| c.trim().to_string()))
        .with_compare_columns(args.columns.iter().map(|c| c.trim().to_string()))
        .with_settings(settings);

    if let Some(tolerance) = args.abs_tol {
        config = config.with_absolute_tolerance(tolerance);
    }
    if let Some(tolerance) = args.rel_tol {
        config = config.with_relative_tolerance(tolerance);
    }
    if args.ignore_case {
        config = config.with_case_sensitive(false);
    }
    if let Some(policy) = args.null_keys {
        config = config.with_null_key_policy(policy);
    }

    config
}

/// Relative inputs are taken from the current directory, then the workspace root
fn resolve_input(workspace: &TabcompareWorkspace, input: &Path) -> PathBuf {
    if input.is_absolute() || input.exists() {
        input.to_path_buf()
    } else {
        workspace.root.join(input)
    }
}

fn reuse_cached(
    workspace: &TabcompareWorkspace,
    fingerprint: &str,
) -> Option<(ComparisonReport, String)> {
    let cache = workspace.result_cache();
    let id = match cache.lookup(fingerprint) {
        Ok(Some(id)) => id,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Result cache lookup failed: {}", e);
            return None;
        }
    };

    match cache.retrieve(&id) {
        Ok(report) => {
            log::info!("Reusing cached comparison {}", id);
            Some((report, id))
        }
        Err(e) => {
            log::warn!("Cached comparison {} could not be read, recomputing: {}", id, e);
            None
        }
    }
}
