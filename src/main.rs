mod cli;

use webpforge::config::{self, Config};
use webpforge::pipeline::{CandidateStatus, OriginalState, Pipeline, PipelineReport, Plan};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "webpforge=trace,webpforge_common=debug".to_string()
        } else {
            "webpforge=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { dry_run, json } => {
            let (config, root) = load_project(cli.config.as_deref(), cli.root.as_deref())?;
            if dry_run {
                plan(config, &root, json)
            } else {
                run(config, &root, json)
            }
        }
        Commands::Scan { json } => {
            let (config, root) = load_project(cli.config.as_deref(), cli.root.as_deref())?;
            scan(&config, &root, json)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("webpforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load the config and resolve its paths against the project root.
fn load_project(config_path: Option<&Path>, root: Option<&Path>) -> Result<(Config, PathBuf)> {
    let config = config::load_config_or_default(config_path, root)?;

    // Determine project root from --root, the config path, or the current directory
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => match config_path
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
        {
            Some(parent) => parent.to_path_buf(),
            None => std::env::current_dir()?,
        },
    };

    if !root.is_dir() {
        anyhow::bail!("Project root does not exist: {:?}", root);
    }

    tracing::debug!("Project root: {:?}", root);
    Ok((config.resolved(&root), root))
}

fn run(config: Config, root: &Path, json: bool) -> Result<()> {
    let report = Pipeline::new(config).run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, root);
    }

    let failures = report.failures().len();
    if failures > 0 {
        anyhow::bail!(
            "{} file(s) failed; the asset set is only partially migrated",
            failures
        );
    }

    Ok(())
}

fn plan(config: Config, root: &Path, json: bool) -> Result<()> {
    let plan = Pipeline::new(config).plan()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    print_plan(&plan, root);
    Ok(())
}

fn scan(config: &Config, root: &Path, json: bool) -> Result<()> {
    let candidates = webpforge::pipeline::list_candidates(
        &config.paths.source_dir,
        &config.transcode.image_extensions,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    println!(
        "{} candidate image(s) in {}",
        candidates.len(),
        display(&config.paths.source_dir, root)
    );
    for candidate in &candidates {
        println!("  {}", candidate.file_name());
    }

    Ok(())
}

fn print_report(report: &PipelineReport, root: &Path) {
    if report.candidates.is_empty() {
        println!("No candidate images found. Nothing to do.");
        return;
    }

    println!(
        "Transcoded {} of {} image(s)",
        report.transcoded().count(),
        report.candidates.len()
    );
    for outcome in &report.candidates {
        let name = outcome.candidate.file_name();
        match &outcome.status {
            CandidateStatus::Transcoded { output } => {
                println!("  ✓ {} -> {}", name, display(output, root));
            }
            CandidateStatus::Failed { error } => {
                println!("  ✗ {}: {}", name, error.message);
            }
        }
        if let OriginalState::RemoveFailed { error } = &outcome.original {
            println!("  ! {}: {}", name, error.message);
        }
    }

    let rewrite = &report.rewrite;
    println!(
        "\nRewrote {} reference(s) in {} of {} source file(s)",
        rewrite.replacements, rewrite.files_rewritten, rewrite.files_scanned
    );
    for failure in &rewrite.failures {
        println!("  ✗ {}", failure.message);
    }

    let kept = report
        .transcoded()
        .filter(|o| o.original == OriginalState::Kept)
        .count();
    if kept > 0 {
        println!("\nKept {} original(s) because the rewrite pass failed", kept);
    }
}

fn print_plan(plan: &Plan, root: &Path) {
    if plan.candidates.is_empty() {
        println!("No candidate images found. Nothing to do.");
        return;
    }

    println!(
        "[DRY RUN] Would transcode {} image(s):",
        plan.candidates.len()
    );
    for planned in &plan.candidates {
        println!(
            "  {} -> {}",
            display(&planned.candidate.path, root),
            display(&planned.output, root)
        );
        for file in &planned.referenced_by {
            println!("      referenced by {}", display(file, root));
        }
    }

    for failure in &plan.failures {
        println!("  ✗ {}", failure.message);
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Source dir: {}", config.paths.source_dir.display());
    println!("  Dest dir: {}", config.paths.dest_dir.display());
    println!("  Text root: {}", config.paths.text_root.display());
    println!(
        "  Output: /{}/<name>.{} at quality {}",
        config.rewrite.url_prefix, config.transcode.target_extension, config.transcode.quality
    );
    println!(
        "  Image extensions: {}",
        config.transcode.image_extensions.join(", ")
    );
    println!(
        "  Text extensions: {}",
        config.rewrite.text_extensions.join(", ")
    );
    println!("  Workers: {}", config.worker_count());
    println!("  Removal: {:?}", config.transcode.removal);

    Ok(())
}

/// Show `path` relative to the project root when it lives under it.
fn display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
