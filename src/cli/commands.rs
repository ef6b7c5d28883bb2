use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::to_json;
use crate::application::{render_tree, ApplicationError, RenderOptions};
use crate::cli::args::{Cli, Commands, ConfigCommands, OutputFormat, SortArg};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{config_template, global_config_path, local_config_path, Settings};
use crate::domain::{choose_canonical, clean, normalize_for_comparison, SimilarityMerger};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    // Completion output must not depend on a loadable config
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let config_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e))?,
    };

    match command {
        Commands::Process {
            input,
            output,
            format,
            sort,
            search,
            min_group_size,
        } => {
            let mut settings = Settings::load(Some(config_dir.as_path()))?;
            if let Some(n) = min_group_size {
                settings.pipeline.min_group_size = *n;
                settings.validate()?;
            }
            _process(
                settings,
                input.as_deref(),
                output.as_deref(),
                *format,
                *sort,
                search.as_deref(),
            )
        }
        Commands::Clean { labels } => _clean(labels),
        Commands::Similar { a, b } => {
            let settings = Settings::load(Some(config_dir.as_path()))?;
            _similar(&settings, a, b)
        }
        Commands::Stats { input } => {
            let settings = Settings::load(Some(config_dir.as_path()))?;
            _stats(settings, input.as_deref())
        }
        Commands::Config { command } => _config(command, &config_dir),
        Commands::Completion { .. } => Ok(()),
    }
}

fn resolve_input(settings: &Settings, input: Option<&Path>) -> CliResult<PathBuf> {
    input
        .map(Path::to_path_buf)
        .or_else(|| settings.input.clone())
        .ok_or_else(|| ApplicationError::NoInput.into())
}

#[instrument(skip(settings))]
fn _process(
    settings: Settings,
    input: Option<&Path>,
    output_path: Option<&Path>,
    format: OutputFormat,
    sort: Option<SortArg>,
    search: Option<&str>,
) -> CliResult<()> {
    let input = resolve_input(&settings, input)?;
    let display = settings.display.clone();
    let container = ServiceContainer::new(settings);
    let service = container.org_chart_service();

    let result = service.process_file(&input)?;
    if result.cleaned.is_empty() {
        output::warning("nothing to show");
        return Ok(());
    }

    let rendered = match format {
        OutputFormat::Json => to_json(&result.cleaned)?,
        OutputFormat::Tree => {
            let options = RenderOptions {
                sort: sort.map(Into::into).unwrap_or(display.sort),
                search: search.map(str::to_string),
                root_label: display.root_label,
                highlight: output_path.is_none(),
            };
            match render_tree(&result.cleaned, &options) {
                Some(tree) => tree.to_string(),
                None => {
                    output::warning("nothing to show");
                    return Ok(());
                }
            }
        }
    };

    match output_path {
        Some(path) => {
            service.write(path, &rendered)?;
            output::success(&format!("wrote {}", path.display()));
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

#[instrument]
fn _clean(labels: &[String]) -> CliResult<()> {
    for raw in labels {
        match clean(raw) {
            Some(cleaned) => output::info(&format!("{:?} -> {}", raw, cleaned)),
            None => output::diff_remove(&format!("{:?} rejected", raw)),
        }
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _similar(settings: &Settings, a: &str, b: &str) -> CliResult<()> {
    let (Some(a), Some(b)) = (clean(a), clean(b)) else {
        return Err(CliError::InvalidArgs(
            "both labels must survive cleaning".to_string(),
        ));
    };
    let merger = SimilarityMerger::new(settings.pipeline.min_length_ratio);
    debug!(
        "normalized: {:?} / {:?}",
        normalize_for_comparison(&a),
        normalize_for_comparison(&b)
    );

    if merger.are_similar(&a, &b) {
        let canonical = choose_canonical(&[a.as_str(), b.as_str()]).unwrap_or(a.as_str());
        output::success(&format!("similar, merged as {:?}", canonical));
    } else {
        output::info(&format!("{:?} and {:?} are kept apart", a, b));
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _stats(settings: Settings, input: Option<&Path>) -> CliResult<()> {
    let input = resolve_input(&settings, input)?;
    let container = ServiceContainer::new(settings);
    let service = container.org_chart_service();

    let result = service.process_file(&input)?;
    let stats = service.stats(&result.raw, &result.cleaned);

    output::header(&input.display());
    output::action(
        "nodes",
        &format!("{} -> {}", stats.raw_nodes, stats.cleaned_nodes),
    );
    output::action(
        "depth",
        &format!("{} -> {}", stats.raw_depth, stats.cleaned_depth),
    );
    output::action(
        "top level",
        &format!("{} -> {}", stats.raw_top_level, stats.cleaned_top_level),
    );
    output::action("rejected", &stats.rejected.len());
    if !stats.rejected.is_empty() {
        output::diff_remove(&stats.rejected.iter().map(|l| format!("{:?}", l)).join(", "));
    }
    Ok(())
}

#[instrument]
fn _config(command: &ConfigCommands, config_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(config_dir))?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".to_string());
            output::action("global", &global);
            output::action("local", &local_config_path(config_dir).display());
            Ok(())
        }
        ConfigCommands::Init { global, force } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                local_config_path(config_dir)
            };
            if path.exists() && !force {
                return Err(CliError::Usage(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, config_template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
            Ok(())
        }
    }
}
