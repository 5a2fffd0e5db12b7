pub mod cli;
pub mod config;
pub mod filter;
pub mod logging;
pub mod record;
pub mod store;

use crate::cli::{Cli, Commands, ConfigCommand, OutputFormat};
use crate::config::EngineConfig;
use crate::filter::{
    CancellationToken, FilterCriterion, FilterService, MatchOptions, ValidationResult,
};
use crate::record::{LogRecord, read_json_lines};
use crate::store::{ConfigurationStore, FilterConfiguration};
use anyhow::{Context, anyhow, bail};
use chrono::SecondsFormat;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::process::ExitCode;

pub use cli::cli_parse;
pub use filter::{FilterError, FilterExpression};
pub use store::StoreError;

fn open_input(path: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file '{}'", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    let mut text = String::new();
    open_input(path)?
        .read_to_string(&mut text)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    Ok(text)
}

fn open_store(cli: &Cli, config: &EngineConfig, service: &FilterService) -> anyhow::Result<ConfigurationStore> {
    let directory = cli
        .store_dir
        .clone()
        .or_else(|| config.store_directory())
        .ok_or_else(|| anyhow!("No configuration directory available; pass --store-dir"))?;
    Ok(ConfigurationStore::new(directory, service.clone()))
}

fn print_validation(result: &ValidationResult) {
    for error in &result.errors {
        println!("{} {}", "error:".red().bold(), error);
    }
    for warning in &result.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }
    if result.is_valid {
        println!("{}", "Criteria are valid.".green());
    }
}

fn print_fields(service: &FilterService) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Kind", "Operators", "Description"]);

    for descriptor in service.metadata().descriptors() {
        table.add_row(vec![
            descriptor.name.to_string(),
            descriptor.kind.to_string(),
            descriptor.operators.join(", "),
            descriptor.description.to_string(),
        ]);
    }
    println!("{table}");
}

fn format_record(record: &LogRecord) -> String {
    let ts = record
        .timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    let node = if record.node.is_empty() {
        "-"
    } else {
        record.node.as_str()
    };
    format!(
        "{}:{:<6} {} [{}] {} | {}",
        record.source,
        record.line_number,
        ts,
        record.level,
        node,
        record.message.replace('\n', "\\n")
    )
}

fn explain(service: &FilterService, criteria: &[FilterCriterion]) -> anyhow::Result<()> {
    let expression = service.build_expression(criteria)?;
    eprintln!("Filter: {}", expression.description());
    eprintln!("Estimated selectivity: {:.3}", expression.selectivity());
    if criteria.len() > 1 {
        for (idx, planned) in service.plan(criteria)?.iter().enumerate() {
            eprintln!(
                "  {}. {} (selectivity {:.2}, cost {:.2}, score {:.3})",
                idx + 1,
                planned.criterion,
                planned.selectivity,
                planned.cost,
                planned.score
            );
        }
    }
    Ok(())
}

fn apply(
    service: &FilterService,
    input: &Path,
    criteria: &[FilterCriterion],
    format: OutputFormat,
) -> anyhow::Result<usize> {
    let source = if input == Path::new("-") {
        "stdin".to_string()
    } else {
        input.display().to_string()
    };
    let records = read_json_lines(source, open_input(input)?);
    let cancel = CancellationToken::new();
    let filtered = service
        .apply_simple_filters(records, criteria, &cancel)
        .context("Failed to build filter")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut count = 0;
    for item in filtered {
        let record = item.context("Filtering aborted")?;
        match format {
            OutputFormat::Text => writeln!(out, "{}", format_record(&record))?,
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&record)?)?,
        }
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

fn run_config_command(store: &ConfigurationStore, action: &ConfigCommand) -> anyhow::Result<ExitCode> {
    match action {
        ConfigCommand::Save { name, criteria } => {
            let mut config = match store.load(name)? {
                Some(mut existing) => {
                    existing.criteria = criteria.clone();
                    existing
                }
                None => FilterConfiguration::new(name.clone(), criteria.clone()),
            };
            match store.save(&mut config) {
                Ok(path) => println!("Saved '{}' to {}", name, path.display()),
                Err(StoreError::Validation(result)) => {
                    print_validation(&result);
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            }
        }
        ConfigCommand::Show { name } => {
            let config = store
                .load(name)?
                .ok_or_else(|| anyhow!("No saved configuration named '{name}'"))?;
            println!("{} (schema {})", config.name.bold(), config.schema_version);
            if let Some(modified) = config.last_modified {
                println!("Last modified: {}", modified.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
            for criterion in &config.criteria {
                println!("  {criterion}");
            }
        }
        ConfigCommand::List => {
            let names = store.list_names()?;
            if names.is_empty() {
                println!("No saved configurations in {}", store.directory().display());
            }
            for name in names {
                println!("{name}");
            }
        }
        ConfigCommand::Delete { name } => {
            if store.delete(name)? {
                println!("Deleted '{name}'");
            } else {
                println!("No saved configuration named '{name}'");
                return Ok(ExitCode::FAILURE);
            }
        }
        ConfigCommand::Export { name, output } => {
            let config = store
                .load(name)?
                .ok_or_else(|| anyhow!("No saved configuration named '{name}'"))?;
            let text = store.export_to_text(&config)?;
            match output {
                Some(path) => std::fs::write(path, &text).with_context(|| {
                    format!("Failed to write output file '{}'", path.display())
                })?,
                None => println!("{text}"),
            }
        }
        ConfigCommand::Import { file } => {
            let mut config = store.import_from_text(&read_text(file)?)?;
            match store.save(&mut config) {
                Ok(path) => println!("Imported '{}' to {}", config.name, path.display()),
                Err(StoreError::Validation(result)) => {
                    print_validation(&result);
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = cli_parse();
    logging::init(cli.verbose);

    let mut engine_config = config::load_config(cli.config.as_deref())?;
    if cli.case_sensitive {
        engine_config.matching = MatchOptions {
            case_sensitive: true,
        };
    }
    tracing::debug!(config = ?engine_config, "loaded engine configuration");
    let service = FilterService::new(engine_config.matching);

    match &cli.command {
        Commands::Fields => print_fields(&service),
        Commands::Operators { field } => {
            let operators = service.available_operators(field);
            if operators.is_empty() {
                bail!(FilterError::UnsupportedField(field.clone()));
            }
            for operator in operators {
                println!("{operator}");
            }
        }
        Commands::Validate { criteria } => {
            let result = service.validate_filter_criteria(criteria);
            print_validation(&result);
            if !result.is_valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Apply {
            input,
            criteria,
            saved,
            format,
            explain: show_plan,
        } => {
            let criteria = match saved {
                Some(name) => {
                    let store = open_store(&cli, &engine_config, &service)?;
                    store
                        .load(name)?
                        .ok_or_else(|| anyhow!("No saved configuration named '{name}'"))?
                        .criteria
                }
                None => criteria.clone(),
            };
            if *show_plan && service.validate_filter_criteria(&criteria).is_valid {
                explain(&service, &criteria)?;
            }
            let count = apply(&service, input, &criteria, *format)?;
            tracing::info!(count, "filter applied");
        }
        Commands::Config { action } => {
            let store = open_store(&cli, &engine_config, &service)?;
            return run_config_command(&store, action);
        }
    }

    Ok(ExitCode::SUCCESS)
}
