//! polyjuice CLI - Translate table schemas into Django models.

mod starter;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use polyjuice::{model, Config, Model, OutputFormat, PolyjuiceError, RenderOptions};
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "polyjuice")]
#[command(about = "Translate table schemas into Django models")]
#[command(version)]
struct Cli {
    /// Path to YAML schema document
    #[arg(short, long, default_value = "schema.yaml")]
    schema: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate every model and report problems
    Check,

    /// Render Django source for every model
    Render {
        /// Output format: models or migration
        #[arg(short, long, default_value = "models")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the translation of one model
    Inspect {
        /// Model name
        model: String,
    },

    /// Write a starter schema document
    Init {
        /// Output path for the schema document [default: schema.yaml]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force overwrite existing file
        #[arg(long, short)]
        force: bool,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<(), PolyjuiceError> {
    let cli = Cli::parse();

    // Init does not read a schema document
    if let Commands::Init { output, force } = &cli.command {
        let output_path = output.clone().unwrap_or_else(|| PathBuf::from("schema.yaml"));
        starter::write_starter(&output_path, *force)?;
        println!("Wrote starter schema to {}", output_path.display());
        return Ok(());
    }

    setup_logging(&cli.verbosity, &cli.log_format).map_err(PolyjuiceError::Config)?;

    polyjuice::init();
    let config = Config::load(&cli.schema)?;
    info!("Loaded schema document from {:?}", cli.schema);

    match cli.command {
        Commands::Init { .. } => unreachable!(), // Handled above

        Commands::Check => check(&config, cli.output_json)?,

        Commands::Render { format, output } => {
            let format: OutputFormat = format.parse().map_err(PolyjuiceError::Config)?;
            render(&config, format, output.as_deref())?;
        }

        Commands::Inspect { model: name } => {
            let translated = model(&config.placeholder(&name)?)?;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&translated)?);
            } else {
                print_model(&translated);
            }
        }
    }

    Ok(())
}

/// Translate every model, print a report and fail on the first error.
fn check(config: &Config, output_json: bool) -> Result<(), PolyjuiceError> {
    let placeholders = config.placeholders()?;
    let results: Vec<(String, Result<Model, PolyjuiceError>)> = placeholders
        .iter()
        .map(|p| (p.name.clone(), model(p)))
        .collect();

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    info!(
        "Checked {} models: {} ok, {} failed",
        results.len(),
        results.len() - failed,
        failed
    );

    if output_json {
        let report: Vec<serde_json::Value> = results
            .iter()
            .map(|(name, result)| match result {
                Ok(m) => serde_json::json!({
                    "model": name,
                    "ok": true,
                    "fields": m.fields.len(),
                    "indexes": m.meta.indexes.len(),
                }),
                Err(e) => serde_json::json!({
                    "model": name,
                    "ok": false,
                    "error": e.to_string(),
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (name, result) in &results {
            match result {
                Ok(m) => println!(
                    "  ✓ {} ({} fields, {} indexes)",
                    name,
                    m.fields.len(),
                    m.meta.indexes.len()
                ),
                Err(e) => println!("  ✗ {}: {}", name, e),
            }
        }
        println!("\n{} models checked, {} failed", results.len(), failed);
    }

    match results.into_iter().find_map(|(_, r)| r.err()) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Render every model and write the result to a file or stdout.
fn render(config: &Config, format: OutputFormat, output: Option<&Path>) -> Result<(), PolyjuiceError> {
    let models = config
        .placeholders()?
        .iter()
        .map(model)
        .collect::<Result<Vec<_>, _>>()?;

    let mut options = RenderOptions::new(config.render.app_label.clone());
    if config.render.header {
        options = options
            .with_header(chrono::Utc::now())
            .with_fingerprint(config.hash());
    }

    let writer = format.writer();
    info!("Rendering {} models with the {} writer", models.len(), writer.name());
    let source = writer.render(&models, &options)?;

    match output {
        Some(path) => {
            fs::write(path, &source)?;
            info!(
                "Wrote {} ({} models) to {}",
                writer.file_name(),
                models.len(),
                path.display()
            );
        }
        None => print!("{}", source),
    }

    Ok(())
}

fn print_model(m: &Model) {
    println!("Model {} ({})", m.name, m.module);
    println!("  db_table: {}", m.meta.db_table);
    println!("  fields:");
    for f in &m.fields {
        let options: Vec<String> = f
            .field
            .options
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        let target = match f.field.foreign_key() {
            Some(fk) => format!(" -> {} ({})", fk.to, fk.on_delete),
            None => String::new(),
        };
        println!(
            "    {}: {}{} [{}]",
            f.name,
            f.field.kind.django_class(),
            target,
            options.join(", ")
        );
    }
    if !m.meta.indexes.is_empty() {
        println!("  indexes:");
        for index in &m.meta.indexes {
            println!("    {}: {}", index.name, index.fields.join(", "));
        }
    }
    if !m.methods.is_empty() {
        let names: Vec<&str> = m.methods.iter().map(|method| method.name.as_str()).collect();
        println!("  methods: {}", names.join(", "));
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
