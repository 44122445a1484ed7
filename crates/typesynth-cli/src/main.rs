use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indexmap::IndexMap;
use log::info;

use typesynth_core::config::{self, CONFIG_FILE_NAME, SynthConfig};
use typesynth_core::parse::{self, spec::OpenApiSpec};
use typesynth_core::{Severity, SynthesisOutput, synthesize, synthesize_batch};

#[derive(Parser)]
#[command(
    name = "typesynth",
    about = "Synthesize type declarations from OpenAPI 3.x schemas",
    version
)]
struct Cli {
    /// Config file (defaults to .typesynth.yaml in the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize declarations and print them
    Synthesize {
        /// OpenAPI documents (YAML or JSON); several are processed in parallel
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Check that every schema of a document synthesizes
    Validate {
        /// Path to the OpenAPI document
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print a short summary of the synthesized declarations
    Inspect {
        /// Path to the OpenAPI document
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Synthesize {
            input,
            output,
            format,
        } => cmd_synthesize(cli.config.as_deref(), &input, output.as_deref(), format),

        Commands::Validate { input } => cmd_validate(cli.config.as_deref(), &input),

        Commands::Inspect { input, format } => cmd_inspect(cli.config.as_deref(), &input, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "typesynth", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(path: Option<&Path>) -> Result<SynthConfig> {
    let path = path.unwrap_or(Path::new(CONFIG_FILE_NAME));
    let loaded = config::load_config(path)?;
    if loaded.is_some() {
        info!("loaded config from {}", path.display());
    }
    Ok(loaded.unwrap_or_default())
}

fn read_spec(path: &Path) -> Result<OpenApiSpec> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let parsed = match ext {
        "json" => parse::from_json(&content),
        _ => parse::from_yaml(&content),
    };
    parsed.with_context(|| format!("failed to parse {}", path.display()))
}

fn render<T: serde::Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml_ng::to_string(value)?,
        OutputFormat::Json => serde_json::to_string_pretty(value)? + "\n",
    })
}

fn report(path: &Path, output: &SynthesisOutput) {
    for diagnostic in &output.diagnostics {
        eprintln!("{}: {diagnostic}", path.display());
    }
    eprintln!(
        "{}: {} declarations, {} operations, {} errors",
        path.display(),
        output.declarations.len(),
        output.operations.len(),
        output.errors().count()
    );
}

fn cmd_synthesize(
    config_path: Option<&Path>,
    inputs: &[PathBuf],
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let cfg = load_config(config_path)?;
    let specs = inputs
        .iter()
        .map(|path| read_spec(path))
        .collect::<Result<Vec<_>>>()?;

    let outputs = synthesize_batch(&specs, &cfg);
    for (path, out) in inputs.iter().zip(&outputs) {
        report(path, out);
    }

    let rendered = match outputs.as_slice() {
        [single] => render(single, format)?,
        _ => {
            let keyed: IndexMap<String, &SynthesisOutput> = inputs
                .iter()
                .map(|p| p.display().to_string())
                .zip(&outputs)
                .collect();
            render(&keyed, format)?
        }
    };

    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn cmd_validate(config_path: Option<&Path>, input: &Path) -> Result<()> {
    let cfg = load_config(config_path)?;
    let spec = read_spec(input)?;

    eprintln!("Valid OpenAPI {} document: {}", spec.openapi, spec.info.title);
    eprintln!("  Version: {}", spec.info.version);
    eprintln!("  Paths: {}", spec.paths.len());
    if let Some(ref components) = spec.components {
        eprintln!("  Schemas: {}", components.schemas.len());
    }

    let output = synthesize(&spec, &cfg);
    report(input, &output);

    if output.has_errors() {
        anyhow::bail!(
            "{} schema(s) or operation(s) could not be synthesized",
            output.errors().count()
        );
    }
    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(config_path: Option<&Path>, input: &Path, format: OutputFormat) -> Result<()> {
    let cfg = load_config(config_path)?;
    let spec = read_spec(input)?;
    let output = synthesize(&spec, &cfg);

    print!("{}", render(&inspect_summary(&output), format)?);
    Ok(())
}

fn inspect_summary(output: &SynthesisOutput) -> serde_json::Value {
    let declarations: Vec<serde_json::Value> = output
        .declarations
        .iter()
        .map(|d| {
            serde_json::json!({
                "name": d.name,
                "kind": d.shape.kind_label(),
                "references": d.referenced_names(),
            })
        })
        .collect();

    let operations: Vec<serde_json::Value> = output
        .operations
        .iter()
        .map(|op| {
            serde_json::json!({
                "name": op.name.camel_case,
                "method": op.method.as_str(),
                "path": op.path,
            })
        })
        .collect();

    let count = |severity: Severity| {
        output
            .diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    };

    serde_json::json!({
        "version": output.version,
        "declarations": declarations,
        "names": output.names,
        "operations": operations,
        "diagnostics": {
            "errors": count(Severity::Error),
            "warnings": count(Severity::Warning),
            "infos": count(Severity::Info),
        },
    })
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
