//! kubemodel CLI
//!
//! Command-line interface for compiling the Kubernetes Swagger schema into a
//! versioned Rust domain model.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use kubemodel_analyzer::{AnalysisResult, ModelAnalyzer};
use kubemodel_common::{CompilerSession, ModelHints};
use kubemodel_generator::ModelGenerator;
use kubemodel_parser::SwaggerParser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kubemodel")]
#[command(version, about = "Compile the Kubernetes OpenAPI schema into a typed domain model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Inputs shared by every command
#[derive(Args)]
struct SchemaArgs {
    /// Path to the Swagger 2.0 JSON schema
    #[arg(short, long)]
    schema: PathBuf,

    /// Optional YAML hints file (preferred versions, unstripped groups)
    #[arg(long)]
    hints: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the schema and summarize units, classes and diagnostics
    #[command(after_help = "EXAMPLES:\n  \
        kubemodel inspect --schema swagger.json\n  \
        kubemodel inspect --schema swagger.json --hints hints.yaml --verbose")]
    Inspect {
        #[command(flatten)]
        input: SchemaArgs,
    },

    /// Write the operation association review report
    #[command(after_help = "EXAMPLES:\n  \
        kubemodel report --schema swagger.json\n  \
        kubemodel report --schema swagger.json --output review.txt")]
    Report {
        #[command(flatten)]
        input: SchemaArgs,

        /// Report file (stdout if not given)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate Rust modules for every compilation unit
    #[command(after_help = "EXAMPLES:\n  \
        kubemodel generate \\\n    \
        --schema swagger.json \\\n    \
        --hints hints.yaml \\\n    \
        --output ./src/model")]
    Generate {
        #[command(flatten)]
        input: SchemaArgs,

        /// Output directory
        #[arg(short, long, default_value = "./model")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { input } => inspect_command(&input, cli.verbose)?,
        Commands::Report { input, output } => report_command(&input, output.as_deref())?,
        Commands::Generate { input, output } => {
            generate_command(&input, output.as_path(), cli.verbose)?
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise warnings, or debug with `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A compiled and analyzed schema
struct Compiled {
    title: String,
    session: CompilerSession,
    analysis: AnalysisResult,
}

fn compile(input: &SchemaArgs) -> Result<Compiled> {
    let hints = match &input.hints {
        Some(path) => {
            eprintln!("{} Loading hints: {}", "→".cyan(), path.display());
            ModelHints::load(path).context("Failed to load hints")?
        }
        None => ModelHints::default(),
    };

    eprintln!("{} Parsing schema: {}", "→".cyan(), input.schema.display());
    let parser = SwaggerParser::from_file(&input.schema)
        .context("Failed to load schema")?
        .with_hints(hints);
    let mut session = parser.parse().context("Failed to compile schema")?;
    let info = &parser.spec().info;
    let title = format!("{} {}", info.title, info.version).trim().to_string();
    debug!(
        classes = session.graph.len(),
        operations = session.operation_count(),
        "schema compiled"
    );

    eprintln!("{} Analyzing operations...", "→".cyan());
    let analysis = ModelAnalyzer::new()
        .analyze(&mut session)
        .context("Failed to analyze schema")?;

    Ok(Compiled {
        title,
        session,
        analysis,
    })
}

fn inspect_command(input: &SchemaArgs, verbose: bool) -> Result<()> {
    let Compiled {
        title,
        session,
        analysis,
    } = compile(input)?;

    println!("\n{}", "✓ Compilation successful!".green().bold());
    if !title.is_empty() {
        println!("  Schema: {}", title.yellow());
    }
    println!("  Classes: {}", session.graph.iter().filter(|c| c.defined).count());
    println!("  Operations: {}", session.operation_count());
    println!("  Synthesized: {}", analysis.synthesized.len());
    println!("  Free queries: {}", session.queries.len());
    println!(
        "  Overall confidence: {:.2}",
        analysis.overall_confidence()
    );

    println!("\n{}", "Units:".bold());
    for unit in &session.units {
        println!(
            "  • {} ({} classes)",
            unit.module_name().cyan(),
            unit.classes.len()
        );
        if verbose {
            for id in &unit.classes {
                let class = session.class(*id);
                println!("      {} [{} ops]", class.key, class.operations.len());
            }
        }
    }

    if !session.diagnostics.is_empty() {
        println!(
            "\n{} {} diagnostics",
            "⚠".yellow(),
            session.diagnostics.len()
        );
        if verbose {
            for diagnostic in &session.diagnostics {
                println!("  - {diagnostic}");
            }
        }
    }

    if !analysis.warnings.is_empty() {
        println!(
            "{} {} ownership decisions need review (see `kubemodel report`)",
            "⚠".yellow(),
            analysis.warnings.len()
        );
    }

    Ok(())
}

fn report_command(input: &SchemaArgs, output: Option<&Path>) -> Result<()> {
    let compiled = compile(input)?;
    let report = compiled
        .analysis
        .to_report(&compiled.session)
        .context("Failed to render report")?;

    match output {
        Some(path) => {
            fs::write(path, report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("{} Report written to {}", "✓".green(), path.display());
        }
        None => print!("{report}"),
    }

    Ok(())
}

fn generate_command(input: &SchemaArgs, output: &Path, verbose: bool) -> Result<()> {
    let compiled = compile(input)?;

    if verbose {
        println!("  Output: {}", output.display());
    }

    println!("{} Generating model files...", "→".cyan());
    let mut generator =
        ModelGenerator::new(&compiled.session).context("Failed to create generator")?;
    if !compiled.title.is_empty() {
        generator = generator.with_title(compiled.title.as_str());
    }
    let written = generator
        .generate_to_directory(output)
        .context("Failed to generate model")?;

    println!("\n{}", "✓ Generation complete!".green().bold());
    println!("\n{}", "Generated files:".bold());
    for path in &written {
        println!("  📄 {}", path.display());
    }
    if !compiled.session.diagnostics.is_empty() {
        println!(
            "\n{} {} diagnostics; run `kubemodel inspect --verbose` to list them",
            "⚠".yellow(),
            compiled.session.diagnostics.len()
        );
    }

    Ok(())
}
