use avs_core::*;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "avsx")]
#[command(about = "Adrenal vein sampling interpretation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a case file and print the findings
    Interpret {
        /// Case file (.json or .toml)
        case: PathBuf,

        /// Evaluate only this phase (pre, post, both)
        #[arg(long)]
        phase: Option<String>,

        /// Emit the full evaluation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a case file and write the CSV report
    Export {
        /// Case file (.json or .toml)
        case: PathBuf,

        /// Exact path for the report file
        #[arg(long, conflicts_with = "out_dir")]
        out: Option<PathBuf>,

        /// Directory to place the report in
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Evaluate only this phase (pre, post, both)
        #[arg(long)]
        phase: Option<String>,
    },

    /// Print a starter case file
    Template {
        /// Template format (json, toml)
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

fn main() {
    // Initialize logging
    avs_core::logging::init();

    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        for row in error_rows(&error) {
            eprintln!("{}: {}", row.key, row.value);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Interpret { case, phase, json } => cmd_interpret(case, phase, json, &config),
        Commands::Export {
            case,
            out,
            out_dir,
            phase,
        } => cmd_export(case, out, out_dir, phase, &config),
        Commands::Template { format } => cmd_template(&format),
    }
}

fn cmd_interpret(
    case_path: PathBuf,
    phase: Option<String>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let mut case = load_case(&case_path)?;
    apply_phase_override(&mut case, phase);

    let evaluation = evaluate_case(&case, &config.limits)?;
    tracing::debug!("Evaluated {} phase(s)", evaluation.phases.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
        return Ok(());
    }

    display_rows(&result_rows(&evaluation));
    Ok(())
}

fn cmd_export(
    case_path: PathBuf,
    out: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    phase: Option<String>,
    config: &Config,
) -> Result<()> {
    let mut case = load_case(&case_path)?;
    apply_phase_override(&mut case, phase);

    let evaluation = evaluate_case(&case, &config.limits)?;
    let report = render_report(&evaluation)?;

    let path = match out {
        Some(path) => path,
        None => {
            let dir = out_dir.unwrap_or_else(|| config.export.report_dir.clone());
            dir.join(report_filename(&evaluation.case.meta))
        }
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&path, report)?;

    println!("✓ Report written to {}", path.display());
    for phase in &evaluation.phases {
        println!("  {} phase: {}", phase.phase, phase.classification.conclusion);
    }

    Ok(())
}

fn cmd_template(format: &str) -> Result<()> {
    let format = match format.parse::<TemplateFormat>() {
        Ok(format) => format,
        Err(_) => {
            eprintln!("Unknown template format: {}. Using TOML.", format);
            TemplateFormat::Toml
        }
    };

    println!("{}", template(format)?);
    Ok(())
}

fn apply_phase_override(case: &mut CaseInput, phase: Option<String>) {
    if let Some(raw) = phase {
        match raw.parse::<PhaseSelection>() {
            Ok(selection) => case.phases = selection,
            Err(_) => {
                eprintln!(
                    "Unknown phase: {}. Using the case file's phase selection.",
                    raw
                );
            }
        }
    }
}

fn display_rows(rows: &[DisplayRow]) {
    for row in rows {
        if row.is_header() {
            println!();
            println!("── {} {}", row.key, padding(&row.key));
        } else {
            println!("  {}: {}", row.key, row.value);
        }
    }
    println!();
}

fn padding(key: &str) -> String {
    const WIDTH: usize = 40;
    "─".repeat(WIDTH.saturating_sub(key.chars().count()))
}
