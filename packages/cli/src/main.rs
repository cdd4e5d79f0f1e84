use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use krepis_consistency::{
    create, CheckerConfig, ConsistencyChecker, ErrorKind, LitmusGraph, LitmusTest, ModelType,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Krepis consistency checker
/// Runs litmus executions through the memory-model checkers
#[derive(Parser)]
#[command(name = "krepis-check", version)]
#[command(about = "Check litmus executions against memory models", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report consistency, violated axioms and errors per model
    Check {
        /// Litmus files (JSON)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Only this model (default: every model)
        #[arg(short, long)]
        model: Option<ModelType>,
    },
    /// List the writes a read may observe
    Stores {
        /// Litmus file (JSON)
        file: PathBuf,
        /// Id of the read
        #[arg(short, long)]
        read: String,
        /// Memory model
        #[arg(short, long, default_value = "rc11")]
        model: ModelType,
    },
    /// List supported models
    Models,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load(path: &Path) -> Result<(LitmusTest, LitmusGraph)> {
    let test = LitmusTest::load(path).with_context(|| format!("loading {}", path.display()))?;
    let built = test
        .build()
        .with_context(|| format!("building {}", test.name))?;
    Ok((test, built))
}

/// Returns the number of verdicts that differ from the file's expectations
fn check_file(path: &Path, only: Option<ModelType>) -> Result<usize> {
    let (test, built) = load(path)?;
    println!("{}", test.name);

    let models: Vec<ModelType> = only.map_or_else(|| ModelType::ALL.to_vec(), |m| vec![m]);
    let mut mismatches = 0;
    for model in models {
        let checker = create(&CheckerConfig::new(model));
        let mut g = built.graph.clone();
        checker.update_all_views(&mut g);

        let consistent = checker.is_graph_consistent(&g);
        let verdict = match checker.first_violation(&g) {
            None => "consistent".to_string(),
            Some(axiom) => format!("violates {axiom}"),
        };
        let expected = test.expect.get(&model).copied();
        let marker = match expected {
            Some(e) if e != consistent => {
                mismatches += 1;
                "  (UNEXPECTED)"
            }
            _ => "",
        };
        println!("  {model:<5} {verdict}{marker}");

        let mut seen: HashSet<ErrorKind> = HashSet::new();
        let events: Vec<_> = g.labels().map(|l| l.pos()).filter(|e| !e.is_init()).collect();
        for e in events {
            if let Err(err) = checker.check_errors(&g, e) {
                println!("        error: {err}");
            }
            for warning in checker.check_warnings(&g, e, &seen) {
                println!("        warning: {warning}");
                seen.insert(warning.kind());
            }
        }
        debug!(model = %model, consistent, "checked");
    }
    Ok(mismatches)
}

fn list_stores(path: &Path, read: &str, model: ModelType) -> Result<()> {
    let (_, built) = load(path)?;
    let Some(e) = built.event(read) else {
        bail!("no event with id {read:?}");
    };
    if !built.graph.label(e).is_read() {
        bail!("{read:?} is not a read");
    }

    let checker = create(&CheckerConfig::new(model));
    let mut g = built.graph.clone();
    checker.update_all_views(&mut g);
    for w in checker.coherent_stores(&g, e) {
        println!("{}", built.name_of(w).unwrap_or("?"));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!(version = krepis_consistency::VERSION, "krepis-check");

    match cli.command {
        Commands::Check { files, model } => {
            let mut mismatches = 0;
            for file in &files {
                mismatches += check_file(file, model)?;
            }
            if mismatches > 0 {
                bail!("{mismatches} verdict(s) differ from expectations");
            }
        }
        Commands::Stores { file, read, model } => list_stores(&file, &read, model)?,
        Commands::Models => {
            for model in ModelType::ALL {
                let relinche = if model.supports_relinche() { "  relinche" } else { "" };
                let deps = if model.is_dep_tracking() { "  dep-tracking" } else { "" };
                println!("{model}{deps}{relinche}");
            }
        }
    }

    Ok(())
}
