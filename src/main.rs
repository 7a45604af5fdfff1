use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::error;

use rikai::config::RikaiConfig;
use rikai::external::{ProcessDatabaseManager, ProcessIngest};
use rikai::frontend;
use rikai::report::{report_json, report_live};
use rikai::rule::{Rule, RuleLoader};

#[derive(ClapParser)]
#[command(name = "rikai")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Detect API misuse patterns in C source via a constraint-matching engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a source file and match every configured rule against it
    Scan {
        /// C source file to analyze
        source: PathBuf,

        /// Path to a TOML config file (defaults to the built-in config)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit results as JSON instead of one line per match
        #[arg(long)]
        json: bool,
    },

    /// Parse one or more rule files without matching against a database
    Check {
        /// Rule file or directory to validate
        path: PathBuf,
    },

    /// Print shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("rikai=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { source, config, json } => run_scan(&source, config.as_deref(), json),
        Commands::Check { path } => run_check(&path),
        Commands::Completions { shell } => run_completions(shell),
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "rikai", &mut io::stdout());
}

fn load_config(path: Option<&std::path::Path>) -> RikaiConfig {
    match path {
        Some(path) => RikaiConfig::load(path).unwrap_or_else(|e| {
            eprintln!("failed to load config {}: {e}", path.display());
            process::exit(1);
        }),
        None => RikaiConfig::default_config(),
    }
}

fn run_scan(source: &std::path::Path, config_path: Option<&std::path::Path>, json: bool) {
    let config = load_config(config_path);
    let ingest = ProcessIngest::new(&config.rikai.ingest_path);
    let manager = ProcessDatabaseManager::new(
        &config.rikai.ingest_path,
        config.typedb.hostname.clone(),
        config.typedb.port,
    );

    let matches = frontend::analyze(&config, &ingest, &manager, source).unwrap_or_else(|e| {
        error!(error = %e, "analysis failed");
        eprintln!("analysis failed: {e}");
        process::exit(1);
    });

    if json {
        match report_json(&matches) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("failed to render report: {e}");
                process::exit(1);
            }
        }
    } else {
        for line in report_live(&matches) {
            println!("{line}");
        }
    }
}

fn run_check(path: &std::path::Path) {
    let mut had_error = false;
    let targets: Vec<(PathBuf, String)> = if path.is_dir() {
        RuleLoader::load_dir(path)
            .into_iter()
            .filter_map(|(p, outcome)| match outcome {
                Ok(_) => None,
                Err(e) => Some((p, e.to_string())),
            })
            .collect()
    } else {
        let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("{}: {e}", path.display());
            process::exit(1);
        });
        match Rule::from_yaml(&text) {
            Ok(_) => Vec::new(),
            Err(e) => vec![(path.to_path_buf(), e.to_string())],
        }
    };

    for (path, message) in &targets {
        eprintln!("{}: {message}", path.display());
        had_error = true;
    }

    if had_error {
        process::exit(1);
    }
    println!("ok");
}
