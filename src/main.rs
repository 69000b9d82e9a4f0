//! versions CLI - Command line interface for versions_db
//!
//! Records, lists, and restores versions of individual files.
//! Output is JSON so the tool can be wrapped by other programs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use versions_db::{AddError, Config, Repository, VersionRecord};

#[derive(Parser)]
#[command(name = "versions")]
#[command(about = "A content-addressed version store for individual files")]
#[command(version)]
struct Cli {
    /// Path to the repository directory [default: $VERSIONS_REPO, settings file, or .versions]
    #[arg(short, long)]
    repo: Option<PathBuf>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new repository
    Init,

    /// Record the current content of a file as a new version
    Add {
        /// The file to version
        file: String,
        /// Comment describing this version
        #[arg(default_value = "")]
        comment: String,
    },

    /// List recorded versions
    List {
        /// Only show versions of this file
        file: Option<String>,
    },

    /// Restore a version of a file
    Get {
        /// The versioned file
        file: String,
        /// Version number (1 is the first version)
        version: u32,
        /// Write to this path instead of over the file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that every version can be restored
    Verify,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match Config::resolve(cli.repo.clone()) {
        Ok(config) => config,
        Err(e) => fail(&cli.format, e.code(), &e),
    };

    match cli.command {
        Commands::Init => {
            let repo = match Repository::init(config.clone()) {
                Ok(repo) => repo,
                Err(e) => fail(&cli.format, e.code(), &e),
            };
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "hasher": repo.hash_algorithm(),
                    "message": format!("Initialized repository at {}", config.root.display())
                }),
            );
        }

        Commands::Add { file, comment } => {
            let repo = match Repository::open_or_init(config) {
                Ok(repo) => repo,
                Err(e) => fail(&cli.format, e.code(), &e),
            };
            match repo.add(&file, &comment) {
                Ok(record) => {
                    let mut value = record_json(&record);
                    value["status"] = "ok".into();
                    output(&cli.format, &value);
                }
                Err(AddError::AlreadyExists(existing)) => {
                    let mut value = record_json(&existing);
                    value["status"] = "already_exists".into();
                    output(&cli.format, &value);
                }
                Err(e) => fail(&cli.format, e.code(), &e),
            }
        }

        Commands::List { file } => {
            let repo = open_repo(&cli.format, config);
            let records = match repo.list(file.as_deref()) {
                Ok(records) => records,
                Err(e) => fail(&cli.format, e.code(), &e),
            };
            let mut items = Vec::new();
            for record in records {
                match record {
                    Ok(record) => items.push(record_json(&record)),
                    Err(e) => fail(&cli.format, e.code(), &e),
                }
            }
            output(
                &cli.format,
                &serde_json::json!({
                    "count": items.len(),
                    "versions": items
                }),
            );
        }

        Commands::Get {
            file,
            version,
            output: destination,
        } => {
            let repo = open_repo(&cli.format, config);
            let result = match destination {
                Some(dest) => repo.get_to(&file, version, dest),
                None => repo.get(&file, version),
            };
            match result {
                Ok(path) => output(
                    &cli.format,
                    &serde_json::json!({
                        "status": "ok",
                        "filename": file,
                        "version": version,
                        "path": path.display().to_string()
                    }),
                ),
                Err(e) => fail(&cli.format, e.code(), &e),
            }
        }

        Commands::Verify => {
            let repo = open_repo(&cli.format, config);
            let report = match repo.verify() {
                Ok(report) => report,
                Err(e) => fail(&cli.format, e.code(), &e),
            };
            output(
                &cli.format,
                &serde_json::json!({
                    "status": if report.is_consistent() { "ok" } else { "corrupt_store" },
                    "hasher": repo.hash_algorithm(),
                    "records": report.records,
                    "blobs": report.blobs,
                    "missing": report.missing.iter().map(record_json).collect::<Vec<_>>(),
                    "orphans": report.orphans.iter().map(|d| d.to_hex()).collect::<Vec<_>>()
                }),
            );
            if !report.is_consistent() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn open_repo(format: &OutputFormat, config: Config) -> Repository {
    match Repository::open(config) {
        Ok(repo) => repo,
        Err(e) => fail(format, e.code(), &e),
    }
}

fn record_json(record: &VersionRecord) -> serde_json::Value {
    serde_json::json!({
        "filename": record.filename,
        "version": record.version,
        "sequence": record.sequence,
        "digest": record.digest.to_hex(),
        "comment": record.comment,
        "timestamp": record.timestamp
    })
}

fn fail(format: &OutputFormat, kind: &str, error: &dyn std::fmt::Display) -> ! {
    output(
        format,
        &serde_json::json!({
            "status": "error",
            "kind": kind,
            "message": error.to_string()
        }),
    );
    std::process::exit(1);
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Text => serde_json::to_string_pretty(value),
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("failed to render output: {}", e),
    }
}
