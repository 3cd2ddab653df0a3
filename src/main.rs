use anyhow::Result;
use clap::Parser;
use std::path::Path;

use edclub_enricher::cli::{Cli, Commands};
use edclub_enricher::config::{AppConfig, ConfigError};
use edclub_enricher::logger::{ProgressLogger, VerbosityLevel};
use edclub_enricher::name_resolver::{BrowserResolver, NameResolver};
use edclub_enricher::pipeline::{self, BrowserNamePhase, NamePhase, ValidatePhase, WaybackPhase};
use edclub_enricher::remote::{RemoteRow, RemoteStore};
use edclub_enricher::source::load_subdomains;
use edclub_enricher::store::JsonStore;
use edclub_enricher::validator::DomainValidator;
use edclub_enricher::wayback::WaybackClient;
use edclub_enricher::worker::Worker;

/// Rows per upsert window during the one-shot migration.
const MIGRATE_WINDOW: usize = 100;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Handle --init before any other processing
    if cli.init {
        match AppConfig::create_default_config() {
            Ok(path) => {
                println!("Created default configuration file at: {}", path.display());
                println!("Edit this file to customize settings, then run edclub-enricher again.");
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        }
    }

    let Some(command) = cli.command else {
        eprintln!("No command given. Run with --help for usage.");
        std::process::exit(2);
    };

    let config = load_config(cli.config.as_deref());
    let logger = ProgressLogger::new(VerbosityLevel::from_verbose_count(cli.verbose));

    match command {
        Commands::Import { source } => {
            let subdomains = load_subdomains(Path::new(&source), &config.source.denylist)?;
            logger.info(&format!("Total subdomains: {}", subdomains.len()));

            let mut store = JsonStore::load(&config.store.path)?;
            let added = store.import_subdomains(&subdomains);
            store.persist()?;

            logger.info(&format!("Imported {} new records ({} total)", added, store.len()));
        }

        Commands::Names { browser } => {
            let mut store = JsonStore::load(&config.store.path)?;

            if browser {
                let chrome = edclub_enricher::create_browser()?;
                let phase = BrowserNamePhase {
                    resolver: BrowserResolver::new(&chrome, &config),
                };
                pipeline::run_phase(
                    &mut store,
                    &phase,
                    config.browser.window_size,
                    config.phases.names.window_delay(),
                    &logger,
                )
                .await?;
            } else {
                let resolver = NameResolver::new(&config)?;
                let phase = NamePhase { resolver: &resolver };
                pipeline::run_phase(
                    &mut store,
                    &phase,
                    config.phases.names.window_size,
                    config.phases.names.window_delay(),
                    &logger,
                )
                .await?;
            }
        }

        Commands::Validate => {
            let mut store = JsonStore::load(&config.store.path)?;
            let validator = DomainValidator::new(&config)?;
            let phase = ValidatePhase { validator: &validator };

            pipeline::run_phase(
                &mut store,
                &phase,
                config.phases.validate.window_size,
                config.phases.validate.window_delay(),
                &logger,
            )
            .await?;

            logger.info(&format!("Final stats:\n{}", store.stats()));
        }

        Commands::Wayback => {
            let mut store = JsonStore::load(&config.store.path)?;
            let client = WaybackClient::from_config(&config)?;
            let phase = WaybackPhase {
                client: &client,
                host_domain: config.domains.primary.clone(),
            };

            pipeline::run_phase(
                &mut store,
                &phase,
                config.phases.wayback.window_size,
                config.phases.wayback.window_delay(),
                &logger,
            )
            .await?;
        }

        Commands::Worker => {
            let store = RemoteStore::from_env()?;
            let validator = DomainValidator::new(&config)?;
            let wayback = WaybackClient::from_config(&config)?;

            Worker::new(&store, &validator, &wayback, &config).run().await?;
        }

        Commands::Migrate => {
            migrate(&config, &logger).await?;
        }

        Commands::Stats { remote } => {
            if remote {
                let store = RemoteStore::from_env()?;
                let stats = store.stats().await?;
                println!("{}", stats);
            } else {
                let store = JsonStore::load(&config.store.path)?;
                println!("{}", store.stats());
            }
        }
    }

    Ok(())
}

/// One-shot migration of the file store into the remote table. A failed
/// window is logged and skipped so the remaining rows still land.
async fn migrate(config: &AppConfig, logger: &ProgressLogger) -> Result<()> {
    let store = JsonStore::load(&config.store.path)?;
    let remote = RemoteStore::from_env()?;

    logger.info(&format!("Migrating {} records to the remote store...", store.len()));

    let mut imported = 0;
    for (window_num, window) in store.records.chunks(MIGRATE_WINDOW).enumerate() {
        let rows: Vec<RemoteRow> = window.iter().map(RemoteRow::from_record).collect();

        match remote.upsert(&rows).await {
            Ok(()) => {
                imported += rows.len();
                logger.info(&format!("Imported {}/{}", imported, store.len()));
            }
            Err(e) => {
                logger.info(&format!("Window {} failed: {}", window_num + 1, e));
            }
        }
    }

    logger.info("Migration complete");
    Ok(())
}

fn load_config(explicit_path: Option<&str>) -> AppConfig {
    let result = match explicit_path {
        Some(path) => AppConfig::load_from_path(Path::new(path)),
        None => AppConfig::load(),
    };

    match result {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(path)) if explicit_path.is_none() => {
            // Config not found - prompt to create if interactive
            match AppConfig::prompt_create_config() {
                Ok(Some(created_path)) => {
                    println!("Created default configuration file at: {}", created_path.display());
                    println!("Edit this file to customize settings, then run edclub-enricher again.");
                    std::process::exit(0);
                }
                Ok(None) => {
                    eprintln!("Configuration file not found at: {}", path.display());
                    eprintln!("Run with --init to create a default configuration file.");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Failed to create configuration file: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "edclub_enricher=info",
        1 => "edclub_enricher=debug",
        _ => "trace",
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .try_init();
}
