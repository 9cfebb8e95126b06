use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use rclone_db_backup::config::{self, BackupJobConfig};
use rclone_db_backup::managers::logging::{init_console_logging, init_logging, LoggingConfig};
use rclone_db_backup::managers::scheduler::run_daemon;
use rclone_db_backup::utils::cron::CronSchedule;
use rclone_db_backup::utils::executor::RealExecutor;
use rclone_db_backup::BackupPipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "rclone-db-backup")]
#[command(about = "Scheduled MySQL dumps uploaded with rclone", long_about = None)]
#[command(version)]
struct Cli {
    /// Optional TOML configuration file (environment variables take precedence)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up now, then on every cron occurrence (default)
    Daemon,

    /// Run a single backup cycle and exit
    Once,

    /// Validate configuration and schedule, and check the external tools
    Validate,

    /// Show upcoming scheduled runs
    Next {
        /// Number of occurrences to show
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_console_logging();
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Must stay alive until exit so buffered file logs get flushed
    let log_guard = init_logging(&LoggingConfig::from_settings(&config.logging))?;

    let schedule = match CronSchedule::from_config(&config.schedule) {
        Ok(schedule) => schedule,
        Err(e) => {
            error!("{}", e);
            drop(log_guard);
            std::process::exit(1);
        }
    };

    let config = Arc::new(config);

    match cli.command.unwrap_or(Commands::Daemon) {
        Commands::Daemon => {
            info!("Backup service started");
            let pipeline = Arc::new(BackupPipeline::new(
                config.clone(),
                Box::new(RealExecutor::new()),
            ));
            let completed = run_daemon(pipeline, schedule, shutdown_signal()).await;
            info!("Backup service stopped after {} cycle(s)", completed);
        }

        Commands::Once => {
            let pipeline = BackupPipeline::new(config.clone(), Box::new(RealExecutor::new()));
            let report = tokio::task::spawn_blocking(move || pipeline.run_cycle()).await?;
            if !report.succeeded() {
                drop(log_guard);
                std::process::exit(1);
            }
        }

        Commands::Validate => {
            if !handle_validate(&config, &schedule) {
                drop(log_guard);
                std::process::exit(1);
            }
        }

        Commands::Next { count } => {
            println!(
                "Schedule '{}' in {}:",
                schedule.expression(),
                schedule.zone_name()
            );
            for at in schedule.upcoming(Utc::now(), count) {
                println!("  {}", at.to_rfc3339());
            }
        }
    }

    drop(log_guard);
    Ok(())
}

/// Print a configuration summary; false if a required tool is missing
fn handle_validate(config: &BackupJobConfig, schedule: &CronSchedule) -> bool {
    println!("=== Configuration ===\n");
    println!(
        "Database:   {}",
        config
            .database
            .name
            .as_deref()
            .unwrap_or("(all databases)")
    );
    println!(
        "User:       {}",
        config.database.user.as_deref().unwrap_or("(default)")
    );
    println!(
        "Remote:     {}:{}",
        config.remote.alias, config.remote.directory
    );
    println!("Staging:    {}", config.staging_dir.display());
    println!("Retention:  {} backup(s)", config.retain_count);
    println!(
        "Schedule:   '{}' in {}",
        schedule.expression(),
        schedule.zone_name()
    );
    if let Some(next) = schedule.next_after(Utc::now()) {
        println!("Next run:   {}", next.to_rfc3339());
    }

    println!("\n=== Tools ===\n");
    let mut all_found = true;
    for program in [
        &config.tools.mysqldump,
        &config.tools.gzip,
        &config.tools.rclone,
    ] {
        match which::which(program) {
            Ok(path) => println!("✓ {} ({})", program, path.display()),
            Err(_) => {
                println!("✗ {} not found in PATH", program);
                all_found = false;
            }
        }
    }

    if all_found {
        println!("\n✓ Configuration is valid");
    } else {
        eprintln!("\n⚠️  Some required tools are missing");
    }
    all_found
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}
