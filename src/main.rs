//! Admin Log Backup - recover deleted messages and media from a group's admin log.
//!
//! QUICK START:
//!   admin-log-backup init-config                          # Write default config
//!   admin-log-backup export -g <group> -e log.json        # Back up the whole group
//!   admin-log-backup export -g <group> -t "[3, 7]" -e ... # One folder per thread
//!   admin-log-backup groups                               # See what has been backed up
//!   admin-log-backup show -g <group> -t 3 --last 20       # Inspect a thread's dump

mod cli;

use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use admin_log_backup::application::{
    format_groups, format_pass_report, format_records_json, format_records_table,
    format_summary, run_export, OutputFormat, PassOptions,
};
use admin_log_backup::domain::{self, AppConfig, AppError, ExportRequest};
use admin_log_backup::infrastructure::{
    dump_path, ensure_config_exists, list_groups, load_config, load_records, scope_dir,
    ReplaySource, ViewerCredentials,
};
use cli::{parse_format, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> domain::Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);

    if matches!(cli.command, Commands::InitConfig) {
        return cmd_init_config(&config_path);
    }

    let mut config = load_config(&config_path);
    if let Some(dir) = cli.backup_dir.clone() {
        config.export.backup_dir = dir;
    }

    let request = cli.command.export_request();

    match cli.command {
        Commands::Export {
            events,
            media_dir,
            page_size,
            pacing_ms,
            ..
        } => {
            let request = request
                .unwrap_or_else(|| Err("Missing export arguments".to_string()))
                .map_err(|message| AppError::InvalidData { message })?;

            if let Some(size) = page_size {
                config.export.page_size = size;
            }
            if let Some(ms) = pacing_ms {
                config.export.pacing_ms = ms;
            }
            cmd_export(request, &events, media_dir, &config).await?;
        }
        Commands::Groups => cmd_groups(&config)?,
        Commands::Show {
            group,
            thread,
            last,
            format,
        } => {
            let format = parse_format(&format).map_err(|message| AppError::Config { message })?;
            cmd_show(&config, group, thread, last, format).await?;
        }
        Commands::InitConfig => {}
    }

    Ok(())
}

/// Export command: one pass per selected thread.
async fn cmd_export(
    request: ExportRequest,
    events: &Path,
    media_dir: Option<PathBuf>,
    config: &AppConfig,
) -> domain::Result<()> {
    let scopes = request.into_scopes()?;

    let mut source = ReplaySource::open(events).await?;
    if let Some(dir) = media_dir {
        source = source.with_media_root(dir);
    }

    let backup_dir = &config.export.backup_dir;
    let options = PassOptions::from(config);

    if let Some(first) = scopes.first() {
        println!(
            "Backup will be saved to folder: {}",
            scope_dir(backup_dir, first.group_id, 0).display()
        );
        if first.filter_user_id == 0 {
            println!("No user filter applied - keeping messages deleted by anyone");
        } else {
            println!("Filtering messages deleted by user ID: {}", first.filter_user_id);
        }
        println!(
            "Mode: {} | page size: {} | pacing: {:?}",
            first.mode, options.page_size, options.pacing
        );
        println!();
    }

    let summary = run_export(&source, &scopes, backup_dir, options, |scope, result| {
        match result {
            Ok(report) => println!("{}", format_pass_report(scope, report)),
            Err(e) => eprintln!(
                "{} thread {}: {}",
                "✗".red().bold(),
                scope.thread_id,
                e
            ),
        }
    })
    .await;

    println!();
    println!("{}", format_summary(&summary));

    Ok(())
}

/// List backed-up groups and threads.
fn cmd_groups(config: &AppConfig) -> domain::Result<()> {
    let backup_dir = &config.export.backup_dir;
    let groups = list_groups(backup_dir, &config.viewer.credentials_file)?;

    println!("{}", format_groups(&groups));

    let credentials = ViewerCredentials::load(&config.viewer.credentials_file);
    if credentials.is_default() {
        println!(
            "{} Viewer login is the default admin/admin; set {} to change it",
            "⚠".yellow(),
            config.viewer.credentials_file.display()
        );
    }

    Ok(())
}

/// Show the dump of a group or thread.
async fn cmd_show(
    config: &AppConfig,
    group: i64,
    thread: i64,
    last: Option<usize>,
    format: OutputFormat,
) -> domain::Result<()> {
    let path = dump_path(&scope_dir(&config.export.backup_dir, group, thread));
    if !path.is_file() {
        return Err(AppError::InvalidData {
            message: format!("No backup found at {}", path.display()),
        });
    }

    let mut records = load_records(&path).await?;

    // Apply --last filter if specified
    if let Some(n) = last {
        let len = records.len();
        if n < len {
            records.drain(..len - n);
        }
    }

    let output = match format {
        OutputFormat::Table => format_records_table(&records),
        OutputFormat::Json => format_records_json(&records).map_err(AppError::json_parse)?,
    };

    println!("{output}");
    Ok(())
}

/// Create the default configuration file.
fn cmd_init_config(path: &Path) -> domain::Result<()> {
    if ensure_config_exists(path)? {
        println!("{} Created {}", "✓".green().bold(), path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
    }
    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
