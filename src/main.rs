//! Command-line harness for the parent dashboard.
//!
//! Loads a dashboard for a parent, follows its announcement feed, submits
//! profile setup, and shows the game welcome screen, against either a
//! Firebase Realtime Database or seeded in-memory data.

mod demo;

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tatag_dashboard::config::StoreConfig;
use tatag_dashboard::dashboard::Dashboard;
use tatag_dashboard::dashboard::setup::{IncomeBracket, ProfileForm};
use tatag_dashboard::dashboard::view::DashboardView;
use tatag_dashboard::output::{print_pretty, render_json, render_text};
use tatag_dashboard::store::{FirebaseStore, RealtimeStore};
use tatag_dashboard::welcome::WelcomeScreen;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "tatag-dashboard")]
#[command(about = "Parent dashboard for the Math Tatag learning app", long_about = None)]
struct Cli {
    /// Use built-in sample data instead of the Firebase database
    #[arg(long, global = true)]
    demo: bool,

    /// Output format
    #[arg(long, value_enum, global = true, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the dashboard for a parent
    Dashboard {
        /// Parent record id (defaults to the sample parent with --demo)
        #[arg(long)]
        parent_id: Option<String>,

        /// Show the profile-setup form even if the profile is complete
        #[arg(long, default_value_t = false)]
        needs_setup: bool,

        /// Keep running and print the dashboard again on every announcement change
        #[arg(short, long, default_value_t = false)]
        watch: bool,
    },
    /// Submit the profile-setup form for a parent
    Setup {
        #[arg(long)]
        parent_id: Option<String>,

        #[arg(long)]
        name: String,

        #[arg(long)]
        contact: String,

        /// Household income bracket, 1 (lowest) to 5 (highest)
        #[arg(long, default_value_t = 1)]
        income: usize,
    },
    /// Show the game welcome screen
    Welcome,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/tatag_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("tatag_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info")));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG_JSON").unwrap_or_else(|_| EnvFilter::new("debug")),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    // The welcome screen needs no data, so it never opens a store.
    if let Commands::Welcome = cli.command {
        return print_welcome(cli.format);
    }

    if cli.demo {
        info!("Using in-memory sample data");
        run(Arc::new(demo::seeded_store()), cli.command, cli.format, true).await
    } else {
        let config = StoreConfig::from_env()?;
        info!(database = %config.database_url, "Using Firebase Realtime Database");
        let store = FirebaseStore::from_config(&config);
        run(Arc::new(store), cli.command, cli.format, false).await
    }
}

async fn run<S: RealtimeStore + 'static>(
    store: Arc<S>,
    command: Commands,
    format: Format,
    demo: bool,
) -> Result<()> {
    let dashboard = Dashboard::new(store);

    match command {
        Commands::Dashboard {
            parent_id,
            needs_setup,
            watch,
        } => {
            let parent_id = resolve_parent_id(parent_id, demo)?;
            let session = dashboard.open(&parent_id, needs_setup).await;
            let mut updates = session.watch();
            print_view(&updates.borrow_and_update(), format)?;

            if watch && session.is_live() {
                info!("Watching announcements. Press Ctrl+C to stop.");
                loop {
                    tokio::select! {
                        changed = updates.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            let view = updates.borrow_and_update().clone();
                            print_view(&view, format)?;
                        }
                        _ = tokio::signal::ctrl_c() => {
                            info!("Interrupted");
                            break;
                        }
                    }
                }
            } else if watch {
                warn!("No class announcements to follow for this parent");
            }

            session.close();
        }
        Commands::Setup {
            parent_id,
            name,
            contact,
            income,
        } => {
            let parent_id = resolve_parent_id(parent_id, demo)?;
            let income = IncomeBracket::from_position(income)
                .with_context(|| format!("income must be between 1 and 5, got {income}"))?;

            let mut session = dashboard.open(&parent_id, false).await;
            let form = ProfileForm {
                name,
                contact,
                income,
            };
            session.submit_profile(&form).await?;
            println!("Profile updated!");
            print_view(&session.view(), format)?;
            session.close();
        }
        Commands::Welcome => print_welcome(format)?,
    }

    Ok(())
}

fn resolve_parent_id(parent_id: Option<String>, demo: bool) -> Result<String> {
    match parent_id {
        Some(id) => Ok(id),
        None if demo => Ok(demo::DEMO_PARENT_ID.to_string()),
        None => bail!("--parent-id is required unless --demo is set"),
    }
}

fn print_view(view: &DashboardView, format: Format) -> Result<()> {
    print_pretty(view);
    match format {
        Format::Json => println!("{}", render_json(view)?),
        Format::Text => print!("{}", render_text(view)),
    }
    Ok(())
}

fn print_welcome(format: Format) -> Result<()> {
    let screen = WelcomeScreen::default();
    match format {
        Format::Json => println!("{}", render_json(&screen)?),
        Format::Text => println!(
            "{}\n{}\n[{}] -> {}",
            screen.title,
            screen.quarter_label,
            screen.start_label,
            screen.start_game()
        ),
    }
    Ok(())
}
