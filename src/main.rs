use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use hardlink_client::api::HttpApi;
use hardlink_client::config::{self, ClientConfig};
use hardlink_client::confirm::{AutoConfirm, ConfirmationGate, PromptGate};
use hardlink_client::duplicates::{self, ConversionVerdict};
use hardlink_client::executor::{SequentialExecutor, WorkItem};
use hardlink_client::job_monitor::{JobMonitor, MonitorHandle, MonitorOutcome, ProgressSnapshot};
use hardlink_client::logging;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "hardlink-client")]
#[command(about = "Drive duplicate scans and hardlink creation on a Hardlink UI server", long_about = None)]
struct Cli {
    /// Server base URL (overrides serverUrl from the config file)
    #[arg(long, global = true, env = "HARDLINK_SERVER_URL")]
    server: Option<String>,
    /// Session cookie value (overrides sessionCookie from the config file)
    #[arg(long, global = true, env = "HARDLINK_SESSION")]
    cookie: Option<String>,
    /// minimal, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a duplicate scan and print the groups found
    Scan,
    /// Create hardlinks for each path inside a destination folder.
    /// Paths ending in '/' are folders and are linked recursively.
    Link {
        destination: String,
        #[arg(required = true)]
        paths: Vec<String>,
        /// Confirm every folder without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Run a duplicate scan, then replace every duplicate with a hardlink to its master
    Convert {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config().context("Failed to load config")?;
    apply_overrides(&mut config, &cli);

    if let Err(e) = logging::init_logging(&config.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let api = HttpApi::from_config(&config)?;
    info!(server = %api.base_url(), "Using server");

    match cli.command {
        Commands::Scan => {
            scan(api, &config).await?;
        }
        Commands::Link {
            destination,
            paths,
            yes,
        } => {
            let items: Vec<WorkItem> = paths.iter().map(|path| parse_item(path)).collect();
            let created = if yes {
                link(api, AutoConfirm::proceed(), &items, &destination).await
            } else {
                link(api, PromptGate::stdio(), &items, &destination).await
            };
            if !created {
                bail!("Some hardlinks could not be created");
            }
        }
        Commands::Convert { yes } => {
            let Some(snapshot) = scan(api.clone(), &config).await? else {
                return Ok(());
            };
            let response = if yes {
                duplicates::convert_duplicates(&api, &mut AutoConfirm::proceed(), &snapshot.results)
                    .await?
            } else {
                duplicates::convert_duplicates(&api, &mut PromptGate::stdio(), &snapshot.results)
                    .await?
            };
            if let Some(response) = response {
                println!(
                    "{} hardlinks created, {} saved",
                    response.created,
                    duplicates::human_size(response.bytes_saved)
                );
                for error in &response.errors {
                    println!("  {}", error);
                }
                if response.verdict() == ConversionVerdict::NothingCreated {
                    bail!("No hardlinks were created");
                }
            }
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut ClientConfig, cli: &Cli) {
    if let Some(server) = &cli.server {
        config.server_url = server.clone();
    }
    if let Some(cookie) = &cli.cookie {
        config.session_cookie = Some(cookie.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
}

fn parse_item(path: &str) -> WorkItem {
    if path.len() > 1 && path.ends_with('/') {
        WorkItem::container(path)
    } else {
        WorkItem::leaf(path)
    }
}

/// Returns the completed snapshot, or `None` when cancelled with Ctrl-C
async fn scan(api: HttpApi, config: &ClientConfig) -> anyhow::Result<Option<ProgressSnapshot>> {
    let monitor = JobMonitor::with_policy(api, config.monitor.poll_policy());

    let handle = MonitorHandle::new();
    let ctrl_c = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let (job_id, outcome) = monitor
        .start_and_monitor(&handle, |snapshot| {
            if !snapshot.is_terminal() {
                eprint!(
                    "\rScanning {}% ({}/{} files, {} groups)",
                    snapshot.percent(),
                    snapshot.processed,
                    snapshot.total,
                    snapshot.groups_found
                );
            }
        })
        .await?;
    eprintln!();

    let snapshot = match outcome {
        MonitorOutcome::Cancelled => {
            warn!(job_id = %job_id, "Scan monitoring cancelled");
            return Ok(None);
        }
        MonitorOutcome::Finished(snapshot) => snapshot,
    };

    if let Some(message) = snapshot.failure_message() {
        bail!("{}", message);
    }

    if snapshot.results.is_empty() {
        println!("No duplicates found");
    } else {
        for group in &snapshot.results {
            println!("{} ({})", group.master, duplicates::human_size(group.size));
            for other in &group.others {
                println!("  = {}", other);
            }
        }
        println!(
            "{} groups, potential space saved: {}",
            snapshot.results.len(),
            duplicates::human_size(duplicates::potential_savings(&snapshot.results))
        );
    }
    Ok(Some(snapshot))
}

/// Returns true when every item succeeded
async fn link<G: ConfirmationGate>(
    api: HttpApi,
    gate: G,
    items: &[WorkItem],
    destination: &str,
) -> bool {
    let mut executor = SequentialExecutor::new(api, gate);
    let outcome = executor.run(items, destination).await;

    println!("{}", outcome.summary());
    for failure in &outcome.failures {
        println!("  {}", failure);
    }
    for skipped in &outcome.skipped {
        println!("  skipped {}", skipped);
    }
    outcome.is_clean()
}
