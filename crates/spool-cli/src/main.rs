//! spoolsync CLI
//!
//! Fetches filament data from a Spoolman-compatible inventory service and
//! keeps slicer filament config files in sync with it.

mod cli;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use spool_core::{ReconciliationEngine, SyncConfig, SyncSummary, UpdateLoop};
use spool_inventory::InventoryClient;

use cli::Cli;
use error::{Error, Result};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !cli.dir.is_dir() {
        return Err(Error::MissingOutputDir {
            path: cli.dir.clone(),
        });
    }

    let slicer = cli.slicer();
    let template_root = cli.template_root();
    let template_dir = template_root.join(slicer.template_dir_name());
    if !template_dir.is_dir() {
        eprintln!(
            "No templates found in {:?}.\n\n\
             Install them with:\n\n  \
             mkdir -p {:?}\n  \
             cp -r templates-* {:?}\n",
            template_dir, template_root, template_root
        );
        return Err(Error::MissingTemplates { path: template_dir });
    }
    tracing::debug!(dir = %template_dir.display(), "reading templates");

    let config = SyncConfig {
        output_dir: cli.dir.clone(),
        slicer,
        inventory_url: cli.url.clone(),
        template_root,
        variants: cli.variants.clone(),
        delete_all: cli.delete_all,
        additive_only: cli.additive_only,
        per_spool: cli.per_spool(),
    };

    let client = InventoryClient::new(&cli.url)?;
    let engine = ReconciliationEngine::new(config, client.clone())?;
    let mut update = UpdateLoop::new(engine);

    if cli.updates {
        run_continuous(&mut update, &client).await
    } else {
        let summary = update.run_once().await?;
        print_summary(&summary);
        Ok(())
    }
}

async fn run_continuous(
    update: &mut UpdateLoop<InventoryClient>,
    client: &InventoryClient,
) -> Result<()> {
    let (events_tx, events_rx) = tokio::sync::mpsc::channel(64);
    let subscription = client.subscribe(move |event| {
        // A full queue already guarantees a pending resync; dropping the
        // event loses nothing.
        let _ = events_tx.try_send(event);
    })?;

    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stop requested, finishing current cycle");
            let _ = stop_tx.send(true);
        }
    });

    println!(
        "{} waiting for inventory updates (ctrl-c to stop)",
        "spoolsync".green().bold()
    );
    let result = update.run_continuous(events_rx, stop_rx).await;
    subscription.close().await;
    Ok(result?)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_summary(summary: &SyncSummary) {
    println!(
        "{} {} created, {} updated, {} deleted, {} unchanged",
        "sync:".green().bold(),
        summary.created,
        summary.updated,
        summary.deleted,
        summary.unchanged
    );
    for issue in &summary.errors {
        match &issue.path {
            Some(path) => eprintln!(
                "  {} {}: {}",
                "failed".red().bold(),
                path.display(),
                issue.message
            ),
            None => eprintln!("  {} {}", "failed".red().bold(), issue.message),
        }
    }
}
