mod cli;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use hive_rounds::config::HiveRoundsConfig;
use hive_rounds::service::{SystemClock, WorkflowService};
use hive_rounds::sites::ConfigSiteDirectory;
use hive_rounds::store::FileStore;
use ui::SessionView;

fn init_tracing(config: &HiveRoundsConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { config.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HiveRoundsConfig::load_from(path)?,
        None => HiveRoundsConfig::load()?,
    };
    init_tracing(&config, cli.verbose);

    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("failed to open store at {}", config.data_dir.display()))?;
    let sites = ConfigSiteDirectory::new(&config.apiaries);
    let service = WorkflowService::new(store, sites, SystemClock, config.rename_policy);
    let view = SessionView::default();

    match cli.command {
        Command::Create {
            apiary,
            name,
            hives,
        } => {
            let session = service.create(&apiary, &name, &hives)?;
            view.print_session(&session);
        }
        Command::List => {
            for session in service.list()? {
                view.print_summary(&session);
            }
        }
        Command::Show { session } => {
            let session = service.load(session)?;
            view.print_session(&session);
            view.print_current(&session);
        }
        Command::Rename { session, name } => {
            let session = service.rename(session, &name)?;
            view.print_summary(&session);
        }
        Command::Reorder { session, orders } => {
            let session = service.reorder(session, &orders)?;
            view.print_session(&session);
        }
        Command::Start { session } => {
            let session = service.start(session)?;
            view.print_current(&session);
        }
        Command::Complete { session, record } => {
            let (session, _) = service.complete_current_visit(session, &record)?;
            view.print_current(&session);
        }
        Command::Skip { session } => {
            let (session, _) = service.skip_current_visit(session)?;
            view.print_current(&session);
        }
        Command::CancelVisit { session, entry } => {
            let session = service.cancel_visit(session, entry)?;
            view.print_current(&session);
        }
        Command::Finish { session, outcome } => {
            let session = service.finish(session, outcome.into())?;
            view.print_summary(&session);
        }
        Command::Progress { session } => {
            let progress = service.progress(session)?;
            view.print_progress(&progress);
        }
    }

    Ok(())
}
