//! `pulse`: webhook server, batch runner and subscriber admin.
//!
//! Reads `pulse.toml` (or the path given with `--config`) and `PULSE_*`
//! environment variables. Nested keys use `__`, e.g.
//! `PULSE_WHATSAPP__ACCESS_TOKEN`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use pulse_core::subscriber::{Frequency, NewSubscriber};
use pulse_dispatch::{Batch, BatchConfig, Bridge, CommandRouter, DeliveryMode, Dispatcher, Resolver};
use pulse_server::{AppState, ServerConfig, schedule::Schedule};
use pulse_store_sqlite::{CrmMetrics, SqliteStore};
use pulse_whatsapp::WhatsAppClient;
use tokio::{net::TcpListener, sync::mpsc};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Insight delivery over WhatsApp")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "pulse.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the webhook and answer inbound messages.
  Serve,
  /// Deliver insights to every active subscriber once.
  RunOnce {
    /// Use generated sample metrics instead of the CRM.
    #[arg(long)]
    mock:      bool,
    /// Send the pre-approved template instead of free-form text.
    #[arg(long)]
    template:  bool,
    /// Send the dashboard link template instead of the figures.
    #[arg(long, conflicts_with = "template")]
    dashboard: bool,
  },
  /// Run the batch on the configured weekly schedule.
  Schedule {
    #[arg(long)]
    mock: bool,
  },
  /// Manage subscribers.
  #[command(subcommand)]
  Subscriber(SubscriberCommand),
  /// Check the WhatsApp credentials against the API.
  CheckConnection,
}

#[derive(Subcommand)]
#[command(disable_help_subcommand = true)]
enum SubscriberCommand {
  Add {
    phone:     String,
    name:      String,
    #[arg(long, default_value_t = Frequency::Weekly)]
    frequency: Frequency,
    /// Register without including them in deliveries yet.
    #[arg(long)]
    inactive:  bool,
    /// Send the welcome message after registering. Inactive subscribers
    /// receive nothing, so this cannot be combined with `--inactive`.
    #[arg(long, conflicts_with = "inactive")]
    welcome:   bool,
  },
  List {
    /// Only active subscribers.
    #[arg(long)]
    active: bool,
  },
  Deactivate { id: Uuid },
  Reactivate { id: Uuid },
  /// Deactivate the subscriber with this phone and confirm over WhatsApp.
  Unsubscribe { phone: String },
  /// Send the help text to this phone.
  Help { phone: String },
}

type InboundRouter = CommandRouter<SqliteStore, CrmMetrics, WhatsAppClient>;

/// Everything the subcommands need, wired once.
struct Services {
  client:   WhatsAppClient,
  resolver: Resolver<SqliteStore>,
  router:   InboundRouter,
  batch:    Batch<SqliteStore, CrmMetrics, WhatsAppClient>,
}

impl Services {
  async fn build(config: &ServerConfig) -> anyhow::Result<Self> {
    let store_path = expand_tilde(&config.store_path);
    if let Some(parent) = store_path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {parent:?}"))?;
    }
    let store = SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?;
    let store = Arc::new(store);

    let crm = match &config.crm_path {
      Some(path) => {
        let path = expand_tilde(path);
        let crm = CrmMetrics::open(&path)
          .await
          .with_context(|| format!("failed to open CRM database at {path:?}"))?;
        Some(Arc::new(crm))
      }
      None => None,
    };

    let client = WhatsAppClient::new(config.whatsapp.clone())
      .context("failed to build WhatsApp client")?;

    let resolver = Resolver::new(store.clone());
    let bridge = Bridge::new(store, crm);
    let dispatcher = Dispatcher::new(Arc::new(client.clone()));

    Ok(Self {
      client,
      router: CommandRouter::new(resolver.clone(), bridge.clone(), dispatcher.clone()),
      batch: Batch::new(resolver.clone(), bridge, dispatcher),
      resolver,
    })
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("PULSE")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let config: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let services = Services::build(&config).await?;

  match cli.command {
    Command::Serve => serve(config, services).await,
    Command::RunOnce { mock, template, dashboard } => {
      let mut batch_config = config.delivery.batch_config();
      batch_config.mock |= mock;
      if template {
        batch_config.mode = DeliveryMode::Template;
      } else if dashboard {
        batch_config.mode = DeliveryMode::Dashboard;
      }
      run_once(&services, &batch_config).await
    }
    Command::Schedule { mock } => {
      let schedule =
        Schedule::from_config(&config.schedule).context("invalid [schedule] config")?;
      let mut batch_config = config.delivery.batch_config();
      batch_config.mock |= mock;

      let (services, batch_config) = (&services, &batch_config);
      pulse_server::schedule::run_weekly(schedule, move || async move {
        if let Err(e) = run_once(services, batch_config).await {
          tracing::error!(error = %e, "scheduled batch failed");
        }
      })
      .await;
      Ok(())
    }
    Command::Subscriber(command) => subscriber(&services, command).await,
    Command::CheckConnection => {
      let info = services
        .client
        .check_connection()
        .await
        .context("WhatsApp connection check failed")?;
      println!(
        "connected: {}",
        info.display_phone_number.as_deref().unwrap_or("(no display number)")
      );
      Ok(())
    }
  }
}

async fn serve(config: ServerConfig, services: Services) -> anyhow::Result<()> {
  let (events, queue) = mpsc::channel(config.inbound_queue.max(1));
  let worker = tokio::spawn(pulse_server::worker::run(services.router, queue));

  let address = format!("{}:{}", config.host, config.port);
  let app = pulse_server::router(AppState { events, config: Arc::new(config) });

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  worker.await.context("inbound worker panicked")?;

  Ok(())
}

async fn run_once(services: &Services, config: &BatchConfig) -> anyhow::Result<()> {
  let report = services
    .batch
    .run(config)
    .await
    .context("batch delivery aborted")?;

  println!(
    "sent {}, failed {}, skipped {}",
    report.sent_count,
    report.failed_count,
    report.skipped_count()
  );
  for delivery in &report.outcomes {
    println!("{}", serde_json::to_string(delivery)?);
  }
  Ok(())
}

async fn subscriber(services: &Services, command: SubscriberCommand) -> anyhow::Result<()> {
  let resolver = &services.resolver;

  match command {
    SubscriberCommand::Add { phone, name, frequency, inactive, welcome } => {
      let input = NewSubscriber { phone, display_name: name, frequency, active: !inactive };
      let subscriber = resolver.register(input).await.context("failed to add subscriber")?;
      println!("{}", subscriber.subscriber_id);

      if welcome && subscriber.active {
        services
          .router
          .welcome(&subscriber)
          .await
          .context("failed to send welcome message")?;
      }
    }
    SubscriberCommand::List { active } => {
      let subscribers = if active {
        resolver.list_active().await?
      } else {
        resolver.list_all().await?
      };
      for s in subscribers {
        let last_sent = s
          .last_sent_at
          .map_or_else(|| "never".to_owned(), |t| t.to_rfc3339());
        let state = if s.active { "active" } else { "inactive" };
        println!(
          "{}  {:<15}  {:<20}  {:<7}  {:<8}  {last_sent}",
          s.subscriber_id, s.phone, s.display_name, s.frequency.as_str(), state
        );
      }
    }
    SubscriberCommand::Deactivate { id } => {
      if !resolver.deactivate(id).await? {
        anyhow::bail!("no subscriber with id {id}");
      }
    }
    SubscriberCommand::Reactivate { id } => {
      if !resolver.reactivate(id).await? {
        anyhow::bail!("no subscriber with id {id}");
      }
    }
    SubscriberCommand::Unsubscribe { phone } => {
      let subscriber = resolver
        .find_by_phone(&phone)
        .await?
        .with_context(|| format!("no subscriber with phone {phone}"))?;
      services
        .router
        .unsubscribe(&subscriber)
        .await
        .context("failed to unsubscribe")?;
    }
    SubscriberCommand::Help { phone } => {
      let subscriber = resolver.find_by_phone(&phone).await?;
      let name = subscriber.as_ref().map(|s| s.display_name.as_str());
      services
        .router
        .send_help(&phone, name)
        .await
        .context("failed to send help")?;
    }
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("pulse").chain(args.iter().copied()))
  }

  #[test]
  fn welcome_cannot_target_inactive_subscriber() {
    let err = parse(&["subscriber", "add", "0821234567", "Ann", "--inactive", "--welcome"])
      .err()
      .unwrap();
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

    let cli = parse(&["subscriber", "add", "0821234567", "Ann", "--welcome"]).unwrap();
    assert!(matches!(
      cli.command,
      Command::Subscriber(SubscriberCommand::Add { welcome: true, inactive: false, .. })
    ));
  }

  #[test]
  fn run_once_picks_one_template() {
    let cli = parse(&["run-once", "--dashboard", "--mock"]).unwrap();
    assert!(matches!(
      cli.command,
      Command::RunOnce { dashboard: true, template: false, mock: true }
    ));
    assert!(parse(&["run-once", "--dashboard", "--template"]).is_err());
  }
}
