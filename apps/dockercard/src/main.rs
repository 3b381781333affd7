use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use card_core::{
    gesture::{GestureDriver, GestureInput},
    CardEvent, ContainerController, GestureAction, Localizer, MissingServiceCaller,
    NotificationLevel, ServiceCaller,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use shared::{
    config::CardConfig,
    domain::{ContainerKey, EntitySnapshot, EntityState},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod hass;
mod render;

use config::load_settings;
use hass::HassRestClient;
use render::render_card;

#[derive(Parser, Debug)]
#[command(
    name = "dockercard",
    about = "Show and control Docker containers exposed by Home Assistant"
)]
struct Cli {
    /// Settings file (defaults to ./dockercard.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Card configuration, YAML or JSON.
    #[arg(long)]
    card: Option<PathBuf>,
    /// Read entity states from a JSON file instead of Home Assistant.
    #[arg(long)]
    states: Option<PathBuf>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the card.
    Status,
    Start { name: String },
    Stop { name: String },
    Restart { name: String },
    /// Run the container's tap action.
    Tap { name: String },
    /// Run the container's hold action.
    Hold { name: String },
}

fn load_card(path: &Path) -> Result<CardConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read card configuration {}", path.display()))?;
    let value: Value = if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
        serde_json::from_str(&raw)?
    } else {
        serde_yaml::from_str(&raw)?
    };
    Ok(CardConfig::from_value(value)?)
}

fn load_states(path: &Path) -> Result<EntitySnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read entity states {}", path.display()))?;
    let states: Vec<EntityState> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid entity states in {}", path.display()))?;
    Ok(EntitySnapshot::from_states(states))
}

fn print_events(rx: &mut broadcast::Receiver<CardEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            CardEvent::Notification(notification) => match notification.level {
                NotificationLevel::Info => println!("{}", notification.message),
                NotificationLevel::Warning | NotificationLevel::Error => {
                    eprintln!("{}", notification.message)
                }
            },
            CardEvent::MoreInfo { entity_id } => println!("more-info: {entity_id}"),
            CardEvent::Navigate { path } => println!("navigate: {path}"),
            CardEvent::OpenUrl { url, new_tab } => {
                println!("open: {url}{}", if new_tab { " (new tab)" } else { "" })
            }
            CardEvent::FireEvent { name, detail } => println!("event {name}: {detail}"),
            CardEvent::PendingChanged { key, action } => {
                debug!(container = %key, ?action, "pending changed")
            }
        }
    }
}

fn container_key(controller: &ContainerController, name: &str) -> Result<ContainerKey> {
    controller
        .card()
        .find_container(name)
        .map(|entry| entry.key.clone())
        .ok_or_else(|| anyhow!("no container named {name:?} in the card"))
}

/// Replays a press on the row through the gesture driver and returns the
/// action it settles on.
async fn press(
    controller: &ContainerController,
    key: &ContainerKey,
    gesture: GestureAction,
    hold_delay_override: Option<Duration>,
) -> Result<Option<GestureAction>> {
    let bindings = controller.gesture_bindings(key)?;
    let hold_delay = match hold_delay_override {
        Some(delay) => delay,
        None => controller
            .view()
            .containers
            .iter()
            .find(|container| &container.key == key)
            .map(|container| container.hold_delay)
            .unwrap_or(shared::config::DEFAULT_HOLD_DELAY),
    };
    let (driver, mut actions) = GestureDriver::new(bindings, hold_delay);

    driver.handle(GestureInput::PointerDown {
        button: 0,
        on_control: false,
    });
    if gesture == GestureAction::Hold {
        if !bindings.hold {
            return Ok(None);
        }
        let fired = actions.recv().await;
        driver.handle(GestureInput::PointerUp { on_control: false });
        driver.handle(GestureInput::Click { on_control: false });
        return Ok(fired);
    }
    driver.handle(GestureInput::PointerUp { on_control: false });
    driver.handle(GestureInput::Click { on_control: false });
    Ok(actions.try_recv().ok())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.clone());
    if let Some(card) = cli.card {
        settings.card_path = card;
    }
    if let Some(language) = cli.language {
        settings.language = language;
    }
    if let Some(url) = cli.url {
        settings.hass_url = Some(url);
    }
    if let Some(token) = cli.token {
        settings.hass_token = Some(token);
    }

    let mut localizer = Localizer::new();
    if let Some(dir) = &settings.translations_dir {
        match localizer.load_dir(dir) {
            Ok(loaded) => info!(loaded, dir = %dir.display(), "loaded translation catalogs"),
            Err(err) => warn!("{err}"),
        }
    }

    let card = load_card(&settings.card_path)?;
    let hass = match (&settings.hass_url, &settings.hass_token) {
        (Some(url), Some(token)) => Some(Arc::new(HassRestClient::new(url, token.clone())?)),
        (Some(_), None) => {
            warn!("Home Assistant url set without a token; remote calls are disabled");
            None
        }
        _ => None,
    };

    let snapshot = match (&cli.states, &hass) {
        (Some(path), _) => load_states(path)?,
        (None, Some(client)) => client.fetch_states().await?,
        (None, None) => {
            bail!("no entity source: pass --states or configure a Home Assistant url and token")
        }
    };

    let caller: Arc<dyn ServiceCaller> = match hass {
        Some(client) => client,
        None => Arc::new(MissingServiceCaller),
    };
    let controller = ContainerController::new(card, caller, localizer);
    controller.set_language(settings.language.clone());
    controller.set_snapshot(snapshot);
    let mut events = controller.subscribe_events();

    let result = match cli.command {
        Command::Status => {
            print!("{}", render_card(&controller.view()));
            Ok(())
        }
        Command::Start { name } => {
            let key = container_key(&controller, &name)?;
            controller.toggle(&key, true).await.map_err(anyhow::Error::from)
        }
        Command::Stop { name } => {
            let key = container_key(&controller, &name)?;
            controller.toggle(&key, false).await.map_err(anyhow::Error::from)
        }
        Command::Restart { name } => {
            let key = container_key(&controller, &name)?;
            controller.restart(&key).await.map_err(anyhow::Error::from)
        }
        Command::Tap { name } => perform(&controller, &name, GestureAction::Tap, &settings).await,
        Command::Hold { name } => {
            perform(&controller, &name, GestureAction::Hold, &settings).await
        }
    };

    print_events(&mut events);
    result
}

async fn perform(
    controller: &ContainerController,
    name: &str,
    gesture: GestureAction,
    settings: &config::Settings,
) -> Result<()> {
    let key = container_key(controller, name)?;
    match press(controller, &key, gesture, settings.hold_delay()).await? {
        Some(fired) => Ok(controller.perform(&key, fired).await?),
        None => {
            warn!(container = %key, ?gesture, "no action bound");
            Ok(())
        }
    }
}
