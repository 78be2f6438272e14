use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Password, Select};
use weather_core::{
    Config, FileLocationStore, LastLocationStore, LocationCandidate, WorkflowController,
    WorkflowState, gateway::gateway_from_config,
};

use crate::render;

/// Upper bound on waiting for a debounced search to finish.
const SEARCH_WAIT: Duration = Duration::from_secs(15);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather forecast for your last city")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI.com API key in the config file.
    Configure,

    /// Show the forecast for the last picked city (or the default one).
    Show,

    /// Search for a city, pick one and show its forecast.
    Search {
        /// Free-text city name, at least 3 characters.
        query: String,
    },

    /// Forget the last picked city.
    Forget,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command.unwrap_or(Command::Show) {
            Command::Configure => configure(),
            Command::Show => show().await,
            Command::Search { query } => search(&query).await,
            Command::Forget => {
                let store = FileLocationStore::from_platform_dirs()?;
                store
                    .clear()
                    .await
                    .with_context(|| format!("Failed to clear {}", store.path().display()))?;
                println!("Last city forgotten.");
                Ok(())
            }
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("WeatherAPI.com API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(key.trim().to_string());
    config.save()?;

    println!(
        "Saved API key to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

fn controller(config: &Config) -> Result<WorkflowController> {
    let gateway = gateway_from_config(config)?;
    let store = Arc::new(FileLocationStore::from_platform_dirs()?);
    tracing::debug!(
        base_url = %config.base_url,
        state = %store.path().display(),
        "workflow wired"
    );
    Ok(WorkflowController::new(
        gateway,
        store,
        config.workflow_settings(),
    ))
}

async fn show() -> Result<()> {
    let config = Config::load()?;
    let ctl = controller(&config)?;

    ctl.start().await;
    print_state(&ctl.state());
    ctl.dispose();
    Ok(())
}

async fn search(query: &str) -> Result<()> {
    let config = Config::load()?;
    let ctl = controller(&config)?;

    ctl.set_search_open(true);
    if ctl.text_changed(query) != weather_core::Scheduled::Pending {
        anyhow::bail!(
            "Query '{query}' is too short; type at least {} characters.",
            config.min_query_chars
        );
    }

    let candidates = wait_for_search(&ctl).await;
    if candidates.is_empty() {
        // Provider errors and empty results look the same from here.
        println!("No locations found for '{query}'.");
        ctl.dispose();
        return Ok(());
    }

    let picked = pick(candidates)?;
    ctl.location_picked(&picked).await;
    print_state(&ctl.state());

    ctl.flush().await;
    ctl.dispose();
    Ok(())
}

/// Wait for the pending search to finish and return what it found.
async fn wait_for_search(ctl: &WorkflowController) -> Vec<LocationCandidate> {
    let mut rx = ctl.subscribe();
    let found = tokio::time::timeout(SEARCH_WAIT, rx.wait_for(|s| !s.searching))
        .await
        .ok()
        .and_then(Result::ok)
        .map(|state| state.candidates.clone());
    found.unwrap_or_default()
}

fn pick(candidates: Vec<LocationCandidate>) -> Result<LocationCandidate> {
    if candidates.len() == 1 {
        return candidates
            .into_iter()
            .next()
            .context("Search returned no candidates");
    }

    Select::new("Pick a location:", candidates)
        .prompt()
        .context("No location picked")
}

fn print_state(state: &WorkflowState) {
    match &state.snapshot {
        Some(snapshot) => print!("{}", render::snapshot(snapshot)),
        None => println!("Weather is unavailable right now."),
    }
}
