use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use signage_core::{Config, Dashboard, ProviderId, Providers, ProxyState, Store, proxy};
use tokio::net::TcpListener;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "signage", version, about = "Weather proxy and dashboard data for the signage display")]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP proxy in front of the rainfall and forecast providers.
    Serve {
        /// Listen address; defaults to `proxy.bind` from the config file.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Refresh every dashboard store once and print what it holds.
    Show,

    /// Configure credentials or the endpoint for a specific provider.
    Configure {
        /// Provider short name: "rainfall", "forecast" or "suntimes".
        provider: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { bind } => serve(bind).await,
            Command::Show => show().await,
            Command::Configure { provider } => configure(&provider),
        }
    }
}

async fn serve(bind: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let providers = Providers::from_config(&config, reqwest::Client::new())?;

    let addr = bind.as_deref().unwrap_or(config.bind_addr());
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind weather proxy on {addr}"))?;

    proxy::serve(listener, ProxyState::from(&providers), async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {err}");
        }
        tracing::info!("shutting down weather proxy");
    })
    .await
}

async fn show() -> anyhow::Result<()> {
    let config = Config::load()?;
    let dashboard = Dashboard::from_config(&config, reqwest::Client::new())?;

    dashboard.refresh_all().await;

    let forecast = dashboard.weather.data();
    println!("Hourly forecast ({} hours)", forecast.len());
    for p in &forecast {
        let temperature = p.temperature.map_or_else(|| "--".to_string(), |t| format!("{t:.1}"));
        let code = p.weather_code.map_or_else(|| "--".to_string(), |c| c.to_string());
        println!("  {:<17} {:>6}°C  code {:>2}", p.time, temperature, code);
    }

    let rainfall = dashboard.rainfall.data();
    println!("Rainfall ({} intervals)", rainfall.len());
    for p in &rainfall {
        println!("  {:<12} {:>6.2} mm/h", p.date, p.rainfall);
    }

    println!("Sunrise: {}", clock(dashboard.sun.sunrise()));
    println!("Sunset:  {}", clock(dashboard.sun.sunset()));

    Ok(())
}

fn clock(t: Option<DateTime<FixedOffset>>) -> String {
    t.map(|t| t.format("%H:%M").to_string()).unwrap_or_else(|| "--:--".to_string())
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    if id.requires_api_key() {
        let configured = config.is_provider_configured(id);
        let message = format!("API key for {}:", id.label());
        let mut prompt = inquire::Password::new(&message).without_confirmation();
        if configured {
            prompt = prompt.with_help_message("Leave empty to keep the current key");
        }

        let key = prompt.prompt()?;
        let key = key.trim();
        if key.is_empty() && !configured {
            anyhow::bail!("An API key is required for provider '{id}'");
        }
        if !key.is_empty() {
            config.upsert_provider_api_key(id, key.to_string());
        }
    }

    let current = config.provider_base_url(id).unwrap_or_default().to_string();
    let base_url = inquire::Text::new("Endpoint override (empty for the public API):")
        .with_default(&current)
        .prompt()?;
    let entry = config.providers.entry(id.as_str().to_string()).or_default();
    entry.base_url = Some(base_url.trim().to_string()).filter(|u| !u.is_empty());

    config.save_to(&path)?;
    println!("Saved {id} settings to {}", path.display());
    Ok(())
}
