//! Stammtisch Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und hostet den
//! Raum bis zum Shutdown-Signal (Ctrl-C).

use std::time::Duration;

use anyhow::Result;
use stammtisch_server::{config::ServerConfig, ereignis_loggen, server_starten};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad =
        std::env::var("STAMMTISCH_CONFIG").unwrap_or_else(|_| "config.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = ServerConfig::laden(&config_pfad)?;

    // Logging initialisieren
    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        raum = %config.raum.name,
        "Stammtisch Server wird initialisiert"
    );

    let mut server = server_starten(&config).await?;

    tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
    let mut intervall = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            ergebnis = tokio::signal::ctrl_c() => {
                ergebnis?;
                tracing::info!("Shutdown-Signal empfangen, Raum wird geschlossen");
                break;
            }
            _ = intervall.tick() => {
                for ereignis in server.ereignisse_abholen() {
                    ereignis_loggen(&ereignis);
                }
            }
        }
    }

    server.herunterfahren("room closed").await;
    for ereignis in server.ereignisse_abholen() {
        ereignis_loggen(&ereignis);
    }
    Ok(())
}

/// Initialisiert tracing-subscriber mit dem konfigurierten Level und Format
fn logging_initialisieren(level: &str, format: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}
