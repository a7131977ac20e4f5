//! stammtisch-server – Bibliotheks-Root
//!
//! Deklariert die Konfiguration und den Host-Ablauf; der duenne
//! `main`-Einstieg und Integrationstests greifen beide hierauf zu.

pub mod config;

use anyhow::Result;
use config::ServerConfig;
use stammtisch_room::{Raum, RaumEreignis, RoomServer};

/// Baut den Raum aus der Konfiguration und startet den Server
pub async fn server_starten(config: &ServerConfig) -> Result<RoomServer> {
    let raum = Raum::neu(
        config.raum.name.clone(),
        config.raum.besitzer.clone(),
        config.netzwerk.bind_adresse.clone(),
        &config.netzwerk.port,
        config.raum.passwort.clone(),
    )?;

    let mut server = RoomServer::neu(raum);
    server.starten().await?;
    Ok(server)
}

/// Schreibt ein Raum-Ereignis ins Log
pub fn ereignis_loggen(ereignis: &RaumEreignis) {
    match ereignis {
        RaumEreignis::Gestartet { adresse } => {
            tracing::info!(%adresse, "Raum geoeffnet");
        }
        RaumEreignis::Beigetreten { name } => {
            tracing::info!(name = %name, "Teilnehmer beigetreten");
        }
        RaumEreignis::Verlassen { name } => {
            tracing::info!(name = %name, "Teilnehmer gegangen");
        }
        RaumEreignis::Gekickt { name } => {
            tracing::info!(name = %name, "Teilnehmer rausgeworfen");
        }
        RaumEreignis::Chat { autor, text } => {
            tracing::debug!(autor = %autor, text = %text, "Chat");
        }
        RaumEreignis::Gestoppt => {
            tracing::info!("Raum geschlossen");
        }
    }
}
