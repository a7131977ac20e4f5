//! RoomServer – Fassade fuer die Praesentationsschicht
//!
//! Kapselt Start, Betrieb und Herunterfahren eines Raums hinter einer
//! kleinen API. Die Praesentationsschicht (Binary, UI, Tests) sieht nur
//! diese Fassade; Registry, Router und Acceptor bleiben intern.
//!
//! Statt eines Tick-Getriebenen Poll-Modells arbeitet der Server
//! task-basiert; Ereignisse fuer den Betreiber sammeln sich in einem
//! unbegrenzten Kanal und werden ueber `ereignisse_abholen` ohne
//! Blockieren abgeholt. Der Aufrufer kann das aus einer beliebigen
//! eigenen Schleife heraus tun.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::acceptor;
use crate::error::{RaumResult, RoomError};
use crate::raum::Raum;
use crate::router;
use crate::state::RoomState;

// ---------------------------------------------------------------------------
// Ereignisse
// ---------------------------------------------------------------------------

/// Ereignis fuer den Betreiber des Raums
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaumEreignis {
    /// Server hoert auf der Adresse
    Gestartet { adresse: SocketAddr },
    /// Ein Teilnehmer ist beigetreten
    Beigetreten { name: String },
    /// Ein Teilnehmer hat den Raum verlassen (Leave, EOF oder Fehler)
    Verlassen { name: String },
    /// Ein Teilnehmer wurde rausgeworfen
    Gekickt { name: String },
    /// Eine Chat-Nachricht wurde weitergeleitet
    Chat { autor: String, text: String },
    /// Der Raum wurde geschlossen
    Gestoppt,
}

// ---------------------------------------------------------------------------
// RoomServer
// ---------------------------------------------------------------------------

/// Hostet genau einen passwortgeschuetzten Raum
pub struct RoomServer {
    state: Arc<RoomState>,
    ereignis_rx: mpsc::UnboundedReceiver<RaumEreignis>,
    accept_task: Option<JoinHandle<()>>,
    lokale_adresse: Option<SocketAddr>,
}

impl RoomServer {
    /// Erstellt einen Server fuer den gegebenen Raum (noch nicht gestartet)
    pub fn neu(raum: Raum) -> Self {
        let (ereignis_tx, ereignis_rx) = mpsc::unbounded_channel();
        Self {
            state: RoomState::neu(raum, ereignis_tx),
            ereignis_rx,
            accept_task: None,
            lokale_adresse: None,
        }
    }

    /// Bindet den Listener und startet die Accept-Schleife
    pub async fn starten(&mut self) -> RaumResult<()> {
        if self.accept_task.is_some() {
            return Err(RoomError::BereitsGestartet);
        }
        // Das Shutdown-Signal laesst sich nicht zuruecknehmen; ein
        // heruntergefahrener Server startet nicht erneut
        if self.state.faehrt_herunter() {
            return Err(RoomError::Heruntergefahren);
        }

        let listener = TcpListener::bind(self.state.raum.bind_adresse()).await?;
        let adresse = listener.local_addr()?;
        self.lokale_adresse = Some(adresse);

        tracing::info!(
            raum = %self.state.raum.name,
            besitzer = %self.state.raum.besitzer_name,
            %adresse,
            "Raum-Server gestartet"
        );

        self.state.ereignis_melden(RaumEreignis::Gestartet { adresse });
        self.accept_task = Some(tokio::spawn(acceptor::accept_schleife(
            self.state.clone(),
            listener,
        )));
        Ok(())
    }

    /// Holt alle aufgelaufenen Ereignisse ab (nicht blockierend)
    ///
    /// Gibt hoechstens die beim Aufruf vorhandenen Ereignisse zurueck;
    /// Ereignisse die waehrend des Abholens eintreffen kommen beim
    /// naechsten Aufruf.
    pub fn ereignisse_abholen(&mut self) -> Vec<RaumEreignis> {
        let mut ereignisse = Vec::new();
        while let Ok(ereignis) = self.ereignis_rx.try_recv() {
            ereignisse.push(ereignis);
        }
        ereignisse
    }

    /// Aktuelle Mitgliederliste in Beitrittsreihenfolge (ohne Besitzer)
    pub fn roster(&self) -> Vec<String> {
        self.state.registry.roster()
    }

    /// Setzt ein neues Raum-Passwort
    ///
    /// Wirkt nur auf kuenftige Beitritte; bestehende Sessions bleiben
    /// unberuehrt.
    pub fn passwort_setzen(&self, neu: impl Into<String>) {
        self.state.raum.passwort_setzen(neu);
    }

    /// Wirft einen Teilnehmer anhand seines Anzeigenamens raus
    pub fn kicken(&self, name: &str) -> RaumResult<()> {
        if !self.laeuft() {
            return Err(RoomError::NichtGestartet);
        }
        router::kicken(&self.state, name, router::KICK_GRUND)
    }

    /// Sendet eine Nachricht des Besitzers an alle Teilnehmer
    pub fn besitzer_nachricht(&self, text: &str) {
        router::besitzer_nachricht(&self.state, text);
    }

    /// Faehrt den Raum herunter (idempotent)
    ///
    /// Jede Session erhaelt eine `ShutdownNotice` bevor ihre Verbindung
    /// schliesst; danach endet die Accept-Schleife.
    pub async fn herunterfahren(&mut self, grund: &str) {
        router::herunterfahren(&self.state, grund);
        if let Some(task) = self.accept_task.take() {
            if let Err(fehler) = task.await {
                tracing::warn!(%fehler, "Accept-Schleife unsauber beendet");
            }
        }
        self.lokale_adresse = None;
    }

    /// Prueft ob der Server laeuft
    pub fn laeuft(&self) -> bool {
        self.accept_task.is_some() && !self.state.faehrt_herunter()
    }

    /// Tatsaechliche Listener-Adresse (interessant bei Port 0 in Tests)
    pub fn lokale_adresse(&self) -> Option<SocketAddr> {
        self.lokale_adresse
    }
}

impl std::fmt::Debug for RoomServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomServer")
            .field("raum", &self.state.raum.name)
            .field("laeuft", &self.laeuft())
            .field("teilnehmer", &self.state.registry.anzahl())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_raum() -> Raum {
        Raum::neu("Testraum", "alice", "127.0.0.1", "5000", "secret")
            .expect("Testraum muss gueltig sein")
    }

    /// Reserviert kurz einen freien Port beim Betriebssystem
    async fn freier_port() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port().to_string()
    }

    #[tokio::test]
    async fn kick_vor_start_schlaegt_fehl() {
        let server = RoomServer::neu(test_raum());
        assert!(matches!(
            server.kicken("bob"),
            Err(RoomError::NichtGestartet)
        ));
    }

    #[tokio::test]
    async fn doppelter_start_schlaegt_fehl() {
        let port = freier_port().await;
        let raum = Raum::neu("Testraum", "alice", "127.0.0.1", &port, "secret").unwrap();
        let mut server = RoomServer::neu(raum);
        server.starten().await.expect("erster Start muss gelingen");
        assert!(matches!(
            server.starten().await,
            Err(RoomError::BereitsGestartet)
        ));
        assert!(server.laeuft());
        assert!(server.lokale_adresse().is_some());

        let mut ereignisse = server.ereignisse_abholen();
        assert!(matches!(
            ereignisse.remove(0),
            RaumEreignis::Gestartet { .. }
        ));

        server.herunterfahren("test").await;
        assert!(!server.laeuft());
    }

    #[tokio::test]
    async fn kein_neustart_nach_herunterfahren() {
        let port = freier_port().await;
        let raum = Raum::neu("Testraum", "alice", "127.0.0.1", &port, "secret").unwrap();
        let mut server = RoomServer::neu(raum);
        server.starten().await.expect("erster Start muss gelingen");
        server.herunterfahren("test").await;

        assert!(matches!(
            server.starten().await,
            Err(RoomError::Heruntergefahren)
        ));
        assert!(!server.laeuft());
        assert!(server.lokale_adresse().is_none());
    }

    #[tokio::test]
    async fn herunterfahren_ist_idempotent() {
        let mut server = RoomServer::neu(test_raum());
        server.herunterfahren("test").await;
        server.herunterfahren("test").await;
        assert!(!server.laeuft());
    }

    #[tokio::test]
    async fn passwort_aenderung_ueber_fassade() {
        let server = RoomServer::neu(test_raum());
        server.passwort_setzen("neu");
        assert_eq!(server.roster(), Vec::<String>::new());
    }
}
