//! Geteilter Serverzustand
//!
//! `RoomState` buendelt alles was Acceptor, Router und Verbindungs-Tasks
//! gemeinsam brauchen: den Raum selbst, die Session-Registry, den
//! Ereignis-Kanal zum Betreiber und das Shutdown-Signal. Der Zustand wird
//! als ein `Arc` an alle Tasks gereicht.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::raum::Raum;
use crate::registry::SessionRegistry;
use crate::server::RaumEreignis;

/// Obergrenze gleichzeitiger Teilnehmer
pub const MAX_TEILNEHMER: usize = 64;

/// Gemeinsamer Zustand des laufenden Raum-Servers
#[derive(Debug)]
pub struct RoomState {
    /// Raum-Stammdaten und Passwort
    pub raum: Raum,
    /// Alle verbundenen Teilnehmer
    pub registry: SessionRegistry,
    /// Ereignisse fuer den Betreiber (Beitritte, Nachrichten, Abgaenge)
    ereignis_tx: mpsc::UnboundedSender<RaumEreignis>,
    /// Shutdown-Signal an alle Verbindungs-Tasks
    shutdown_tx: watch::Sender<bool>,
}

impl RoomState {
    /// Erstellt den Zustand samt Shutdown-Kanal
    pub fn neu(raum: Raum, ereignis_tx: mpsc::UnboundedSender<RaumEreignis>) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            raum,
            registry: SessionRegistry::neu(),
            ereignis_tx,
            shutdown_tx,
        })
    }

    /// Meldet ein Ereignis an den Betreiber
    ///
    /// Ein geschlossener Empfaenger ist kein Fehler: der Betreiber muss
    /// die Ereignisse nicht konsumieren.
    pub fn ereignis_melden(&self, ereignis: RaumEreignis) {
        let _ = self.ereignis_tx.send(ereignis);
    }

    /// Abonniert das Shutdown-Signal
    pub fn shutdown_abonnieren(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Loest das Shutdown-Signal aus
    pub fn shutdown_ausloesen(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Prueft ob das Shutdown-Signal bereits ausgeloest wurde
    pub fn faehrt_herunter(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}
