//! ClientSession – Zustandsmaschine eines Verbindungsversuchs
//!
//! Die Session kapselt den kompletten Lebenszyklus: Verbindungsaufbau,
//! Handshake (genau ein `JoinRequest`, genau eine Antwort im
//! Zeitfenster), laufender Betrieb mit Hintergrund-Lese-Task und
//! Trennung. `KickNotice` und `ShutdownNotice` werden genau einmal als
//! Ereignis sichtbar und beenden die Session lokal.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use stammtisch_core::{name_pruefen, port_pruefen};
use stammtisch_protocol::{Envelope, FrameCodec};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::Framed;

use crate::fehler::BeitrittsFehler;

/// Zeitfenster fuer die Handshake-Antwort des Servers
pub const ANTWORT_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Typen
// ---------------------------------------------------------------------------

/// Zugangsdaten fuer den Beitritt
#[derive(Debug, Clone)]
pub struct Zugangsdaten {
    /// Gewuenschter Anzeigename (maximal 20 Zeichen, nicht reserviert)
    pub name: String,
    /// Raum-Passwort im Klartext
    pub passwort: String,
}

impl Zugangsdaten {
    pub fn neu(name: impl Into<String>, passwort: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passwort: passwort.into(),
        }
    }
}

/// Stammdaten des Raums aus der Handshake-Antwort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaumInfo {
    pub raum_name: String,
    pub besitzer_name: String,
}

/// Zustand der Session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionZustand {
    /// Keine Verbindung (Ausgangs- und Endzustand)
    Getrennt,
    /// TCP-Verbindungsaufbau laeuft
    Verbindet,
    /// JoinRequest gesendet, warten auf die Antwort
    Handshake,
    /// Beitritt akzeptiert, Nachrichten fliessen
    Verbunden,
}

/// Eingehendes Ereignis fuer die Praesentationsschicht
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEreignis {
    /// Chat-Nachricht eines anderen Teilnehmers oder des Systems
    Chat { autor: String, text: String },
    /// Neue Mitgliederliste in Beitrittsreihenfolge
    Roster { namen: Vec<String> },
    /// Vom Besitzer rausgeworfen; die Session ist danach getrennt
    Gekickt { grund: String },
    /// Der Raum wurde geschlossen; die Session ist danach getrennt
    RaumGeschlossen { grund: String },
    /// Verbindung verloren (EOF oder Lesefehler)
    VerbindungVerloren,
}

// ---------------------------------------------------------------------------
// ClientSession
// ---------------------------------------------------------------------------

type Schreiber = SplitSink<Framed<TcpStream, FrameCodec>, Envelope>;
type Leser = SplitStream<Framed<TcpStream, FrameCodec>>;

/// Client-Seite einer Raum-Verbindung
///
/// Nach einer Trennung (freiwillig, Kick oder Shutdown) ist die Session
/// im Zustand `Getrennt` und kann fuer einen neuen Versuch verwendet
/// werden.
pub struct ClientSession {
    zustand: SessionZustand,
    raum_info: Option<RaumInfo>,
    schreiber: Option<Schreiber>,
    ereignis_rx: Option<mpsc::UnboundedReceiver<ClientEreignis>>,
    lese_task: Option<JoinHandle<()>>,
}

impl ClientSession {
    /// Erstellt eine getrennte Session
    pub fn neu() -> Self {
        Self {
            zustand: SessionZustand::Getrennt,
            raum_info: None,
            schreiber: None,
            ereignis_rx: None,
            lese_task: None,
        }
    }

    /// Aktueller Zustand
    pub fn zustand(&self) -> SessionZustand {
        self.zustand
    }

    /// Raum-Stammdaten, sobald der Beitritt akzeptiert wurde
    pub fn raum_info(&self) -> Option<&RaumInfo> {
        self.raum_info.as_ref()
    }

    /// Verbindet sich mit einem Raum und fuehrt den Handshake durch
    ///
    /// Name und Port werden vor dem Verbindungsaufbau lokal geprueft;
    /// ein offensichtlich ungueltiger Beitritt erreicht den Server nie.
    pub async fn verbinden(
        &mut self,
        adresse: &str,
        port: &str,
        zugangsdaten: &Zugangsdaten,
    ) -> Result<RaumInfo, BeitrittsFehler> {
        if self.zustand != SessionZustand::Getrennt {
            return Err(BeitrittsFehler::Protokoll(
                "Session ist bereits verbunden".to_string(),
            ));
        }

        name_pruefen(&zugangsdaten.name).map_err(BeitrittsFehler::UngueltigerName)?;
        let port = port_pruefen(port)?;

        self.zustand = SessionZustand::Verbindet;
        let stream = match TcpStream::connect((adresse, port)).await {
            Ok(stream) => stream,
            Err(fehler) => {
                self.zustand = SessionZustand::Getrennt;
                return Err(BeitrittsFehler::TransportFehler(fehler));
            }
        };

        let mut framed = Framed::new(stream, FrameCodec::new());

        self.zustand = SessionZustand::Handshake;
        if let Err(fehler) = framed
            .send(Envelope::join_request(
                zugangsdaten.name.clone(),
                zugangsdaten.passwort.clone(),
            ))
            .await
        {
            self.zustand = SessionZustand::Getrennt;
            return Err(BeitrittsFehler::TransportFehler(fehler));
        }

        let antwort = match timeout(ANTWORT_TIMEOUT, framed.next()).await {
            Ok(Some(Ok(envelope))) => envelope,
            Ok(Some(Err(fehler))) => {
                self.zustand = SessionZustand::Getrennt;
                return Err(BeitrittsFehler::TransportFehler(fehler));
            }
            Ok(None) => {
                self.zustand = SessionZustand::Getrennt;
                return Err(BeitrittsFehler::Protokoll(
                    "Server hat die Verbindung ohne Antwort geschlossen".to_string(),
                ));
            }
            Err(_) => {
                self.zustand = SessionZustand::Getrennt;
                return Err(BeitrittsFehler::Timeout);
            }
        };

        match antwort {
            Envelope::JoinAccepted {
                room_name,
                owner_name,
            } => {
                let info = RaumInfo {
                    raum_name: room_name,
                    besitzer_name: owner_name,
                };

                let (schreiber, leser) = framed.split();
                let (ereignis_tx, ereignis_rx) = mpsc::unbounded_channel();
                let lese_task = tokio::spawn(lese_schleife(leser, ereignis_tx));

                self.zustand = SessionZustand::Verbunden;
                self.raum_info = Some(info.clone());
                self.schreiber = Some(schreiber);
                self.ereignis_rx = Some(ereignis_rx);
                self.lese_task = Some(lese_task);

                tracing::info!(raum = %info.raum_name, "Beitritt akzeptiert");
                Ok(info)
            }
            Envelope::JoinRefused { reason } => {
                self.zustand = SessionZustand::Getrennt;
                tracing::info!(?reason, "Beitritt abgelehnt");
                Err(reason.into())
            }
            andere => {
                self.zustand = SessionZustand::Getrennt;
                Err(BeitrittsFehler::Protokoll(format!(
                    "Unerwartete Handshake-Antwort: {andere:?}"
                )))
            }
        }
    }

    /// Holt alle aufgelaufenen Ereignisse ab (nicht blockierend)
    ///
    /// Gibt hoechstens die beim Aufruf vorhandenen Ereignisse zurueck.
    /// `Gekickt`, `RaumGeschlossen` und `VerbindungVerloren` erscheinen
    /// genau einmal und versetzen die Session in den Zustand `Getrennt`.
    pub fn ereignisse_abholen(&mut self) -> Vec<ClientEreignis> {
        let Some(rx) = self.ereignis_rx.as_mut() else {
            return Vec::new();
        };

        let mut ereignisse = Vec::new();
        while let Ok(ereignis) = rx.try_recv() {
            ereignisse.push(ereignis);
        }

        let beendet = ereignisse.iter().any(|e| {
            matches!(
                e,
                ClientEreignis::Gekickt { .. }
                    | ClientEreignis::RaumGeschlossen { .. }
                    | ClientEreignis::VerbindungVerloren
            )
        });
        if beendet {
            self.lokal_trennen();
        }

        ereignisse
    }

    /// Sendet eine Chat-Nachricht
    ///
    /// Der Autor wird serverseitig gesetzt, der hier uebergebene Text
    /// geht unveraendert auf die Leitung.
    pub async fn senden(&mut self, text: &str) -> Result<(), BeitrittsFehler> {
        if self.zustand != SessionZustand::Verbunden {
            return Err(BeitrittsFehler::NichtVerbunden);
        }
        let Some(schreiber) = self.schreiber.as_mut() else {
            return Err(BeitrittsFehler::NichtVerbunden);
        };

        if let Err(fehler) = schreiber.send(Envelope::chat("", text)).await {
            tracing::debug!(%fehler, "Senden fehlgeschlagen - Session wird getrennt");
            self.lokal_trennen();
            return Err(BeitrittsFehler::TransportFehler(fehler));
        }
        Ok(())
    }

    /// Verlaesst den Raum freiwillig
    ///
    /// Das `Leave` ist best-effort: ein Sendefehler aendert nichts am
    /// Ergebnis, die Session ist danach in jedem Fall getrennt.
    pub async fn verlassen(&mut self) {
        if let Some(schreiber) = self.schreiber.as_mut() {
            if let Err(fehler) = schreiber.send(Envelope::Leave).await {
                tracing::debug!(%fehler, "Leave nicht zustellbar");
            }
        }
        self.lokal_trennen();
    }

    /// Setzt die Session lokal in den Zustand `Getrennt`
    fn lokal_trennen(&mut self) {
        self.zustand = SessionZustand::Getrennt;
        self.raum_info = None;
        self.schreiber = None;
        if let Some(task) = self.lese_task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("zustand", &self.zustand)
            .field("raum_info", &self.raum_info)
            .finish()
    }
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::neu()
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        if let Some(task) = self.lese_task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Lese-Task
// ---------------------------------------------------------------------------

/// Liest Frames vom Server und uebersetzt sie in Client-Ereignisse
///
/// Endet nach `KickNotice`, `ShutdownNotice`, EOF oder Lesefehler.
/// Ein geschlossener Ereignis-Empfaenger beendet die Schleife ebenfalls.
async fn lese_schleife(mut leser: Leser, ereignis_tx: mpsc::UnboundedSender<ClientEreignis>) {
    loop {
        let ereignis = match leser.next().await {
            Some(Ok(Envelope::ChatMessage { author, text })) => {
                ClientEreignis::Chat { autor: author, text }
            }
            Some(Ok(Envelope::RosterUpdate { names })) => {
                ClientEreignis::Roster { namen: names }
            }
            Some(Ok(Envelope::KickNotice { reason })) => {
                let _ = ereignis_tx.send(ClientEreignis::Gekickt { grund: reason });
                break;
            }
            Some(Ok(Envelope::ShutdownNotice { reason })) => {
                let _ = ereignis_tx.send(ClientEreignis::RaumGeschlossen { grund: reason });
                break;
            }
            Some(Ok(andere)) => {
                tracing::debug!(nachricht = ?andere, "Unerwartete Server-Nachricht ignoriert");
                continue;
            }
            Some(Err(fehler)) => {
                tracing::debug!(%fehler, "Lesefehler");
                let _ = ereignis_tx.send(ClientEreignis::VerbindungVerloren);
                break;
            }
            None => {
                let _ = ereignis_tx.send(ClientEreignis::VerbindungVerloren);
                break;
            }
        };

        if ereignis_tx.send(ereignis).is_err() {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn senden_ohne_verbindung() {
        let mut session = ClientSession::neu();
        assert!(matches!(
            session.senden("hallo").await,
            Err(BeitrittsFehler::NichtVerbunden)
        ));
    }

    #[tokio::test]
    async fn ungueltiger_name_erreicht_den_server_nicht() {
        let mut session = ClientSession::neu();
        let zugang = Zugangsdaten::neu("x".repeat(21), "pw");
        // Adresse absichtlich unerreichbar: die Pruefung muss vorher greifen
        let ergebnis = session.verbinden("203.0.113.1", "5000", &zugang).await;
        assert!(matches!(ergebnis, Err(BeitrittsFehler::UngueltigerName(_))));
        assert_eq!(session.zustand(), SessionZustand::Getrennt);
    }

    #[tokio::test]
    async fn ungueltiger_port_erreicht_den_server_nicht() {
        let mut session = ClientSession::neu();
        let zugang = Zugangsdaten::neu("bob", "pw");
        let ergebnis = session.verbinden("127.0.0.1", "70000", &zugang).await;
        assert!(matches!(ergebnis, Err(BeitrittsFehler::UngueltigerPort(_))));
        let ergebnis = session.verbinden("127.0.0.1", "kein-port", &zugang).await;
        assert!(matches!(ergebnis, Err(BeitrittsFehler::UngueltigerPort(_))));
    }

    #[tokio::test]
    async fn verbindungsfehler_setzt_zustand_zurueck() {
        let mut session = ClientSession::neu();
        let zugang = Zugangsdaten::neu("bob", "pw");
        // Port ist im gueltigen Bereich aber niemand hoert dort
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port().to_string();
        drop(listener);

        let ergebnis = session.verbinden("127.0.0.1", &port, &zugang).await;
        assert!(matches!(
            ergebnis,
            Err(BeitrittsFehler::TransportFehler(_))
        ));
        assert_eq!(session.zustand(), SessionZustand::Getrennt);
    }

    #[tokio::test]
    async fn ereignisse_ohne_verbindung_sind_leer() {
        let mut session = ClientSession::neu();
        assert!(session.ereignisse_abholen().is_empty());
    }
}
