//! ConnectionAcceptor – Accept-Schleife und Verbindungs-Tasks
//!
//! Pro Verbindung laeuft genau ein Task der beide Richtungen bedient:
//! eingehende Frames gehen an den Router, ausgehende Nachrichten kommen
//! aus der Sende-Queue der Session. Alle Schreibzugriffe auf einen
//! Socket passieren in diesem einen Task, Frames koennen sich dadurch
//! nicht vermischen.
//!
//! ## Handshake
//! Genau ein `JoinRequest` innerhalb des Zeitfensters, sonst wird die
//! Verbindung ohne Antwort geschlossen. Die Antwort (`JoinAccepted` oder
//! `JoinRefused`) wird noch vor dem Eintritt in die Hauptschleife
//! geschrieben.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use stammtisch_core::{name_pruefen, KonfigFehler};
use stammtisch_protocol::{Envelope, FrameCodec};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::Framed;

use crate::auth::{beitritt_pruefen, Zutritt};
use crate::registry::SENDE_QUEUE_GROESSE;
use crate::router;
use crate::server::RaumEreignis;
use crate::state::{RoomState, MAX_TEILNEHMER};

/// Zeitfenster fuer den Handshake
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Accept-Schleife
// ---------------------------------------------------------------------------

/// Nimmt Verbindungen an bis das Shutdown-Signal kommt
///
/// Accept-Fehler einzelner Verbindungen werden geloggt und toleriert;
/// die Schleife selbst laeuft weiter.
pub async fn accept_schleife(state: Arc<RoomState>, listener: TcpListener) {
    let mut shutdown = state.shutdown_abonnieren();

    loop {
        tokio::select! {
            ergebnis = listener.accept() => match ergebnis {
                Ok((stream, adresse)) => {
                    if state.registry.anzahl() >= MAX_TEILNEHMER {
                        tracing::warn!(%adresse, "Raum voll - Verbindung abgewiesen");
                        continue;
                    }
                    tracing::debug!(%adresse, "Neue Verbindung");
                    tokio::spawn(verbindung_bedienen(state.clone(), stream, adresse));
                }
                Err(fehler) => {
                    tracing::warn!(%fehler, "Accept fehlgeschlagen");
                }
            },
            _ = shutdown.changed() => {
                tracing::debug!("Accept-Schleife beendet");
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Verbindungs-Task
// ---------------------------------------------------------------------------

/// Bedient eine Verbindung vom Handshake bis zur Trennung
async fn verbindung_bedienen(state: Arc<RoomState>, stream: TcpStream, adresse: SocketAddr) {
    let mut framed = Framed::new(stream, FrameCodec::new());

    // Handshake: genau ein JoinRequest im Zeitfenster
    let anfrage = match timeout(HANDSHAKE_TIMEOUT, framed.next()).await {
        Ok(Some(Ok(envelope))) => envelope,
        Ok(Some(Err(fehler))) => {
            tracing::debug!(%adresse, %fehler, "Handshake: ungueltiger Frame");
            return;
        }
        Ok(None) => {
            tracing::debug!(%adresse, "Handshake: Verbindung vorzeitig geschlossen");
            return;
        }
        Err(_) => {
            tracing::debug!(%adresse, "Handshake: Zeitfenster ueberschritten");
            return;
        }
    };

    let Envelope::JoinRequest { name, password } = anfrage else {
        tracing::debug!(%adresse, "Handshake: erste Nachricht ist kein JoinRequest");
        return;
    };

    match name_pruefen(&name) {
        Ok(()) => {}
        // Reservierte Namen beantwortet die Beitritts-Pruefung mit
        // einer regulaeren Ablehnung statt eines stillen Abbruchs
        Err(KonfigFehler::NameReserviert(_)) => {}
        Err(fehler) => {
            tracing::debug!(%adresse, %fehler, "Handshake: ungueltiger Name");
            return;
        }
    }

    // Beitritts-Pruefung auf einem Schnappschuss; die Registry prueft
    // die Eindeutigkeit beim Eintragen unter dem Write-Lock erneut
    let zutritt = beitritt_pruefen(
        &name,
        &password,
        &state.raum.besitzer_name,
        &state.raum.passwort(),
        &state.registry.roster(),
    );

    if let Zutritt::Abgelehnt(grund) = zutritt {
        tracing::info!(%adresse, name = %name, ?grund, "Beitritt abgelehnt");
        let _ = framed.send(Envelope::join_refused(grund)).await;
        return;
    }

    let (tx, mut rx) = mpsc::channel(SENDE_QUEUE_GROESSE);
    let id = match state.registry.hinzufuegen(&name, tx) {
        Ok(id) => id,
        Err(fehler) => {
            // Wettlauf zweier Handshakes mit demselben Namen
            tracing::info!(%adresse, name = %name, %fehler, "Beitritt im Wettlauf abgelehnt");
            let _ = framed
                .send(Envelope::join_refused(
                    stammtisch_protocol::AblehnungsGrund::DuplicateName,
                ))
                .await;
            return;
        }
    };

    // Handshake-Antwort noch vor der Hauptschleife schreiben
    if framed
        .send(Envelope::join_accepted(
            state.raum.name.clone(),
            state.raum.besitzer_name.clone(),
        ))
        .await
        .is_err()
    {
        tracing::debug!(%adresse, name = %name, "JoinAccepted nicht zustellbar");
        state.registry.entfernen(&id);
        return;
    }

    tracing::info!(%adresse, name = %name, session = %id, "Teilnehmer beigetreten");

    // Alle (inklusive Neuzugang) erhalten das aktuelle Roster, die
    // uebrigen zusaetzlich eine System-Zeile
    state
        .registry
        .an_alle_senden(Envelope::roster_update(state.registry.roster()));
    state.registry.an_alle_ausser_senden(
        &id,
        Envelope::chat(stammtisch_core::SYSTEM_AUTOR, format!("{name} joined the room")),
    );
    state.ereignis_melden(RaumEreignis::Beigetreten { name: name.clone() });

    let mut shutdown = state.shutdown_abonnieren();

    loop {
        tokio::select! {
            ausgehend = rx.recv() => match ausgehend {
                Some(envelope) => {
                    if framed.send(envelope).await.is_err() {
                        tracing::debug!(session = %id, "Senden fehlgeschlagen - Trennung");
                        router::trennen(&state, &id);
                        break;
                    }
                }
                // Eintrag entfernt (Kick oder Shutdown), Queue ist geleert
                None => break,
            },
            eingehend = framed.next() => match eingehend {
                Some(Ok(envelope)) => {
                    if router::nachricht_verarbeiten(&state, &id, envelope) == router::Weiter::Nein {
                        break;
                    }
                }
                Some(Err(fehler)) => {
                    tracing::debug!(session = %id, %fehler, "Lesefehler - Trennung");
                    router::trennen(&state, &id);
                    break;
                }
                None => {
                    tracing::debug!(session = %id, "Verbindung geschlossen");
                    router::trennen(&state, &id);
                    break;
                }
            },
            _ = shutdown.changed() => {
                // Ausstehende Nachrichten (insbesondere die ShutdownNotice)
                // noch ausliefern, dann beenden
                while let Ok(envelope) = rx.try_recv() {
                    let _ = framed.send(envelope).await;
                }
                break;
            }
        }
    }

    tracing::debug!(%adresse, session = %id, "Verbindungs-Task beendet");
}
