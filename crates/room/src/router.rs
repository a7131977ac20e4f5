//! Nachrichten-Router
//!
//! Verteilt eingehende Nachrichten etablierter Sessions und fuehrt die
//! besitzer-initiierten Sequenzen (Kick, Shutdown, Besitzer-Nachricht)
//! aus. Nach jeder Mitgliedschafts-Aenderung wird das Roster neu
//! berechnet und an die verbleibenden Sessions verteilt.
//!
//! IO-Fehler einzelner Verbindungen werden hier zur Trenn-Sequenz
//! abgebaut und erreichen weder die Accept-Schleife noch andere Sessions.

use std::sync::Arc;

use stammtisch_core::{text_pruefen, SessionId, SYSTEM_AUTOR};
use stammtisch_protocol::Envelope;

use crate::error::{RaumResult, RoomError};
use crate::server::RaumEreignis;
use crate::state::RoomState;

/// Standardgrund fuer einen Rauswurf
pub const KICK_GRUND: &str = "kicked by the room owner";

/// Standardgrund fuer das Herunterfahren
pub const SHUTDOWN_GRUND: &str = "room closed";

// ---------------------------------------------------------------------------
// Dispatch eingehender Nachrichten
// ---------------------------------------------------------------------------

/// Ergebnis der Verarbeitung einer eingehenden Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weiter {
    /// Verbindung bleibt bestehen
    Ja,
    /// Verbindung ist beendet (Leave oder Protokollverstoss)
    Nein,
}

/// Verarbeitet eine Nachricht einer etablierten Session
///
/// Nur `ChatMessage` und `Leave` sind von Teilnehmern zulaessig; jede
/// andere Variante ist ein Protokollverstoss und beendet die Verbindung.
pub fn nachricht_verarbeiten(
    state: &Arc<RoomState>,
    absender: &SessionId,
    envelope: Envelope,
) -> Weiter {
    match envelope {
        Envelope::ChatMessage { text, .. } => {
            chat_weiterleiten(state, absender, &text);
            Weiter::Ja
        }
        Envelope::Leave => {
            tracing::debug!(session = %absender, "Teilnehmer verlaesst den Raum");
            trennen(state, absender);
            Weiter::Nein
        }
        andere => {
            tracing::warn!(
                session = %absender,
                nachricht = ?andere,
                "Protokollverstoss - Verbindung wird getrennt"
            );
            trennen(state, absender);
            Weiter::Nein
        }
    }
}

/// Leitet eine Chat-Nachricht an alle anderen Teilnehmer weiter
///
/// Der Autor wird aus der Registry gesetzt, nie vom Client uebernommen.
/// Ungueltige Texte werden verworfen statt die Verbindung zu beenden.
pub fn chat_weiterleiten(state: &Arc<RoomState>, absender: &SessionId, text: &str) {
    let Some(autor) = state.registry.name_von(absender) else {
        tracing::debug!(session = %absender, "Chat von nicht registrierter Session verworfen");
        return;
    };

    if let Err(fehler) = text_pruefen(text) {
        tracing::debug!(session = %absender, %fehler, "Ungueltiger Chat-Text verworfen");
        return;
    }

    let gesendet =
        state.registry.an_alle_ausser_senden(absender, Envelope::chat(&autor, text));
    tracing::debug!(autor = %autor, empfaenger = gesendet, "Chat-Nachricht weitergeleitet");

    state.ereignis_melden(RaumEreignis::Chat {
        autor,
        text: text.to_string(),
    });
}

// ---------------------------------------------------------------------------
// Trenn-Sequenz
// ---------------------------------------------------------------------------

/// Entfernt eine Session und informiert die verbleibenden Teilnehmer
///
/// Idempotent: eine bereits entfernte Session (Kick, Shutdown) loest
/// keine zweite Sequenz aus. Nach dem Entfernen erhalten die
/// verbleibenden Sessions ein neues Roster und eine System-Zeile.
pub fn trennen(state: &Arc<RoomState>, id: &SessionId) {
    let Some(eintrag) = state.registry.entfernen(id) else {
        return;
    };

    let name = eintrag.anzeige_name;
    tracing::info!(session = %id, name = %name, "Teilnehmer getrennt");

    state
        .registry
        .an_alle_senden(Envelope::roster_update(state.registry.roster()));
    state
        .registry
        .an_alle_senden(Envelope::chat(SYSTEM_AUTOR, format!("{name} left")));

    state.ereignis_melden(RaumEreignis::Verlassen { name });
}

// ---------------------------------------------------------------------------
// Besitzer-Pfade
// ---------------------------------------------------------------------------

/// Wirft einen Teilnehmer aus dem Raum
///
/// Das Ziel erhaelt genau eine `KickNotice` bevor sein Eintrag entfernt
/// wird; der Verbindungs-Task leert die Queue und schliesst danach die
/// Verbindung. Anschliessend laeuft dieselbe Roster-Sequenz wie bei
/// einer normalen Trennung.
pub fn kicken(state: &Arc<RoomState>, name: &str, grund: &str) -> RaumResult<()> {
    let id = state
        .registry
        .finde_nach_name(name)
        .ok_or_else(|| RoomError::BenutzerNichtGefunden(name.to_string()))?;

    state.registry.senden_an(&id, Envelope::kick(grund));

    let Some(eintrag) = state.registry.entfernen(&id) else {
        // Wettlauf mit einer gleichzeitigen Trennung
        return Err(RoomError::BenutzerNichtGefunden(name.to_string()));
    };

    let name = eintrag.anzeige_name;
    tracing::info!(name = %name, grund = %grund, "Teilnehmer rausgeworfen");

    state
        .registry
        .an_alle_senden(Envelope::roster_update(state.registry.roster()));
    state
        .registry
        .an_alle_senden(Envelope::chat(SYSTEM_AUTOR, format!("{name} left")));

    state.ereignis_melden(RaumEreignis::Gekickt { name });
    Ok(())
}

/// Faehrt den Raum herunter
///
/// Jede Session erhaelt genau eine `ShutdownNotice` bevor ihr Eintrag
/// entfernt wird; die Verbindungs-Tasks leeren ihre Queues und beenden
/// sich ueber das Shutdown-Signal. Idempotent.
pub fn herunterfahren(state: &Arc<RoomState>, grund: &str) {
    if state.faehrt_herunter() {
        return;
    }

    let benachrichtigt = state.registry.an_alle_senden(Envelope::shutdown(grund));
    let eintraege = state.registry.leeren();
    tracing::info!(
        teilnehmer = eintraege.len(),
        benachrichtigt,
        grund = %grund,
        "Raum wird geschlossen"
    );

    state.shutdown_ausloesen();
    state.ereignis_melden(RaumEreignis::Gestoppt);
}

/// Sendet eine Nachricht des Besitzers an alle Teilnehmer
pub fn besitzer_nachricht(state: &Arc<RoomState>, text: &str) {
    if let Err(fehler) = text_pruefen(text) {
        tracing::debug!(%fehler, "Ungueltige Besitzer-Nachricht verworfen");
        return;
    }

    let autor = state.raum.besitzer_name.clone();
    let gesendet = state.registry.an_alle_senden(Envelope::chat(&autor, text));
    tracing::debug!(empfaenger = gesendet, "Besitzer-Nachricht verteilt");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
