//! Envelope – Alle Nachrichtentypen des Stammtisch-Protokolls
//!
//! Definiert die kleine, feste Menge an Nachrichten die ueber eine
//! Verbindung ausgetauscht werden.
//!
//! ## Design
//! - Ein Tagged Enum fuer typsichere Nachrichtentypen
//! - JSON-Serialisierung via serde (TCP, nicht zeitkritisch)
//! - Jede Nachricht auf einer etablierten Verbindung ist genau eine
//!   dieser Varianten; andere Byte-Muster sind ungueltig

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ablehnungs-Gruende
// ---------------------------------------------------------------------------

/// Grund fuer eine abgelehnte Beitrittsanfrage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AblehnungsGrund {
    /// Name kollidiert (fallunabhaengig) mit Besitzer oder Mitglied
    DuplicateName,
    /// Passwort stimmt nicht mit dem Raum-Passwort ueberein
    WrongPassword,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Alle moeglichen Protokoll-Nachrichten (typsicher via Tagged Enum)
///
/// Der Handshake besteht aus genau einem `JoinRequest` vom Client und
/// genau einer Antwort (`JoinAccepted` oder `JoinRefused`) vom Server.
/// Danach fliessen die uebrigen Varianten in beide Richtungen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// Beitrittsanfrage (Client -> Server, erste Nachricht)
    JoinRequest { name: String, password: String },
    /// Beitritt akzeptiert (Server -> Client, Handshake-Antwort)
    JoinAccepted {
        room_name: String,
        owner_name: String,
    },
    /// Beitritt abgelehnt (Server -> Client, Handshake-Antwort)
    JoinRefused { reason: AblehnungsGrund },
    /// Vollstaendige Mitgliederliste in Beitrittsreihenfolge
    RosterUpdate { names: Vec<String> },
    /// Chat-Nachricht; der Server setzt den Autor beim Weiterleiten
    ChatMessage { author: String, text: String },
    /// Rauswurf durch den Besitzer
    KickNotice { reason: String },
    /// Server faehrt herunter
    ShutdownNotice { reason: String },
    /// Client verlaesst den Raum freiwillig
    Leave,
}

impl Envelope {
    /// Erstellt eine Beitrittsanfrage
    pub fn join_request(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self::JoinRequest {
            name: name.into(),
            password: password.into(),
        }
    }

    /// Erstellt die Akzeptanz-Antwort
    pub fn join_accepted(room_name: impl Into<String>, owner_name: impl Into<String>) -> Self {
        Self::JoinAccepted {
            room_name: room_name.into(),
            owner_name: owner_name.into(),
        }
    }

    /// Erstellt die Ablehnungs-Antwort
    pub fn join_refused(reason: AblehnungsGrund) -> Self {
        Self::JoinRefused { reason }
    }

    /// Erstellt eine Roster-Aktualisierung
    pub fn roster_update(names: Vec<String>) -> Self {
        Self::RosterUpdate { names }
    }

    /// Erstellt eine Chat-Nachricht mit Autor
    pub fn chat(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self::ChatMessage {
            author: author.into(),
            text: text.into(),
        }
    }

    /// Erstellt eine Kick-Benachrichtigung
    pub fn kick(reason: impl Into<String>) -> Self {
        Self::KickNotice {
            reason: reason.into(),
        }
    }

    /// Erstellt eine Shutdown-Benachrichtigung
    pub fn shutdown(reason: impl Into<String>) -> Self {
        Self::ShutdownNotice {
            reason: reason.into(),
        }
    }

    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Nachricht aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let original = Envelope::chat("bob", "hallo zusammen");
        let json = original.to_json().unwrap();
        let decoded = Envelope::from_json(&json).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn tag_feld_im_json() {
        let json = Envelope::Leave.to_json().unwrap();
        assert!(json.contains("\"type\":\"leave\""));

        let json = Envelope::join_request("bob", "geheim").to_json().unwrap();
        assert!(json.contains("\"type\":\"join_request\""));
    }

    #[test]
    fn ablehnungsgrund_screaming_snake_case() {
        let json = Envelope::join_refused(AblehnungsGrund::DuplicateName)
            .to_json()
            .unwrap();
        assert!(json.contains("DUPLICATE_NAME"));

        let json = Envelope::join_refused(AblehnungsGrund::WrongPassword)
            .to_json()
            .unwrap();
        assert!(json.contains("WRONG_PASSWORD"));
    }

    #[test]
    fn unbekannter_typ_wird_abgelehnt() {
        let result = Envelope::from_json(r#"{"type":"raw_text","text":"hi"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn roster_reihenfolge_bleibt_erhalten() {
        let original = Envelope::roster_update(vec!["bob".into(), "carla".into(), "dana".into()]);
        let decoded = Envelope::from_json(&original.to_json().unwrap()).unwrap();
        match decoded {
            Envelope::RosterUpdate { names } => {
                assert_eq!(names, vec!["bob", "carla", "dana"]);
            }
            other => panic!("Erwartet RosterUpdate, erhalten: {:?}", other),
        }
    }
}
