//! Fehlertypen der Client-Session

use stammtisch_core::KonfigFehler;
use stammtisch_protocol::AblehnungsGrund;
use thiserror::Error;

/// Fehler beim Beitritt oder im laufenden Betrieb einer Session
#[derive(Debug, Error)]
pub enum BeitrittsFehler {
    /// Name kollidiert mit Besitzer oder einem Mitglied
    #[error("Name bereits vergeben")]
    NameVergeben,

    /// Passwort stimmt nicht
    #[error("Falsches Passwort")]
    FalschesPasswort,

    /// Port ungueltig (keine Zahl oder ausserhalb des Bereichs)
    #[error("Ungueltiger Port: {0}")]
    UngueltigerPort(#[from] KonfigFehler),

    /// Anzeigename ungueltig (leer, zu lang oder reserviert)
    #[error("Ungueltiger Name: {0}")]
    UngueltigerName(KonfigFehler),

    /// Server hat nicht rechtzeitig geantwortet
    #[error("Zeitueberschreitung beim Warten auf die Server-Antwort")]
    Timeout,

    /// Verbindungsaufbau oder Transport fehlgeschlagen
    #[error("Transportfehler: {0}")]
    TransportFehler(#[from] std::io::Error),

    /// Operation benoetigt eine verbundene Session
    #[error("Nicht verbunden")]
    NichtVerbunden,

    /// Unerwartete Nachricht vom Server
    #[error("Protokollfehler: {0}")]
    Protokoll(String),
}

impl From<AblehnungsGrund> for BeitrittsFehler {
    fn from(grund: AblehnungsGrund) -> Self {
        match grund {
            AblehnungsGrund::DuplicateName => Self::NameVergeben,
            AblehnungsGrund::WrongPassword => Self::FalschesPasswort,
        }
    }
}
