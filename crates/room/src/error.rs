//! Fehlertypen fuer den Raum-Server

use stammtisch_core::KonfigFehler;
use thiserror::Error;

/// Fehlertyp fuer den Raum-Server
#[derive(Debug, Error)]
pub enum RoomError {
    /// Konfigurationsfehler (Port, Namen) – Server wird nicht gestartet
    #[error("Konfigurationsfehler: {0}")]
    Konfig(#[from] KonfigFehler),

    /// IO-Fehler (Bind, Accept)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Benutzer nicht gefunden (Kick auf unbekannten Namen)
    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(String),

    /// Name kollidiert mit einem bestehenden Mitglied
    #[error("Name bereits vergeben: {0}")]
    NameVergeben(String),

    /// Operation benoetigt einen laufenden Server
    #[error("Server ist nicht gestartet")]
    NichtGestartet,

    /// Server laeuft bereits
    #[error("Server laeuft bereits")]
    BereitsGestartet,

    /// Server wurde heruntergefahren, ein Neustart ist nicht vorgesehen
    #[error("Server wurde bereits heruntergefahren")]
    Heruntergefahren,
}

/// Result-Typ fuer den Raum-Server
pub type RaumResult<T> = Result<T, RoomError>;
