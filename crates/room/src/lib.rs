//! stammtisch-room – Session-Verwaltung und Nachrichten-Routing
//!
//! Dieses Crate implementiert die Server-Seite eines Stammtisch-Raums:
//! Verbindungen annehmen, Beitritte pruefen, die Mitgliederliste fuehren
//! und Nachrichten an die richtigen Teilnehmer verteilen.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (ConnectionAcceptor)
//!     |
//!     v
//! Verbindungs-Task (pro Verbindung ein Task)
//!     |  Handshake: genau ein JoinRequest -> JoinAccepted/JoinRefused
//!     |
//!     v
//! Router (Chat weiterleiten, Leave/Kick/Shutdown-Sequenzen)
//!     |
//!     v
//! SessionRegistry – einzige Quelle der Wahrheit fuer die Mitgliederliste
//!
//! RoomServer – Fassade fuer die Praesentationsschicht
//! ```
//!
//! Der Besitzer ist kein Mitglied der Registry: er wird im `Raum`
//! gefuehrt und ist von Kick- und Leave-Pfaden ausgenommen.

pub mod acceptor;
pub mod auth;
pub mod error;
pub mod raum;
pub mod registry;
pub mod router;
pub mod server;
pub mod state;

// Bequeme Re-Exporte
pub use auth::{beitritt_pruefen, Zutritt};
pub use error::{RaumResult, RoomError};
pub use raum::Raum;
pub use registry::SessionRegistry;
pub use server::{RaumEreignis, RoomServer};
