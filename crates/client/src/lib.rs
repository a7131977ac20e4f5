//! stammtisch-client – Client-Seite des Stammtisch-Protokolls
//!
//! Stellt eine `ClientSession` bereit die den Beitritt zu einem Raum,
//! das Senden von Nachrichten und das Abholen eingehender Ereignisse
//! kapselt. Die Session durchlaeuft pro Verbindungsversuch die Zustaende
//! Getrennt -> Verbindet -> Handshake -> Verbunden -> Getrennt und ist
//! danach fuer einen neuen Versuch wiederverwendbar.

pub mod fehler;
pub mod session;

// Bequeme Re-Exporte
pub use fehler::BeitrittsFehler;
pub use session::{ClientEreignis, ClientSession, RaumInfo, SessionZustand, Zugangsdaten};
