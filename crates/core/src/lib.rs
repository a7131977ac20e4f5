//! stammtisch-core – Gemeinsame Typen, Grenzwerte und Validierung
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Stammtisch-Crates gemeinsam genutzt werden: die `SessionId`,
//! die Grenzwerte des Protokolls (Namenslaenge, Portbereich, Textlaenge)
//! und die dazugehoerigen Pruef-Funktionen.

pub mod types;
pub mod validierung;

// Re-Exporte fuer bequemen Zugriff
pub use types::SessionId;
pub use validierung::{
    name_pruefen, port_pruefen, text_pruefen, KonfigFehler, MAX_NAME_LAENGE, MAX_TEXT_LAENGE,
    PORT_MAX, PORT_MIN, RESERVIERTE_NAMEN, SYSTEM_AUTOR,
};
