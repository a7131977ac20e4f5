//! Grenzwerte und Eingabe-Pruefung
//!
//! Alle Grenzen die sowohl der Server als auch der Client durchsetzen:
//! Namenslaenge, reservierte Namen, Portbereich und Textlaenge. Die
//! Pruef-Funktionen sind rein und werden vor jedem Verbindungsaufbau
//! bzw. Serverstart aufgerufen.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Grenzwerte
// ---------------------------------------------------------------------------

/// Maximale Laenge fuer Raum-, Besitzer- und Anzeigenamen
pub const MAX_NAME_LAENGE: usize = 20;

/// Maximale Laenge einer Chat-Nachricht in Bytes
pub const MAX_TEXT_LAENGE: usize = 4096;

/// Kleinster zulaessiger Port (unterhalb liegen privilegierte Ports)
pub const PORT_MIN: u16 = 1024;

/// Groesster zulaessiger Port
pub const PORT_MAX: u16 = 60000;

/// Autor-Name fuer systemgenerierte Nachrichten (Join/Leave/Kick)
pub const SYSTEM_AUTOR: &str = "System";

/// Namen die kein Teilnehmer tragen darf (Systemautor in beiden Sprachen)
pub const RESERVIERTE_NAMEN: &[&str] = &["System", "Syst\u{e8}me"];

// ---------------------------------------------------------------------------
// Fehlertyp
// ---------------------------------------------------------------------------

/// Konfigurations- und Eingabefehler, vor dem Start bzw. Verbindungsaufbau
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KonfigFehler {
    /// Port ausserhalb des zulaessigen Bereichs
    #[error("Ungueltiger Port {0}: erlaubt ist {PORT_MIN} bis {PORT_MAX}")]
    PortAusserhalb(u32),

    /// Port ist keine Zahl
    #[error("Ungueltiger Port '{0}': keine Zahl")]
    PortKeineZahl(String),

    /// Name ist leer
    #[error("Name darf nicht leer sein")]
    NameLeer,

    /// Name ueberschreitet die Maximallaenge
    #[error("Name zu lang: {0} Zeichen (Maximum: {MAX_NAME_LAENGE})")]
    NameZuLang(usize),

    /// Name ist fuer das System reserviert
    #[error("Name '{0}' ist reserviert")]
    NameReserviert(String),

    /// Nachricht ist leer
    #[error("Nachricht darf nicht leer sein")]
    TextLeer,

    /// Nachricht ueberschreitet die Maximallaenge
    #[error("Nachricht zu lang: {0} Bytes (Maximum: {MAX_TEXT_LAENGE})")]
    TextZuLang(usize),
}

// ---------------------------------------------------------------------------
// Pruef-Funktionen
// ---------------------------------------------------------------------------

/// Parst einen Port aus einem String und prueft den zulaessigen Bereich
///
/// Die Portangabe kommt aus der Konfigurationsdatei bzw. dem Eingabefeld
/// des Aufrufers als String an.
pub fn port_pruefen(port: &str) -> Result<u16, KonfigFehler> {
    let zahl: u32 = port
        .trim()
        .parse()
        .map_err(|_| KonfigFehler::PortKeineZahl(port.to_string()))?;

    if zahl < u32::from(PORT_MIN) || zahl > u32::from(PORT_MAX) {
        return Err(KonfigFehler::PortAusserhalb(zahl));
    }

    Ok(zahl as u16)
}

/// Prueft einen Raum-, Besitzer- oder Anzeigenamen
///
/// Reservierte Namen werden wie Namenskollisionen behandelt und
/// fallunabhaengig verglichen.
pub fn name_pruefen(name: &str) -> Result<(), KonfigFehler> {
    let name = name.trim();
    if name.is_empty() {
        return Err(KonfigFehler::NameLeer);
    }

    let laenge = name.chars().count();
    if laenge > MAX_NAME_LAENGE {
        return Err(KonfigFehler::NameZuLang(laenge));
    }

    let gefaltet = name.to_lowercase();
    if RESERVIERTE_NAMEN
        .iter()
        .any(|r| r.to_lowercase() == gefaltet)
    {
        return Err(KonfigFehler::NameReserviert(name.to_string()));
    }

    Ok(())
}

/// Prueft den Inhalt einer Chat-Nachricht
pub fn text_pruefen(text: &str) -> Result<(), KonfigFehler> {
    if text.trim().is_empty() {
        return Err(KonfigFehler::TextLeer);
    }

    if text.len() > MAX_TEXT_LAENGE {
        return Err(KonfigFehler::TextZuLang(text.len()));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
