//! Raum – Unveraenderliche Stammdaten plus das laufzeit-aenderbare Passwort
//!
//! Name, Besitzer, Adresse und Port stehen nach dem Start fest. Nur das
//! Passwort kann der Besitzer zur Laufzeit aendern.

use parking_lot::RwLock;
use stammtisch_core::{name_pruefen, port_pruefen, KonfigFehler};

/// Stammdaten eines Raums
///
/// Der Besitzer ist hier und nicht in der `SessionRegistry` gefuehrt:
/// er ist ein privilegiertes Pseudo-Mitglied ohne eigene Session.
#[derive(Debug)]
pub struct Raum {
    /// Anzeigename des Raums (maximal 20 Zeichen)
    pub name: String,
    /// Name des Besitzers (maximal 20 Zeichen)
    pub besitzer_name: String,
    /// Bind-Adresse des Servers
    pub adresse: String,
    /// Port (1024 bis 60000)
    pub port: u16,
    /// Raum-Passwort, zur Laufzeit aenderbar
    passwort: RwLock<String>,
}

impl Raum {
    /// Erstellt einen Raum und prueft alle Eingaben
    ///
    /// Der Port kommt als String aus der Konfigurationsflaeche des
    /// Aufrufers und wird hier geparst und auf den Bereich geprueft.
    pub fn neu(
        name: impl Into<String>,
        besitzer_name: impl Into<String>,
        adresse: impl Into<String>,
        port: &str,
        passwort: impl Into<String>,
    ) -> Result<Self, KonfigFehler> {
        let name = name.into();
        let besitzer_name = besitzer_name.into();

        name_pruefen(&name)?;
        name_pruefen(&besitzer_name)?;
        let port = port_pruefen(port)?;

        Ok(Self {
            name,
            besitzer_name,
            adresse: adresse.into(),
            port,
            passwort: RwLock::new(passwort.into()),
        })
    }

    /// Gibt das aktuelle Passwort zurueck
    pub fn passwort(&self) -> String {
        self.passwort.read().clone()
    }

    /// Setzt ein neues Raum-Passwort
    pub fn passwort_setzen(&self, neu: impl Into<String>) {
        *self.passwort.write() = neu.into();
        tracing::info!("Raum-Passwort geaendert");
    }

    /// Gibt die Bind-Adresse als "adresse:port" zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.adresse, self.port)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raum_mit_gueltigen_daten() {
        let raum = Raum::neu("Alice's Room", "alice", "127.0.0.1", "5000", "secret").unwrap();
        assert_eq!(raum.name, "Alice's Room");
        assert_eq!(raum.besitzer_name, "alice");
        assert_eq!(raum.port, 5000);
        assert_eq!(raum.passwort(), "secret");
        assert_eq!(raum.bind_adresse(), "127.0.0.1:5000");
    }

    #[test]
    fn ungueltiger_port_wird_abgelehnt() {
        assert!(matches!(
            Raum::neu("Raum", "alice", "0.0.0.0", "80", "pw"),
            Err(KonfigFehler::PortAusserhalb(80))
        ));
        assert!(matches!(
            Raum::neu("Raum", "alice", "0.0.0.0", "port", "pw"),
            Err(KonfigFehler::PortKeineZahl(_))
        ));
    }

    #[test]
    fn zu_langer_name_wird_abgelehnt() {
        let lang = "x".repeat(21);
        assert!(Raum::neu(&lang, "alice", "0.0.0.0", "5000", "pw").is_err());
        assert!(Raum::neu("Raum", &lang, "0.0.0.0", "5000", "pw").is_err());
    }

    #[test]
    fn passwort_aenderung() {
        let raum = Raum::neu("Raum", "alice", "0.0.0.0", "5000", "alt").unwrap();
        raum.passwort_setzen("neu");
        assert_eq!(raum.passwort(), "neu");
    }
}
