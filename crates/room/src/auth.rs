//! Beitritts-Pruefung
//!
//! Entscheidet ob ein `JoinRequest` zugelassen wird. Reine Funktion ohne
//! Seiteneffekte; der Aufrufer liefert den aktuellen Zustand (Roster,
//! Besitzername, Passwort) als Schnappschuss.
//!
//! Die Reihenfolge der Pruefungen ist Protokollverhalten und darf sich
//! nicht aendern: erst Namenskollision, dann Passwort. Ein Beitritt mit
//! kollidierendem Namen UND falschem Passwort wird als `DuplicateName`
//! abgelehnt.

use stammtisch_core::RESERVIERTE_NAMEN;
use stammtisch_protocol::AblehnungsGrund;

/// Ergebnis der Beitritts-Pruefung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zutritt {
    /// Beitritt zugelassen
    Erlaubt,
    /// Beitritt abgelehnt, Grund geht an den Client zurueck
    Abgelehnt(AblehnungsGrund),
}

/// Prueft eine Beitrittsanfrage gegen den aktuellen Raum-Zustand
///
/// Namen werden nur fuer den Vergleich fallgefaltet; der Anzeigename
/// behaelt seine Gross-/Kleinschreibung. Reservierte Systemnamen zaehlen
/// als Kollision.
pub fn beitritt_pruefen(
    name: &str,
    passwort: &str,
    besitzer_name: &str,
    raum_passwort: &str,
    roster: &[String],
) -> Zutritt {
    let gefaltet = name.to_lowercase();

    let kollidiert = gefaltet == besitzer_name.to_lowercase()
        || roster.iter().any(|n| n.to_lowercase() == gefaltet)
        || RESERVIERTE_NAMEN.iter().any(|r| r.to_lowercase() == gefaltet);

    if kollidiert {
        return Zutritt::Abgelehnt(AblehnungsGrund::DuplicateName);
    }

    if passwort != raum_passwort {
        return Zutritt::Abgelehnt(AblehnungsGrund::WrongPassword);
    }

    Zutritt::Erlaubt
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(namen: &[&str]) -> Vec<String> {
        namen.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn beitritt_erlaubt() {
        let ergebnis = beitritt_pruefen("bob", "secret", "alice", "secret", &roster(&[]));
        assert_eq!(ergebnis, Zutritt::Erlaubt);
    }

    #[test]
    fn kollision_mit_mitglied() {
        let ergebnis = beitritt_pruefen("bob", "secret", "alice", "secret", &roster(&["bob"]));
        assert_eq!(ergebnis, Zutritt::Abgelehnt(AblehnungsGrund::DuplicateName));
    }

    #[test]
    fn kollision_fallunabhaengig() {
        let ergebnis = beitritt_pruefen("Bob", "secret", "alice", "secret", &roster(&["bob"]));
        assert_eq!(ergebnis, Zutritt::Abgelehnt(AblehnungsGrund::DuplicateName));

        let ergebnis = beitritt_pruefen("BOB", "secret", "alice", "secret", &roster(&["bob"]));
        assert_eq!(ergebnis, Zutritt::Abgelehnt(AblehnungsGrund::DuplicateName));
    }

    #[test]
    fn kollision_mit_besitzer() {
        let ergebnis = beitritt_pruefen("Alice", "secret", "alice", "secret", &roster(&[]));
        assert_eq!(ergebnis, Zutritt::Abgelehnt(AblehnungsGrund::DuplicateName));
    }

    #[test]
    fn falsches_passwort() {
        let ergebnis = beitritt_pruefen("bob", "falsch", "alice", "secret", &roster(&[]));
        assert_eq!(ergebnis, Zutritt::Abgelehnt(AblehnungsGrund::WrongPassword));
    }

    #[test]
    fn namenskollision_schlaegt_passwort() {
        // Beide Bedingungen verletzt: Kollision gewinnt
        let ergebnis = beitritt_pruefen("bob", "falsch", "alice", "secret", &roster(&["bob"]));
        assert_eq!(ergebnis, Zutritt::Abgelehnt(AblehnungsGrund::DuplicateName));

        let ergebnis = beitritt_pruefen("alice", "falsch", "alice", "secret", &roster(&[]));
        assert_eq!(ergebnis, Zutritt::Abgelehnt(AblehnungsGrund::DuplicateName));
    }

    #[test]
    fn reservierte_namen_zaehlen_als_kollision() {
        let ergebnis = beitritt_pruefen("System", "secret", "alice", "secret", &roster(&[]));
        assert_eq!(ergebnis, Zutritt::Abgelehnt(AblehnungsGrund::DuplicateName));
    }

    #[test]
    fn keine_seiteneffekte() {
        let r = roster(&["bob", "carla"]);
        let _ = beitritt_pruefen("dana", "secret", "alice", "secret", &r);
        assert_eq!(r, roster(&["bob", "carla"]));
    }
}
