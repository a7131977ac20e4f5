//! SessionRegistry – Einzige Quelle der Wahrheit fuer verbundene Teilnehmer
//!
//! Haelt pro Mitglied genau einen `SessionEintrag` (ID, Anzeigename,
//! Sende-Queue) in Beitrittsreihenfolge. Das Roster wird bei Bedarf aus
//! dieser Liste abgeleitet und nie separat gefuehrt – es kann dadurch
//! nicht von der tatsaechlichen Mitgliedschaft abweichen.
//!
//! ## Sende-Politik
//! Alle Sendungen sind best-effort via `try_send`: eine volle oder
//! geschlossene Queue wird geloggt und toleriert. Ein fehlgeschlagenes
//! Senden an einen Teilnehmer bricht die Zustellung an die uebrigen nie ab.

use parking_lot::RwLock;
use stammtisch_core::SessionId;
use stammtisch_protocol::Envelope;
use tokio::sync::mpsc;

use crate::error::RoomError;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Sende-Queue pro Session
pub const SENDE_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// SessionEintrag
// ---------------------------------------------------------------------------

/// Registry-Eintrag eines verbundenen Teilnehmers
///
/// Die Sende-Queue gehoert exklusiv der Registry; mit dem Entfernen des
/// Eintrags wird sie fallen gelassen und der Verbindungs-Task beendet
/// sich nach dem Leeren der Queue von selbst.
#[derive(Debug)]
pub struct SessionEintrag {
    /// Stabile ID fuer die Lebensdauer der Verbindung
    pub id: SessionId,
    /// Anzeigename in Original-Schreibweise
    pub anzeige_name: String,
    /// Sende-Queue zum Verbindungs-Task
    tx: mpsc::Sender<Envelope>,
}

impl SessionEintrag {
    /// Reiht eine Nachricht nicht-blockierend in die Sende-Queue ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    fn senden(&self, envelope: Envelope) -> bool {
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(session = %self.id, "Sende-Queue voll - Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(session = %self.id, "Sende-Queue geschlossen (Teilnehmer getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

/// Verwaltet alle verbundenen Teilnehmer unter einem einzigen Lock
///
/// Mutationen kommen ausschliesslich vom Acceptor (Beitritt) und vom
/// Router (Leave/Kick/Disconnect/Shutdown). Die Vec-Reihenfolge ist die
/// Beitrittsreihenfolge.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    eintraege: RwLock<Vec<SessionEintrag>>,
}

impl SessionRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self {
            eintraege: RwLock::new(Vec::new()),
        }
    }

    /// Registriert einen neuen Teilnehmer
    ///
    /// Prueft die Eindeutigkeits-Invariante unter dem Write-Lock erneut,
    /// damit zwei gleichzeitige Handshakes mit demselben Namen nicht
    /// beide durchkommen. Die Beitritts-Pruefung laeuft vorher; hier
    /// abgewiesen zu werden ist der seltene Wettlauf-Fall.
    pub fn hinzufuegen(
        &self,
        anzeige_name: impl Into<String>,
        tx: mpsc::Sender<Envelope>,
    ) -> Result<SessionId, RoomError> {
        let anzeige_name = anzeige_name.into();
        let gefaltet = anzeige_name.to_lowercase();

        let mut eintraege = self.eintraege.write();
        if eintraege
            .iter()
            .any(|e| e.anzeige_name.to_lowercase() == gefaltet)
        {
            return Err(RoomError::NameVergeben(anzeige_name));
        }

        let id = SessionId::new();
        eintraege.push(SessionEintrag {
            id,
            anzeige_name: anzeige_name.clone(),
            tx,
        });

        tracing::debug!(session = %id, name = %anzeige_name, "Session registriert");
        Ok(id)
    }

    /// Entfernt einen Teilnehmer (idempotent)
    ///
    /// Gibt den entfernten Eintrag zurueck, falls er noch vorhanden war.
    pub fn entfernen(&self, id: &SessionId) -> Option<SessionEintrag> {
        let mut eintraege = self.eintraege.write();
        let pos = eintraege.iter().position(|e| &e.id == id)?;
        let eintrag = eintraege.remove(pos);
        tracing::debug!(session = %id, name = %eintrag.anzeige_name, "Session entfernt");
        Some(eintrag)
    }

    /// Entfernt alle Teilnehmer und gibt ihre Eintraege zurueck
    pub fn leeren(&self) -> Vec<SessionEintrag> {
        std::mem::take(&mut *self.eintraege.write())
    }

    /// Konsistenter Roster-Schnappschuss in Beitrittsreihenfolge
    pub fn roster(&self) -> Vec<String> {
        self.eintraege
            .read()
            .iter()
            .map(|e| e.anzeige_name.clone())
            .collect()
    }

    /// Sucht eine Session anhand des Anzeigenamens
    pub fn finde_nach_name(&self, name: &str) -> Option<SessionId> {
        self.eintraege
            .read()
            .iter()
            .find(|e| e.anzeige_name == name)
            .map(|e| e.id)
    }

    /// Gibt den Anzeigenamen einer Session zurueck
    pub fn name_von(&self, id: &SessionId) -> Option<String> {
        self.eintraege
            .read()
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.anzeige_name.clone())
    }

    /// Sendet eine Nachricht an einen einzelnen Teilnehmer
    ///
    /// Gibt `true` zurueck wenn die Session gefunden und die Nachricht
    /// eingereiht wurde.
    pub fn senden_an(&self, id: &SessionId, envelope: Envelope) -> bool {
        match self.eintraege.read().iter().find(|e| &e.id == id) {
            Some(eintrag) => eintrag.senden(envelope),
            None => {
                tracing::debug!(session = %id, "Senden an unbekannte Session");
                false
            }
        }
    }

    /// Sendet eine Nachricht an alle Teilnehmer
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_alle_senden(&self, envelope: Envelope) -> usize {
        let eintraege = self.eintraege.read();
        let mut gesendet = 0;
        for eintrag in eintraege.iter() {
            if eintrag.senden(envelope.clone()) {
                gesendet += 1;
            }
        }
        gesendet
    }

    /// Sendet eine Nachricht an alle Teilnehmer ausser einem
    ///
    /// Verhindert dass eine Chat-Nachricht als Duplikat zum Absender
    /// zuruecklaeuft.
    pub fn an_alle_ausser_senden(&self, ausgeschlossen: &SessionId, envelope: Envelope) -> usize {
        let eintraege = self.eintraege.read();
        let mut gesendet = 0;
        for eintrag in eintraege.iter() {
            if &eintrag.id == ausgeschlossen {
                continue;
            }
            if eintrag.senden(envelope.clone()) {
                gesendet += 1;
            }
        }
        gesendet
    }

    /// Gibt die Anzahl der verbundenen Teilnehmer zurueck
    pub fn anzahl(&self) -> usize {
        self.eintraege.read().len()
    }

    /// Prueft ob eine Session registriert ist
    pub fn ist_registriert(&self, id: &SessionId) -> bool {
        self.eintraege.read().iter().any(|e| &e.id == id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_nachricht(text: &str) -> Envelope {
        Envelope::chat("test", text)
    }

    fn registrieren(registry: &SessionRegistry, name: &str) -> (SessionId, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(SENDE_QUEUE_GROESSE);
        let id = registry.hinzufuegen(name, tx).expect("Beitritt muss gelingen");
        (id, rx)
    }

    #[test]
    fn hinzufuegen_und_roster_reihenfolge() {
        let registry = SessionRegistry::neu();
        let (_a, _rxa) = registrieren(&registry, "bob");
        let (_b, _rxb) = registrieren(&registry, "carla");
        let (_c, _rxc) = registrieren(&registry, "dana");

        assert_eq!(registry.roster(), vec!["bob", "carla", "dana"]);
        assert_eq!(registry.anzahl(), 3);
    }

    #[test]
    fn doppelter_name_wird_abgewiesen() {
        let registry = SessionRegistry::neu();
        let (_a, _rxa) = registrieren(&registry, "bob");

        let (tx, _rx) = mpsc::channel(SENDE_QUEUE_GROESSE);
        let ergebnis = registry.hinzufuegen("Bob", tx);
        assert!(matches!(ergebnis, Err(RoomError::NameVergeben(_))));
        assert_eq!(registry.anzahl(), 1);
    }

    #[test]
    fn entfernen_ist_idempotent() {
        let registry = SessionRegistry::neu();
        let (id, _rx) = registrieren(&registry, "bob");

        assert!(registry.entfernen(&id).is_some());
        assert!(registry.entfernen(&id).is_none());
        assert_eq!(registry.anzahl(), 0);
    }

    #[test]
    fn entfernen_erhaelt_reihenfolge() {
        let registry = SessionRegistry::neu();
        let (_a, _rxa) = registrieren(&registry, "bob");
        let (b, _rxb) = registrieren(&registry, "carla");
        let (_c, _rxc) = registrieren(&registry, "dana");

        registry.entfernen(&b);
        assert_eq!(registry.roster(), vec!["bob", "dana"]);
    }

    #[test]
    fn finde_nach_name() {
        let registry = SessionRegistry::neu();
        let (id, _rx) = registrieren(&registry, "bob");

        assert_eq!(registry.finde_nach_name("bob"), Some(id));
        assert_eq!(registry.finde_nach_name("unbekannt"), None);
        assert_eq!(registry.name_von(&id).as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn an_alle_senden() {
        let registry = SessionRegistry::neu();
        let (_a, mut rxa) = registrieren(&registry, "bob");
        let (_b, mut rxb) = registrieren(&registry, "carla");

        let gesendet = registry.an_alle_senden(test_nachricht("an alle"));
        assert_eq!(gesendet, 2);
        assert!(rxa.try_recv().is_ok());
        assert!(rxb.try_recv().is_ok());
    }

    #[tokio::test]
    async fn an_alle_ausser_senden() {
        let registry = SessionRegistry::neu();
        let (a, mut rxa) = registrieren(&registry, "bob");
        let (_b, mut rxb) = registrieren(&registry, "carla");

        let gesendet = registry.an_alle_ausser_senden(&a, test_nachricht("ohne bob"));
        assert_eq!(gesendet, 1);
        assert!(rxa.try_recv().is_err(), "Absender darf nichts empfangen");
        assert!(rxb.try_recv().is_ok());
    }

    #[tokio::test]
    async fn senden_an_geschlossene_queue_wird_toleriert() {
        let registry = SessionRegistry::neu();
        let (a, rxa) = registrieren(&registry, "bob");
        let (_b, mut rxb) = registrieren(&registry, "carla");

        // Empfaenger-Seite von bob schliessen
        drop(rxa);

        // Zustellung an carla darf trotzdem klappen
        let gesendet = registry.an_alle_senden(test_nachricht("weiter"));
        assert_eq!(gesendet, 1);
        assert!(rxb.try_recv().is_ok());
        assert!(registry.senden_an(&a, test_nachricht("direkt")) == false);
    }

    #[test]
    fn leeren_gibt_alle_eintraege_zurueck() {
        let registry = SessionRegistry::neu();
        let (_a, _rxa) = registrieren(&registry, "bob");
        let (_b, _rxb) = registrieren(&registry, "carla");

        let eintraege = registry.leeren();
        assert_eq!(eintraege.len(), 2);
        assert_eq!(registry.anzahl(), 0);
    }
}
