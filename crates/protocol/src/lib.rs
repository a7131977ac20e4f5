//! stammtisch-protocol – Wire-Format und Nachrichtentypen
//!
//! Saemtlicher Verkehr auf einer Verbindung besteht aus `Envelope`-Frames:
//! ein u32-Laengenfeld (big-endian) gefolgt von einem JSON-serialisierten
//! Tagged Enum. Es gibt keinen zweiten Kanal fuer Rohtext – auch
//! Chat-Nachrichten sind gewoehnliche Envelopes.

pub mod envelope;
pub mod wire;

// Bequeme Re-Exporte
pub use envelope::{AblehnungsGrund, Envelope};
pub use wire::{read_frame, write_frame, FrameCodec, LAENGEN_FELD_GROESSE, MAX_FRAME_GROESSE};
