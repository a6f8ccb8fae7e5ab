//! Per-channel front-ends feeding the shared normalization pipeline
//!
//! Each adapter gathers raw input for its channel, invokes the extraction
//! client, and applies the auto-commit policy:
//! - `voice` - plain-text transcripts (client-side speech recognition)
//! - `ocr` - photographed documents, with auto-classification
//! - `whatsapp` - inbound messages (text, voice notes, images)
//! - `router` - WhatsApp command classification

pub mod ocr;
pub mod router;
pub mod voice;
pub mod whatsapp;

pub use ocr::OcrAdapter;
pub use router::Command;
pub use voice::{ParseOutcome, VoiceAdapter};
pub use whatsapp::{InboundMedia, InboundMessage, WhatsAppAdapter};
