//! WhatsApp channel adapter
//!
//! Inbound messages carry a sender address, body text, and zero or more
//! media attachments. Voice notes are transcribed and treated as text
//! transaction input; images get a feature-pending reply; everything else
//! goes through the command router. User resolution happens per message by
//! sender address, synthesizing a pseudo-user for unlinked senders.
//!
//! This is the only channel that chains a second, independent extraction
//! provider: the sender has no UI to retry from, so a transient primary
//! failure falls back once before the failure reply.

use tracing::{debug, warn};

use crate::ai::{ExtractionBackend, ExtractionClient};
use crate::channels::router::{self, Command};
use crate::channels::voice::fallback_confirmation;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{ParsedCandidate, TransactionSource};
use crate::normalize::normalize;
use crate::policy::CommitPolicy;

/// One inbound media attachment, already fetched by the transport layer
#[derive(Debug, Clone)]
pub struct InboundMedia {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// One inbound WhatsApp message
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Sender address, e.g. "whatsapp:+6281234567890"
    pub sender: String,
    pub body: String,
    pub media: Vec<InboundMedia>,
}

/// WhatsApp channel front-end
pub struct WhatsAppAdapter<'a> {
    db: &'a Database,
    primary: &'a ExtractionClient,
    fallback: Option<&'a ExtractionClient>,
    policy: CommitPolicy,
}

impl<'a> WhatsAppAdapter<'a> {
    pub fn new(
        db: &'a Database,
        primary: &'a ExtractionClient,
        fallback: Option<&'a ExtractionClient>,
        policy: CommitPolicy,
    ) -> Self {
        Self {
            db,
            primary,
            fallback,
            policy,
        }
    }

    /// Handle one inbound message, returning the reply body
    ///
    /// Pipeline failures become user-facing reply text; only infrastructure
    /// errors (the store itself) propagate as Err.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<String> {
        let user_id = self.db.resolve_whatsapp_user(&msg.sender)?;
        let body = msg.body.trim();

        if !self.db.sender_seen(&msg.sender)? {
            self.db.mark_sender_seen(&msg.sender)?;
            if body.is_empty() && msg.media.is_empty() {
                return Ok(replies::welcome());
            }
        }

        if let Some(media) = msg.media.first() {
            if media.content_type.starts_with("audio/") {
                let transcript = match self
                    .primary
                    .transcribe_audio(&media.data, &media.content_type)
                    .await
                {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Voice note transcription failed");
                        return Ok(replies::for_error(&e));
                    }
                };
                debug!(transcript = %transcript, "Transcribed voice note");
                return self.record_transaction(&user_id, &transcript).await;
            }
            if media.content_type.starts_with("image/") {
                return Ok(replies::image_pending());
            }
            return Ok(replies::unsupported_media());
        }

        match router::classify(body) {
            Command::Help => Ok(replies::help_text()),
            Command::Balance => {
                let summary = self.db.user_summary(&user_id)?;
                Ok(replies::balance_text(&summary))
            }
            Command::Report => Ok(replies::report_text()),
            Command::Link(email) => match self.db.link_whatsapp_user(&msg.sender, &email)? {
                Some(_) => Ok(replies::link_success(&email)),
                None => Ok(replies::link_failure(&email)),
            },
            Command::Transaction(text) => self.record_transaction(&user_id, &text).await,
        }
    }

    /// Free-text transaction flow: extract, normalize, gate, persist
    ///
    /// The channel has no confirmation UI, so it always requests auto-save;
    /// the confidence gate still decides whether anything is persisted.
    async fn record_transaction(&self, user_id: &str, text: &str) -> Result<String> {
        let candidate = match self.extract_with_fallback(text).await {
            Ok(candidate) => candidate,
            Err(e) => return Ok(replies::for_error(&e)),
        };

        let record = match normalize(&candidate, user_id, TransactionSource::Whatsapp, Some(text)) {
            Ok(record) => record,
            Err(e) => return Ok(replies::for_error(&e)),
        };

        if !self.policy.decide(&candidate, true).commit {
            debug!(
                confidence = candidate.confidence,
                threshold = self.policy.threshold(),
                "Below auto-commit threshold, asking sender to confirm"
            );
            return Ok(replies::low_confidence(&candidate));
        }

        self.db.save_transaction(&record)?;

        let confirmation = match self.primary.summarize_transaction(&record).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => fallback_confirmation(&record),
            Err(e) => {
                warn!(error = %e, "Confirmation synthesis failed, using fallback text");
                fallback_confirmation(&record)
            }
        };
        Ok(confirmation)
    }

    /// Primary extraction with one cross-provider fallback attempt
    async fn extract_with_fallback(&self, text: &str) -> Result<ParsedCandidate> {
        match self.primary.extract_transaction(text).await {
            Ok(candidate) => Ok(candidate),
            // Empty input will not parse better on another provider
            Err(Error::EmptyInput) => Err(Error::EmptyInput),
            Err(primary_err) => match self.fallback {
                Some(fallback) => {
                    warn!(
                        error = %primary_err,
                        fallback = fallback.host(),
                        "Primary extraction failed, trying fallback provider"
                    );
                    fallback.extract_transaction(text).await
                }
                None => Err(primary_err),
            },
        }
    }
}

/// User-facing reply texts
///
/// Every pipeline error kind maps to exactly one reply, so the mapping is
/// testable independently of the transport.
pub mod replies {
    use crate::error::Error;
    use crate::models::{format_rupiah, ParsedCandidate, UserSummary};

    pub fn welcome() -> String {
        "Halo! Saya asisten pembukuan catat. Kirim pesan seperti 'jual bakso 50 ribu' \
         untuk mencatat transaksi, atau ketik 'bantuan' untuk daftar perintah."
            .to_string()
    }

    pub fn help_text() -> String {
        "Perintah yang tersedia:\n\
         - catat transaksi: kirim kalimat biasa, contoh 'jual bakso 50 ribu'\n\
         - saldo: lihat ringkasan pemasukan dan pengeluaran\n\
         - laporan: tautan laporan lengkap\n\
         - link <email>: hubungkan nomor ini dengan akun terdaftar\n\
         Kirim pesan suara juga bisa!"
            .to_string()
    }

    pub fn balance_text(summary: &UserSummary) -> String {
        format!(
            "Ringkasan keuangan:\n\
             Pemasukan: {}\n\
             Pengeluaran: {}\n\
             Saldo: {}\n\
             ({} transaksi tercatat)",
            format_rupiah(summary.income_total),
            format_rupiah(summary.expense_total),
            format_rupiah(summary.balance),
            summary.transaction_count
        )
    }

    pub fn report_text() -> String {
        "Laporan lengkap tersedia di dasbor catat: buka aplikasi lalu pilih menu Laporan."
            .to_string()
    }

    pub fn link_success(email: &str) -> String {
        format!(
            "Berhasil! Nomor ini sekarang terhubung dengan akun {}. \
             Semua catatan lama ikut dipindahkan.",
            email
        )
    }

    pub fn link_failure(email: &str) -> String {
        format!(
            "Tidak ada akun dengan email {}. Daftar dulu di aplikasi catat, \
             lalu kirim ulang perintah link.",
            email
        )
    }

    pub fn image_pending() -> String {
        "Fitur kirim foto nota lewat WhatsApp segera hadir. \
         Untuk saat ini, unggah foto lewat aplikasi catat ya."
            .to_string()
    }

    pub fn unsupported_media() -> String {
        "Jenis lampiran ini belum didukung. Kirim pesan teks atau pesan suara ya.".to_string()
    }

    pub fn low_confidence(candidate: &ParsedCandidate) -> String {
        format!(
            "Saya menangkap: {} sebesar {} ({}), tapi belum yakin. \
             Belum dicatat. Coba kirim ulang dengan kalimat yang lebih jelas, \
             contoh 'jual bakso 50 ribu'.",
            candidate.description,
            format_rupiah(candidate.amount),
            candidate.category
        )
    }

    /// 1:1 mapping from error kind to reply text
    pub fn for_error(error: &Error) -> String {
        match error {
            Error::EmptyInput => {
                "Pesannya kosong. Kirim kalimat seperti 'jual bakso 50 ribu' ya.".to_string()
            }
            Error::InvalidMedia(_) => {
                "Lampiran tidak bisa diproses. Pastikan formatnya didukung dan ukurannya \
                 di bawah 10MB."
                    .to_string()
            }
            Error::InvalidType(_) | Error::InvalidAmount(_) | Error::MalformedResponse(_) => {
                "Maaf, pesannya belum bisa dipahami. Coba format seperti: \
                 'jual bakso 50 ribu' atau 'beli gas 22 ribu'."
                    .to_string()
            }
            Error::Validation { .. } => {
                "Transaksinya belum lengkap. Sebutkan jenis, barang, dan jumlahnya, \
                 contoh 'jual bakso 50 ribu'."
                    .to_string()
            }
            Error::Timeout => {
                "Prosesnya sedang lambat. Coba kirim ulang sebentar lagi ya.".to_string()
            }
            Error::ConfigurationMissing(_) => {
                "Fitur ini belum aktif di server. Hubungi admin catat ya.".to_string()
            }
            _ => "Ada gangguan sebentar. Coba lagi beberapa saat lagi ya.".to_string(),
        }
    }
}
