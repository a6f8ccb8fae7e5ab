//! WhatsApp command classification
//!
//! Stateless per-message classification: control commands are recognized by
//! pattern, everything else is free-text transaction input. No session state
//! is kept between messages.

use std::sync::OnceLock;

use regex::Regex;

/// One classified inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Balance,
    Report,
    /// Link this sender to the account registered under the captured email
    Link(String),
    /// Free-text transaction input
    Transaction(String),
}

fn help_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(help|bantuan|menu|tolong|info)\s*$").unwrap())
}

fn balance_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(cek\s+)?(saldo|balance)\s*$").unwrap())
}

fn report_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(laporan|report)\s*$").unwrap())
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:link|tautkan|hubungkan)\s+(\S+@\S+\.\S+)\s*$").unwrap()
    })
}

/// Classify one message body
pub fn classify(body: &str) -> Command {
    if help_re().is_match(body) {
        return Command::Help;
    }
    if balance_re().is_match(body) {
        return Command::Balance;
    }
    if report_re().is_match(body) {
        return Command::Report;
    }
    if let Some(caps) = link_re().captures(body) {
        return Command::Link(caps[1].to_lowercase());
    }
    Command::Transaction(body.trim().to_string())
}
