//! Colloquial amount normalization
//!
//! Converts Indonesian magnitude words and slang embedded in free text into
//! numeric values ("50 ribu" -> 50_000). Deterministic, no I/O, total: any
//! unparseable input yields 0.0. This is the quick fallback path; the
//! extraction backend performs equivalent reasoning and returns a numeric
//! amount directly.

use std::sync::OnceLock;

use regex::Regex;

/// Fixed slang values, substituted as digit strings
const SLANG: &[(&str, &str)] = &[
    (r"\bceban\b", "10000"),
    (r"\bceng\b", "1000"),
    (r"\bgopek\b", "500"),
];

fn thousand_sep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d)\.(\d{3})\b").unwrap())
}

fn decimal_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d),(\d)").unwrap())
}

fn magnitude_re() -> &'static Regex {
    // Longer tokens first so "miliar" is not eaten by the bare "m"
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(miliar|juta|ribu|jt|rb|m)\b").unwrap())
}

fn slang_res() -> &'static Vec<(Regex, &'static str)> {
    static RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RES.get_or_init(|| {
        SLANG
            .iter()
            .map(|(pat, digits)| (Regex::new(pat).unwrap(), *digits))
            .collect()
    })
}

fn multiplier(token: &str) -> f64 {
    match token {
        "ribu" | "rb" => 1_000.0,
        "juta" | "jt" => 1_000_000.0,
        "miliar" | "m" => 1_000_000_000.0,
        _ => 1.0,
    }
}

/// Normalize a free-text amount expression to a numeric value
///
/// "50 ribu" -> 50_000, "1,5 juta" -> 1_500_000, "Rp50.000" -> 50_000,
/// "gopek" -> 500. Unparseable input -> 0.0.
pub fn normalize_amount(input: &str) -> f64 {
    let mut text = input.to_lowercase();

    // Strip thousand-separator dots ("1.000.000" -> "1000000"). The regex
    // consumes the leading digit, so grouped numbers need repeated passes.
    loop {
        let replaced = thousand_sep_re().replace_all(&text, "$1$2").into_owned();
        if replaced == text {
            break;
        }
        text = replaced;
    }

    // Decimal comma to dot ("1,5" -> "1.5")
    let text = decimal_comma_re().replace_all(&text, "$1.$2").into_owned();

    // Magnitude words multiply the number they follow
    if let Some(caps) = magnitude_re().captures(&text) {
        let value: f64 = caps[1].parse().unwrap_or(0.0);
        return value * multiplier(&caps[2]);
    }

    // Slang tokens substitute fixed digit strings
    let mut text = text;
    for (re, digits) in slang_res() {
        text = re.replace_all(&text, *digits).into_owned();
    }

    // Drop everything that is not a digit or a dot, then parse
    let cleaned: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    cleaned.parse().unwrap_or(0.0)
}
