//! Candidate validation and coercion into canonical transactions

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::{NewTransaction, ParsedCandidate, TransactionSource, TransactionType};

/// Sanity ceiling for a single transaction amount (Rupiah)
pub const MAX_AMOUNT: f64 = 999_999_999_999.0;

/// Maximum description length after trimming
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Validate a parsed candidate and coerce it into an insertable transaction
///
/// Pure transformation: persistence stays with the caller. Validation order
/// is type, amount, description, category; the first violation wins and is
/// tagged with the offending field.
pub fn normalize(
    candidate: &ParsedCandidate,
    user_id: &str,
    source: TransactionSource,
    raw_input: Option<&str>,
) -> Result<NewTransaction> {
    let tx_type = TransactionType::from_str(&candidate.tx_type)
        .map_err(|_| Error::validation("type", format!("must be income or expense, got '{}'", candidate.tx_type)))?;

    if !candidate.amount.is_finite() || candidate.amount <= 0.0 {
        return Err(Error::validation("amount", "must be a positive number"));
    }
    if candidate.amount > MAX_AMOUNT {
        return Err(Error::validation(
            "amount",
            format!("exceeds the maximum of {}", MAX_AMOUNT),
        ));
    }

    let description = candidate.description.trim();
    if description.is_empty() {
        return Err(Error::validation("description", "must not be empty"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(Error::validation(
            "description",
            format!("must be at most {} characters", MAX_DESCRIPTION_LEN),
        ));
    }

    let category = candidate.category.trim();
    if category.is_empty() {
        return Err(Error::validation("category", "must not be empty"));
    }

    Ok(NewTransaction {
        user_id: user_id.to_string(),
        tx_type,
        amount: candidate.amount,
        description: description.to_string(),
        category: category.to_string(),
        source,
        raw_input: raw_input.map(|s| s.to_string()),
    })
}
