//! JSON parsing helpers for extraction backend responses
//!
//! Model responses often wrap the JSON payload in markdown fences or extra
//! prose. These helpers strip the wrapping, with a balanced-brace rescue
//! scan as the second attempt before giving up.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{
    BankStatementFields, ContractFields, DocumentType, InvoiceFields, ParsedCandidate,
    ParsedDocument, PurchaseOrderFields, ReceiptFields, StockCardFields,
};

use super::types::DocumentExtraction;

/// Strip markdown code fences from a response, if present
fn strip_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the fence line ("```json" or bare "```") and the closing fence
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Find the first balanced `{...}` substring
fn first_balanced_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in response[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..=start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract the JSON payload from a model response
///
/// First attempt: parse the fence-stripped response as-is. Second attempt:
/// scan for the first balanced object. Both failing is `MalformedResponse`.
pub fn extract_json(response: &str) -> Result<Value> {
    let stripped = strip_fences(response);

    if let Ok(value) = serde_json::from_str(stripped) {
        return Ok(value);
    }

    if let Some(object) = first_balanced_object(stripped) {
        if let Ok(value) = serde_json::from_str(object) {
            return Ok(value);
        }
    }

    let truncated = if response.len() > 200 {
        format!("{}...", &response[..200])
    } else {
        response.to_string()
    };
    Err(Error::MalformedResponse(format!(
        "no JSON payload found | Raw: {}",
        truncated
    )))
}

/// Parse a transaction candidate from a model response
///
/// Validates after parse: `type` must be income or expense, `amount` must be
/// a positive finite number. Confidence is clamped into [0, 1].
pub fn parse_candidate(response: &str) -> Result<ParsedCandidate> {
    let value = extract_json(response)?;
    let mut candidate: ParsedCandidate = serde_json::from_value(value)
        .map_err(|e| Error::MalformedResponse(format!("candidate fields: {}", e)))?;

    let tx_type = candidate.tx_type.trim().to_lowercase();
    if tx_type != "income" && tx_type != "expense" {
        return Err(Error::InvalidType(candidate.tx_type));
    }
    candidate.tx_type = tx_type;

    if !candidate.amount.is_finite() || candidate.amount <= 0.0 {
        return Err(Error::InvalidAmount(candidate.amount));
    }

    candidate.confidence = candidate.confidence.clamp(0.0, 1.0);
    Ok(candidate)
}

/// Parse a document extraction from a model response
///
/// The payload carries `raw_text` plus the type-specific fields, either
/// nested under `parsed` or at the top level. The resulting variant always
/// matches the requested document type.
pub fn parse_document(response: &str, document_type: DocumentType) -> Result<DocumentExtraction> {
    let value = extract_json(response)?;

    let raw_text = value
        .get("raw_text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let fields = value.get("parsed").cloned().unwrap_or(value);

    let map_err = |e: serde_json::Error| Error::MalformedResponse(format!("document fields: {}", e));
    let parsed = match document_type {
        DocumentType::Invoice => {
            ParsedDocument::Invoice(serde_json::from_value::<InvoiceFields>(fields).map_err(map_err)?)
        }
        DocumentType::PurchaseOrder => ParsedDocument::PurchaseOrder(
            serde_json::from_value::<PurchaseOrderFields>(fields).map_err(map_err)?,
        ),
        DocumentType::BankStatement => ParsedDocument::BankStatement(
            serde_json::from_value::<BankStatementFields>(fields).map_err(map_err)?,
        ),
        DocumentType::StockCard => ParsedDocument::StockCard(
            serde_json::from_value::<StockCardFields>(fields).map_err(map_err)?,
        ),
        DocumentType::Contract => {
            ParsedDocument::Contract(serde_json::from_value::<ContractFields>(fields).map_err(map_err)?)
        }
        DocumentType::Receipt | DocumentType::Auto => {
            ParsedDocument::Receipt(serde_json::from_value::<ReceiptFields>(fields).map_err(map_err)?)
        }
    };

    Ok(DocumentExtraction { raw_text, parsed })
}
