// SPDX-License-Identifier: MIT

//! Bulk-import parsers for credentials and identities.
//!
//! Both parsers are deliberately permissive about layout: they accept the
//! export formats of the upstream card/identity providers as-is, so a
//! copy-paste from either source imports without hand-editing.

use crate::error::AppError;
use crate::models::{Credential, Identity};
use serde_json::Value;

/// Every imported card gets this ZIP, regardless of what the input carries.
const FIXED_ZIP: &str = "07801";

const DEFAULT_PROMO: &str = "$25 off 1x";
const DEFAULT_ALLOWANCE: &str = "1x";

/// Parse a pasted card batch, one card per line, comma-separated.
///
/// Two layouts are recognized per line:
/// - provider CSV export (>= 12 columns): card number, month, year and CVV
///   sit at columns 6-9
/// - legacy short form (>= 4 columns): `cardNumber,expiry,cvv,zip`, where
///   `expiry` is `MM/YY`
///
/// Lines matching neither layout are dropped. Whitespace inside card
/// numbers is stripped, months are zero-padded, and the ZIP is always
/// overwritten with [`FIXED_ZIP`].
pub fn parse_card_lines(input: &str, now: &str) -> Vec<Credential> {
    let mut cards = Vec::new();

    for (line_no, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();

        let card = if parts.len() >= 12 {
            // Category,Provider,Credentials,Description,Name,Number,Month,Year,CVV,...
            Credential::new(
                strip_whitespace(parts[5]),
                pad_month(parts[6]),
                default_if_empty(parts[7], "25"),
                parts[8].to_string(),
                FIXED_ZIP.to_string(),
                now,
            )
        } else if parts.len() >= 4 {
            let (month, year) = split_expiry(parts[1]);
            Credential::new(
                strip_whitespace(parts[0]),
                month,
                year,
                parts[2].to_string(),
                FIXED_ZIP.to_string(),
                now,
            )
        } else {
            tracing::debug!(line = line_no + 1, "Dropping unrecognized card line");
            continue;
        };

        cards.push(card);
    }

    cards
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn pad_month(raw: &str) -> String {
    if raw.is_empty() {
        "01".to_string()
    } else {
        format!("{:0>2}", raw)
    }
}

fn default_if_empty(raw: &str, default: &str) -> String {
    if raw.is_empty() {
        default.to_string()
    } else {
        raw.to_string()
    }
}

/// Legacy expiry token: `MM/YY`, or a bare month with the year defaulted.
fn split_expiry(expiry: &str) -> (String, String) {
    match expiry.split_once('/') {
        Some((month, year)) => (pad_month(month.trim()), default_if_empty(year.trim(), "25")),
        None => (pad_month(expiry), "25".to_string()),
    }
}

/// Parse a pasted identity batch.
///
/// Tried in order: the whole input as a JSON array or object, then
/// line-by-line where each line is a JSON object, a colon-separated record
/// (`email:promo:allowance[:use-by]`), or a comma-separated record
/// (`email,promo,use-by,note...`).
pub fn parse_identity_lines(input: &str, now: &str) -> Result<Vec<Identity>, AppError> {
    let trimmed = input.trim();

    let raw_items: Vec<Value> = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => items,
        Ok(item @ Value::Object(_)) => vec![item],
        _ => {
            let mut items = Vec::new();
            for line in trimmed.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(line) {
                    items.push(value);
                } else {
                    items.push(parse_delimited_line(line));
                }
            }
            items
        }
    };

    let identities: Vec<Identity> = raw_items
        .iter()
        .filter_map(|item| identity_from_value(item, now))
        .collect();

    if identities.is_empty() {
        return Err(AppError::BadRequest(
            "No identities could be parsed from the input".to_string(),
        ));
    }

    Ok(identities)
}

fn parse_delimited_line(line: &str) -> Value {
    let colon_parts: Vec<&str> = line.split(':').map(str::trim).collect();
    if colon_parts.len() >= 3 {
        return serde_json::json!({
            "email": colon_parts[0],
            "promo": default_if_empty(colon_parts[1], DEFAULT_PROMO),
            "usageCount": default_if_empty(colon_parts[2], DEFAULT_ALLOWANCE),
            "useByDate": colon_parts[3..].join(":"),
        });
    }

    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    serde_json::json!({
        "email": parts[0],
        "promo": parts.get(1).map(|s| default_if_empty(s, DEFAULT_PROMO)),
        "useByDate": parts.get(2).copied().unwrap_or(""),
        "additionalInfo": if parts.len() > 3 { parts[3..].join(",") } else { String::new() },
    })
}

fn str_field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| item.get(*k).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

/// Map one raw item to an identity. A bare JSON string counts as an email;
/// objects must carry one. Items without an email are dropped.
fn identity_from_value(item: &Value, now: &str) -> Option<Identity> {
    if let Some(email) = item.as_str() {
        return Some(Identity::new(
            email.to_string(),
            DEFAULT_PROMO.to_string(),
            DEFAULT_ALLOWANCE.to_string(),
            String::new(),
            String::new(),
            now,
        ));
    }

    let email = str_field(item, &["email"])?;
    let promo = str_field(item, &["title", "promo"]).unwrap_or(DEFAULT_PROMO);
    let allowance = str_field(item, &["usage_count", "usageCount"]).unwrap_or(DEFAULT_ALLOWANCE);
    let use_by = str_field(item, &["expiration", "useByDate"]).unwrap_or("");
    let note = str_field(item, &["additionalInfo"])
        .or_else(|| {
            item.get("expiration_info")
                .and_then(|info| info.get("subtitle_text"))
                .and_then(Value::as_str)
        })
        .unwrap_or("");

    Some(Identity::new(
        email.to_string(),
        promo.to_string(),
        allowance.to_string(),
        use_by.to_string(),
        note.to_string(),
        now,
    ))
}
