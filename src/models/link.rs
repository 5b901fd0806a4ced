// SPDX-License-Identifier: MIT

//! Generated-link audit records.

use serde::{Deserialize, Serialize};

/// The two supported output URL layouts. "wool" embeds the identity email
/// as the trailing field; "potato" excludes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStyle {
    Potato,
    Wool,
}

/// Append-only audit record of one link-assembly operation. Never mutated;
/// deleted only by bulk clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedLink {
    pub id: String,
    /// The base URL as supplied by the caller, query string and all.
    pub source_url: String,
    pub assembled_url: String,
    pub card_number: String,
    /// Resolved email, or empty for potato links without an identity.
    pub email: String,
    pub style: LinkStyle,
    pub generated_at: String,
}

impl GeneratedLink {
    pub fn new(
        source_url: &str,
        assembled_url: &str,
        card_number: &str,
        email: &str,
        style: LinkStyle,
        now: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_url: source_url.to_string(),
            assembled_url: assembled_url.to_string(),
            card_number: card_number.to_string(),
            email: email.to_string(),
            style,
            generated_at: now.to_string(),
        }
    }
}
