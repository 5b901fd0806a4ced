// SPDX-License-Identifier: MIT

//! Credential records: virtual payment cards with a usage lifecycle.

use crate::models::identity::UsageState;
use serde::{Deserialize, Serialize};

/// A payment card record. Field contents are format-preserved from import;
/// there is no validation beyond presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub zip: String,
    /// Id-based reference to an [`Identity`](crate::models::Identity). A
    /// dangling id silently degrades to "no identity".
    #[serde(default)]
    pub identity_id: Option<String>,
    #[serde(default)]
    pub usage_state: UsageState,
    #[serde(default)]
    pub used_at: Option<String>,
    pub imported_at: String,
}

impl Credential {
    pub fn new(
        card_number: String,
        expiry_month: String,
        expiry_year: String,
        cvv: String,
        zip: String,
        now: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            card_number,
            expiry_month,
            expiry_year,
            cvv,
            zip,
            identity_id: None,
            usage_state: UsageState::Active,
            used_at: None,
            imported_at: now.to_string(),
        }
    }
}

/// Mask a 16-digit card number for display/logs: `4111********1111`.
/// Numbers that are not exactly 16 digits are returned unchanged.
pub fn mask_card_number(card_number: &str) -> String {
    if card_number.len() == 16 && card_number.chars().all(|c| c.is_ascii_digit()) {
        format!("{}********{}", &card_number[..4], &card_number[12..])
    } else {
        card_number.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_card_number() {
        assert_eq!(mask_card_number("4111111111111111"), "4111********1111");
        // Non-16-digit input passes through
        assert_eq!(mask_card_number("411111"), "411111");
        assert_eq!(mask_card_number("4111-1111-1111-1111"), "4111-1111-1111-1111");
    }
}
