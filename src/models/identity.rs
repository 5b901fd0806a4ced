// SPDX-License-Identifier: MIT

//! Identity records: promo-bearing email accounts with a consumption
//! allowance.

use serde::{Deserialize, Serialize};

/// Usage lifecycle of an identity or credential.
///
/// The original data shape modelled this as two independent booleans
/// (`isUsed`, `isPartiallyUsed`), which permits both to be true at once; the
/// single enum makes that state unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageState {
    Active,
    PartiallyUsed,
    Used,
}

impl Default for UsageState {
    fn default() -> Self {
        UsageState::Active
    }
}

/// An email + promo record with a consumption allowance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    /// Contact address. Not unique within the pool; duplicate imports are
    /// permitted.
    pub email: String,
    /// Description of the associated discount/offer.
    pub promo_label: String,
    /// Nominal allowance token ("1x", "2x", ...). Only the leading integer
    /// is interpreted.
    pub usage_allowance: String,
    #[serde(default)]
    pub usage_state: UsageState,
    /// Set when the state first leaves Active.
    #[serde(default)]
    pub used_at: Option<String>,
    #[serde(default)]
    pub use_by_date: String,
    #[serde(default)]
    pub note: String,
    pub imported_at: String,
}

impl Identity {
    pub fn new(
        email: String,
        promo_label: String,
        usage_allowance: String,
        use_by_date: String,
        note: String,
        now: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            promo_label,
            usage_allowance,
            usage_state: UsageState::Active,
            used_at: None,
            use_by_date,
            note,
            imported_at: now.to_string(),
        }
    }

    /// How many consumption cycles this identity tolerates, parsed from the
    /// leading integer of the allowance token ("2x" -> 2). Unparseable
    /// tokens count as a single use.
    pub fn allowed_uses(&self) -> u32 {
        let digits: String = self
            .usage_allowance
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().unwrap_or(1)
    }

    /// Whether another consumption cycle is allowed: a partially-used
    /// identity only qualifies when its allowance covers a second use.
    pub fn has_uses_left(&self) -> bool {
        match self.usage_state {
            UsageState::Active => true,
            UsageState::PartiallyUsed => self.allowed_uses() > 1,
            UsageState::Used => false,
        }
    }
}

/// Mask an email for display/logs: `a***e@example.com`.
/// Very short local parts are returned unchanged.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if local.len() > 2 => {
            let first = local.chars().next().unwrap();
            let last = local.chars().last().unwrap();
            format!("{}***{}@{}", first, last, domain)
        }
        _ => email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_uses_parses_leading_integer() {
        let mut identity = Identity::new(
            "a@b.com".into(),
            "$25 off 1x".into(),
            "2x".into(),
            String::new(),
            String::new(),
            "2024-01-15T10:00:00Z",
        );
        assert_eq!(identity.allowed_uses(), 2);

        identity.usage_allowance = "1x".into();
        assert_eq!(identity.allowed_uses(), 1);

        identity.usage_allowance = "10x".into();
        assert_eq!(identity.allowed_uses(), 10);

        identity.usage_allowance = "unknown".into();
        assert_eq!(identity.allowed_uses(), 1);
    }

    #[test]
    fn test_has_uses_left_consults_allowance() {
        let mut identity = Identity::new(
            "a@b.com".into(),
            "$25 off 1x".into(),
            "2x".into(),
            String::new(),
            String::new(),
            "2024-01-15T10:00:00Z",
        );
        assert!(identity.has_uses_left());

        // Second cycle only exists for a 2x allowance
        identity.usage_state = UsageState::PartiallyUsed;
        assert!(identity.has_uses_left());
        identity.usage_allowance = "1x".into();
        assert!(!identity.has_uses_left());

        identity.usage_state = UsageState::Used;
        identity.usage_allowance = "2x".into();
        assert!(!identity.has_uses_left());
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "a***e@example.com");
        // Local parts of <= 2 chars are left alone
        assert_eq!(mask_email("ab@example.com"), "ab@example.com");
        assert_eq!(mask_email("not-an-email"), "not-an-email");
    }

    #[test]
    fn test_usage_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&UsageState::PartiallyUsed).unwrap(),
            "\"partially_used\""
        );
    }
}
