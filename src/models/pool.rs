// SPDX-License-Identifier: MIT

//! Credential-pool state and the usage lifecycle.
//!
//! Credentials are partitioned into two disjoint collections: `available`
//! (Active or PartiallyUsed) and `retired` (Used). Membership moves at the
//! moment a credential becomes Used. Identities stay in one collection and
//! carry their state inline.
//!
//! The whole pool is loaded, mutated in memory, and written back as one
//! store commit; these methods are the in-memory half of that cycle.

use crate::error::AppError;
use crate::models::credential::Credential;
use crate::models::identity::{Identity, UsageState};
use crate::models::link::GeneratedLink;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Caller verdict after a link-assembly operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageAction {
    /// Consumption pair fully spent: retire the card, mark the identity Used.
    Used,
    /// First of two uses: both stay available, marked PartiallyUsed.
    Partially,
    /// No state change; the audit log entry still stands.
    Skip,
}

/// In-memory view of the whole credential-pool module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolState {
    #[serde(default)]
    pub identities: Vec<Identity>,
    #[serde(default)]
    pub available: Vec<Credential>,
    #[serde(default)]
    pub retired: Vec<Credential>,
    #[serde(default)]
    pub link_history: Vec<GeneratedLink>,
}

/// Result of a card import batch.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub added: u32,
    pub duplicates: u32,
    pub total: u32,
}

impl PoolState {
    /// Card numbers currently known, across available and retired.
    fn known_card_numbers(&self) -> HashSet<&str> {
        self.available
            .iter()
            .chain(self.retired.iter())
            .map(|c| c.card_number.as_str())
            .collect()
    }

    /// Append parsed cards, rejecting exact card-number duplicates against
    /// the union of both collections.
    pub fn import_cards(&mut self, parsed: Vec<Credential>) -> ImportReport {
        let known: HashSet<String> = self
            .known_card_numbers()
            .into_iter()
            .map(String::from)
            .collect();

        let total = parsed.len() as u32;
        let mut added = 0u32;
        let mut seen_in_batch: HashSet<String> = HashSet::new();

        for card in parsed {
            if known.contains(&card.card_number) || !seen_in_batch.insert(card.card_number.clone())
            {
                continue;
            }
            self.available.push(card);
            added += 1;
        }

        ImportReport {
            added,
            duplicates: total - added,
            total,
        }
    }

    pub fn find_available(&self, card_id: &str) -> Option<&Credential> {
        self.available.iter().find(|c| c.id == card_id)
    }

    pub fn find_card(&self, card_id: &str) -> Option<&Credential> {
        self.available
            .iter()
            .chain(self.retired.iter())
            .find(|c| c.id == card_id)
    }

    pub fn find_identity(&self, identity_id: &str) -> Option<&Identity> {
        self.identities.iter().find(|i| i.id == identity_id)
    }

    /// Auto-pairing rule: a card's linked identity is pre-selected when it
    /// resolves and its allowance still covers a cycle. A dangling link
    /// degrades to None.
    pub fn auto_pair(&self, card: &Credential) -> Option<&Identity> {
        let identity_id = card.identity_id.as_deref()?;
        self.find_identity(identity_id)
            .filter(|i| i.has_uses_left())
    }

    /// Link an identity to an available card by id.
    pub fn assign_identity(&mut self, card_id: &str, identity_id: &str) -> Result<(), AppError> {
        if self.find_identity(identity_id).is_none() {
            return Err(AppError::NotFound(format!(
                "Identity {} not found",
                identity_id
            )));
        }
        let card = self
            .available
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| AppError::NotFound(format!("Card {} not available", card_id)))?;
        card.identity_id = Some(identity_id.to_string());
        Ok(())
    }

    /// Apply a usage verdict to a consumption pair.
    ///
    /// "used" retires the card; "partially" keeps it available so it can be
    /// re-selected for its second cycle; "skip" changes nothing.
    pub fn apply_usage(
        &mut self,
        card_id: &str,
        identity_id: &str,
        action: UsageAction,
        now: &str,
    ) -> Result<(), AppError> {
        if matches!(action, UsageAction::Skip) {
            return Ok(());
        }

        let card_pos = self
            .available
            .iter()
            .position(|c| c.id == card_id)
            .ok_or_else(|| AppError::NotFound(format!("Card {} not available", card_id)))?;
        let identity = self
            .identities
            .iter_mut()
            .find(|i| i.id == identity_id)
            .ok_or_else(|| AppError::NotFound(format!("Identity {} not found", identity_id)))?;

        match action {
            UsageAction::Used => {
                identity.usage_state = UsageState::Used;
                identity.used_at = Some(now.to_string());

                let mut card = self.available.remove(card_pos);
                card.usage_state = UsageState::Used;
                card.used_at = Some(now.to_string());
                self.retired.push(card);
            }
            UsageAction::Partially => {
                identity.usage_state = UsageState::PartiallyUsed;
                identity.used_at = Some(now.to_string());

                let card = &mut self.available[card_pos];
                card.usage_state = UsageState::PartiallyUsed;
                card.used_at = Some(now.to_string());
            }
            UsageAction::Skip => unreachable!(),
        }

        Ok(())
    }

    /// Operator escape hatch: force a card into any state, moving it between
    /// collections to keep the Used <=> retired invariant.
    pub fn override_card_state(
        &mut self,
        card_id: &str,
        new_state: UsageState,
        now: &str,
    ) -> Result<(), AppError> {
        let from_available = self.available.iter().position(|c| c.id == card_id);
        let from_retired = self.retired.iter().position(|c| c.id == card_id);

        let mut card = match (from_available, from_retired) {
            (Some(pos), _) => self.available.remove(pos),
            (None, Some(pos)) => self.retired.remove(pos),
            (None, None) => {
                return Err(AppError::NotFound(format!("Card {} not found", card_id)))
            }
        };

        card.usage_state = new_state;
        card.used_at = match new_state {
            UsageState::Active => None,
            _ => card.used_at.or_else(|| Some(now.to_string())),
        };

        match new_state {
            UsageState::Used => self.retired.push(card),
            _ => self.available.push(card),
        }

        Ok(())
    }

    /// Operator escape hatch for identities.
    pub fn override_identity_state(
        &mut self,
        identity_id: &str,
        new_state: UsageState,
        now: &str,
    ) -> Result<(), AppError> {
        let identity = self
            .identities
            .iter_mut()
            .find(|i| i.id == identity_id)
            .ok_or_else(|| AppError::NotFound(format!("Identity {} not found", identity_id)))?;

        identity.usage_state = new_state;
        identity.used_at = match new_state {
            UsageState::Active => None,
            _ => identity.used_at.take().or_else(|| Some(now.to_string())),
        };

        Ok(())
    }

    /// Explicit operator deletion of a card, from whichever collection
    /// holds it.
    pub fn remove_card(&mut self, card_id: &str) -> Result<(), AppError> {
        let before = self.available.len() + self.retired.len();
        self.available.retain(|c| c.id != card_id);
        self.retired.retain(|c| c.id != card_id);
        if self.available.len() + self.retired.len() == before {
            return Err(AppError::NotFound(format!("Card {} not found", card_id)));
        }
        Ok(())
    }

    /// Explicit operator deletion of an identity. Cards referencing it keep
    /// their id and dangle silently.
    pub fn remove_identity(&mut self, identity_id: &str) -> Result<(), AppError> {
        let before = self.identities.len();
        self.identities.retain(|i| i.id != identity_id);
        if self.identities.len() == before {
            return Err(AppError::NotFound(format!(
                "Identity {} not found",
                identity_id
            )));
        }
        Ok(())
    }
}
