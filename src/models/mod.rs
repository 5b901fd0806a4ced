// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod backup;
pub mod credential;
pub mod identity;
pub mod link;
pub mod pool;
pub mod summary;
pub mod transaction;

pub use backup::{BackupEntry, BackupSummary};
pub use credential::Credential;
pub use identity::{Identity, UsageState};
pub use link::{GeneratedLink, LinkStyle};
pub use pool::{PoolState, UsageAction};
pub use transaction::{PaymentMethod, TrackerStats, Transaction, WipeLog};
