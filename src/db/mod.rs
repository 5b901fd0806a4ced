//! Database layer (flat key-value record store).

pub mod records;

pub use records::RecordStore;

/// Record store keys as constants. One JSON blob per key.
pub mod keys {
    // Tracker module
    pub const TRANSACTIONS: &str = "transactions";
    pub const WIPE_LOGS: &str = "wipe_logs";
    pub const STATS: &str = "stats";
    pub const DAILY_GOAL: &str = "daily_goal";
    /// Rolling backup list (last 10 snapshots)
    pub const BACKUPS: &str = "backups";

    // Credential-pool module
    pub const POOL_IDENTITIES: &str = "pool_identities";
    pub const POOL_AVAILABLE_CARDS: &str = "pool_available_cards";
    pub const POOL_RETIRED_CARDS: &str = "pool_retired_cards";
    pub const POOL_LINK_HISTORY: &str = "pool_link_history";
    /// Rolling backup list for the pool module (last 10 snapshots)
    pub const POOL_BACKUPS: &str = "pool_backups";
}
