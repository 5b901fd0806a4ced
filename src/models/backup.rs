// SPDX-License-Identifier: MIT

//! Rolling pre-restore backups.

use serde::{Deserialize, Serialize};

/// How many backups each module retains; older entries roll off.
pub const MAX_BACKUPS: usize = 10;

/// One snapshot taken immediately before a destructive restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    pub id: String,
    pub timestamp: String,
    /// Full module state as it stood before the restore.
    pub data: serde_json::Value,
    /// Serialized size in bytes, for listing without the payload.
    pub size: u64,
}

/// Listing view of a backup: metadata only, no payload.
#[derive(Debug, Clone, Serialize)]
pub struct BackupSummary {
    pub id: String,
    pub timestamp: String,
    pub size: u64,
}

impl BackupEntry {
    pub fn new(data: serde_json::Value, now: &str) -> Self {
        let size = data.to_string().len() as u64;
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now.to_string(),
            data,
            size,
        }
    }

    pub fn summary(&self) -> BackupSummary {
        BackupSummary {
            id: self.id.clone(),
            timestamp: self.timestamp.clone(),
            size: self.size,
        }
    }
}

/// Append a backup, evicting the oldest entries past [`MAX_BACKUPS`].
pub fn push_backup(backups: &mut Vec<BackupEntry>, entry: BackupEntry) {
    backups.push(entry);
    if backups.len() > MAX_BACKUPS {
        let excess = backups.len() - MAX_BACKUPS;
        backups.drain(..excess);
    }
}
