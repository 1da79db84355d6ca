//! Records shared between the storage listing, the database layer and the API.

use serde::{Deserialize, Serialize};

/// A resolvable image discovered in the asset bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Object key inside the bucket (`prefix + name`).
    pub path: String,
    /// File name without the prefix.
    pub name: String,
    /// Public URL the client renderer loads.
    pub url: String,
}

/// Fields of a validated score submission, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreFields {
    pub slug: String,
    pub score: i64,
    pub run_ms: i64,
    pub seed: String,
    pub issued_at: String,
    /// Truncated SHA-256 of the client address, for abuse triage only.
    pub ip_hash: String,
}

/// A leaderboard row as read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub score: i64,
    pub run_ms: i64,
    pub created_at: i64,
}
