use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dashboard operator allowed to run attendance sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: String,
    /// Stored lowercased.
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
