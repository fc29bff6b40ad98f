use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

/// A shortened link record from the `links` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Link {
    pub code: String,
    pub long_url: String,
    pub created_at: NaiveDateTime,
}

/// Click statistics for one short code, recomputed on demand from the
/// `clicks` table and never stored.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsSummary {
    pub total_clicks: i64,
    /// Click count per browser family observed for this code.
    pub by_browser: HashMap<String, i64>,
    /// Click count per calendar day, newest seven days only.
    pub by_date: HashMap<String, i64>,
}
