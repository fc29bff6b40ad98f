use sqlx::SqlitePool;
use thiserror::Error;

use crate::{
    cache::LinkCache,
    models::{AnalyticsSummary, Link},
};

/// Failure modes of the put-if-absent insert.
#[derive(Debug, Error)]
pub enum InsertError {
    /// The code already exists. The INSERT itself carries the uniqueness
    /// check, so two concurrent creators can never both claim a code.
    #[error("short code already exists")]
    Conflict,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

// ── Warm-up ────────────────────────────────────────────────────────────────

/// Load every link into the in-memory cache at startup.
pub async fn warm_cache(pool: &SqlitePool, cache: &LinkCache) -> anyhow::Result<()> {
    let links: Vec<Link> =
        sqlx::query_as("SELECT code, long_url, created_at FROM links")
            .fetch_all(pool)
            .await?;

    for link in links {
        cache.set(link.code, link.long_url);
    }

    tracing::info!("Cache warmed with {} link(s)", cache.len());
    Ok(())
}

// ── Links ──────────────────────────────────────────────────────────────────

/// Atomic put-if-absent: insert a new link and return the created row, or
/// `Conflict` if the code is already claimed.
pub async fn insert_link(
    pool: &SqlitePool,
    code: &str,
    long_url: &str,
) -> Result<Link, InsertError> {
    let inserted = sqlx::query("INSERT INTO links (code, long_url) VALUES (?1, ?2)")
        .bind(code)
        .bind(long_url)
        .execute(pool)
        .await;

    if let Err(e) = inserted {
        if e.as_database_error()
            .is_some_and(|d| d.is_unique_violation())
        {
            return Err(InsertError::Conflict);
        }
        return Err(e.into());
    }

    let link: Link =
        sqlx::query_as("SELECT code, long_url, created_at FROM links WHERE code = ?1")
            .bind(code)
            .fetch_one(pool)
            .await?;

    Ok(link)
}

/// Fetch a single link by its short code.
pub async fn get_link(pool: &SqlitePool, code: &str) -> Result<Option<Link>, sqlx::Error> {
    let link: Option<Link> =
        sqlx::query_as("SELECT code, long_url, created_at FROM links WHERE code = ?1")
            .bind(code)
            .fetch_optional(pool)
            .await?;

    Ok(link)
}

// ── Clicks ─────────────────────────────────────────────────────────────────

/// Append one click event. Called from the background recorder worker so the
/// HTTP redirect is never blocked by the analytics write. The foreign key on
/// `code` rejects clicks for links that no longer exist.
pub async fn log_click(
    pool: &SqlitePool,
    code: &str,
    browser_family: &str,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
    referrer: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO clicks (code, browser_family, ip_address, user_agent, referrer)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(code)
    .bind(browser_family)
    .bind(ip_address)
    .bind(user_agent)
    .bind(referrer)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fold the click log for one code into its summary. A link with zero clicks
/// yields `total_clicks = 0` and empty breakdowns, not an error; whether the
/// link exists at all is the caller's question to ask.
pub async fn summarize_clicks(
    pool: &SqlitePool,
    code: &str,
) -> Result<AnalyticsSummary, sqlx::Error> {
    let total_clicks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clicks WHERE code = ?1")
        .bind(code)
        .fetch_one(pool)
        .await?;

    let by_browser: Vec<(String, i64)> = sqlx::query_as(
        "SELECT browser_family, COUNT(*) FROM clicks
         WHERE code = ?1
         GROUP BY browser_family",
    )
    .bind(code)
    .fetch_all(pool)
    .await?;

    let by_date: Vec<(String, i64)> = sqlx::query_as(
        "SELECT date(clicked_at) AS day, COUNT(*) FROM clicks
         WHERE code = ?1
         GROUP BY day
         ORDER BY day DESC
         LIMIT 7",
    )
    .bind(code)
    .fetch_all(pool)
    .await?;

    Ok(AnalyticsSummary {
        total_clicks,
        by_browser: by_browser.into_iter().collect(),
        by_date: by_date.into_iter().collect(),
    })
}
