use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection string, e.g. "sqlite:./snip.db"
    pub database_url: String,

    /// Host to bind the HTTP server to, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Capacity of the bounded click-recording queue. When the queue is
    /// full, clicks are dropped rather than delaying the redirect.
    pub click_queue_capacity: usize,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse::<u16>()
            .context("PORT must be a valid port number (1–65535)")?;

        let click_queue_capacity = std::env::var("CLICK_QUEUE_CAPACITY")
            .unwrap_or_else(|_| "1024".into())
            .parse::<usize>()
            .context("CLICK_QUEUE_CAPACITY must be a positive integer")?;

        if click_queue_capacity == 0 {
            anyhow::bail!("CLICK_QUEUE_CAPACITY must not be zero");
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./snip.db".into()),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            click_queue_capacity,
        })
    }
}
