use sqlx::SqlitePool;
use url::Url;

use crate::{
    db::{self, InsertError},
    error::AppError,
    models::Link,
};

/// Length of generated codes. 62^7 candidate codes keeps the collision rate
/// negligible at any realistic link count.
pub const CODE_LENGTH: usize = 7;

/// How many fresh candidates to try before giving up on generation.
const MAX_ATTEMPTS: usize = 10;

const ALIAS_MIN_LENGTH: usize = 3;
const ALIAS_MAX_LENGTH: usize = 32;

/// Create a link for `long_url`, claiming the caller's alias when one is
/// given or generating a random code otherwise.
///
/// Uniqueness comes from the store's put-if-absent insert, not from a
/// check-then-insert: a `Conflict` on an alias surfaces as `AliasTaken`,
/// while a `Conflict` on a generated candidate is treated as a collision
/// and re-rolled.
pub async fn create_link(
    pool: &SqlitePool,
    long_url: &str,
    alias: Option<&str>,
) -> Result<Link, AppError> {
    let long_url = validate_url(long_url)?;

    match alias.map(str::trim).filter(|a| !a.is_empty()) {
        Some(alias) => {
            if !is_valid_alias(alias) {
                return Err(AppError::InvalidAlias);
            }
            match db::insert_link(pool, alias, long_url).await {
                Ok(link) => Ok(link),
                Err(InsertError::Conflict) => Err(AppError::AliasTaken(alias.to_owned())),
                Err(InsertError::Database(e)) => Err(e.into()),
            }
        }
        None => generate(pool, long_url, || random_code(CODE_LENGTH)).await,
    }
}

/// Claim a generated code: draw candidates and offer each to the store,
/// re-rolling on `Conflict` up to `MAX_ATTEMPTS` times. Taking the candidate
/// source as a parameter keeps the exhaustion path reachable under test.
async fn generate(
    pool: &SqlitePool,
    long_url: &str,
    mut candidate: impl FnMut() -> String,
) -> Result<Link, AppError> {
    for _ in 0..MAX_ATTEMPTS {
        let code = candidate();
        match db::insert_link(pool, &code, long_url).await {
            Ok(link) => return Ok(link),
            Err(InsertError::Conflict) => continue,
            Err(InsertError::Database(e)) => return Err(e.into()),
        }
    }
    Err(AppError::GenerationExhausted)
}

/// Check that the submitted URL parses as an absolute http(s) URL. Returns
/// the trimmed original text so the stored URL round-trips byte for byte.
fn validate_url(raw: &str) -> Result<&str, AppError> {
    let raw = raw.trim();
    let parsed = Url::parse(raw).map_err(|_| AppError::InvalidUrl)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidUrl);
    }
    Ok(raw)
}

/// Caller-chosen aliases: alphanumeric plus hyphen/underscore, bounded length.
pub fn is_valid_alias(alias: &str) -> bool {
    (ALIAS_MIN_LENGTH..=ALIAS_MAX_LENGTH).contains(&alias.len())
        && alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Generate a random alphanumeric string of the given length.
pub fn random_code(len: usize) -> String {
    use rand::Rng;
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::collections::HashSet;

    async fn test_pool() -> SqlitePool {
        let options = "sqlite::memory:"
            .parse::<SqliteConnectOptions>()
            .unwrap()
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();

        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    #[test]
    fn alias_charset_and_length_are_enforced() {
        assert!(is_valid_alias("ex1"));
        assert!(is_valid_alias("my-link_2"));
        assert!(is_valid_alias(&"a".repeat(32)));

        assert!(!is_valid_alias("ab")); // too short
        assert!(!is_valid_alias(&"a".repeat(33))); // too long
        assert!(!is_valid_alias("has space"));
        assert!(!is_valid_alias("slash/y"));
        assert!(!is_valid_alias("точка"));
    }

    #[test]
    fn random_codes_have_the_right_shape() {
        for _ in 0..50 {
            let code = random_code(CODE_LENGTH);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[tokio::test]
    async fn alias_is_claimed_verbatim() {
        let pool = test_pool().await;
        let link = create_link(&pool, "https://example.com", Some("ex1"))
            .await
            .unwrap();
        assert_eq!(link.code, "ex1");
    }

    #[tokio::test]
    async fn taken_alias_is_rejected_and_link_unchanged() {
        let pool = test_pool().await;
        create_link(&pool, "https://first.example", Some("ex1"))
            .await
            .unwrap();

        let err = create_link(&pool, "https://second.example", Some("ex1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AliasTaken(ref a) if a == "ex1"));

        let link = db::get_link(&pool, "ex1").await.unwrap().unwrap();
        assert_eq!(link.long_url, "https://first.example");
    }

    #[tokio::test]
    async fn bad_alias_is_rejected_before_touching_the_store() {
        let pool = test_pool().await;
        let err = create_link(&pool, "https://example.com", Some("no spaces"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAlias));
    }

    #[tokio::test]
    async fn blank_alias_falls_through_to_generation() {
        let pool = test_pool().await;
        let link = create_link(&pool, "https://example.com", Some("   "))
            .await
            .unwrap();
        assert_eq!(link.code.len(), CODE_LENGTH);
    }

    #[tokio::test]
    async fn generated_code_round_trips_the_exact_url() {
        let pool = test_pool().await;
        let submitted = "https://example.com/a?b=c&d=e";
        let link = create_link(&pool, submitted, None).await.unwrap();

        let fetched = db::get_link(&pool, &link.code).await.unwrap().unwrap();
        assert_eq!(fetched.long_url, submitted);
    }

    #[tokio::test]
    async fn relative_and_non_http_urls_are_rejected() {
        let pool = test_pool().await;
        for bad in ["", "not a url", "/relative/path", "ftp://example.com/file"] {
            let err = create_link(&pool, bad, None).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidUrl), "accepted {bad:?}");
        }
    }

    #[tokio::test]
    async fn collisions_reroll_until_a_free_candidate_wins() {
        let pool = test_pool().await;
        db::insert_link(&pool, "taken01", "https://example.com")
            .await
            .unwrap();

        let mut draws = 0;
        let link = generate(&pool, "https://example.org", || {
            draws += 1;
            if draws == 1 { "taken01" } else { "fresh02" }.to_owned()
        })
        .await
        .unwrap();

        assert_eq!(link.code, "fresh02");
        assert_eq!(draws, 2);
    }

    #[tokio::test]
    async fn exhausting_every_candidate_fails_cleanly() {
        let pool = test_pool().await;
        db::insert_link(&pool, "stuck42", "https://example.com")
            .await
            .unwrap();

        // A candidate source that only ever collides.
        let err = generate(&pool, "https://example.org", || "stuck42".to_owned())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GenerationExhausted));

        // The occupant keeps its mapping.
        let link = db::get_link(&pool, "stuck42").await.unwrap().unwrap();
        assert_eq!(link.long_url, "https://example.com");
    }

    #[tokio::test]
    async fn concurrent_generation_never_duplicates_codes() {
        let pool = test_pool().await;

        let mut handles = Vec::new();
        for i in 0..32 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                create_link(&pool, &format!("https://example.com/{i}"), None)
                    .await
                    .unwrap()
                    .code
            }));
        }

        let mut codes = HashSet::new();
        for handle in handles {
            assert!(codes.insert(handle.await.unwrap()));
        }
        assert_eq!(codes.len(), 32);
    }
}
