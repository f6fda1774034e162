use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Credential cache file name, resolved against the working directory
pub const AUTH_FILE: &str = "auth.json";

/// Token maximum age in seconds.
/// Provider tokens last about a day; refreshing after 23 hours leaves an
/// hour of slack.
const TOKEN_MAX_AGE_SECS: i64 = 23 * 60 * 60;

/// The persisted credential record: a subscription token and the unix
/// timestamp it was issued at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub time: i64,
    pub token: String,
}

impl TokenRecord {
    pub fn new(token: String) -> Self {
        Self {
            time: Utc::now().timestamp(),
            token,
        }
    }

    /// A record is usable only while strictly younger than the maximum age;
    /// a record exactly at the threshold must be refreshed.
    pub fn is_fresh_at(&self, now: i64) -> bool {
        now - self.time < TOKEN_MAX_AGE_SECS
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now().timestamp())
    }
}

/// On-disk cache for the subscription token.
///
/// Single-user, single-process: concurrent access is not coordinated.
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored record, `None` when no cache file exists
    pub fn load(&self) -> Result<Option<TokenRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let record: TokenRecord = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(record))
    }

    /// Overwrite the stored record
    pub fn save(&self, record: &TokenRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string(record)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Return a usable subscription token, authenticating only when needed.
    ///
    /// A fresh stored record is returned without invoking `authenticate`.
    /// A missing, stale or unreadable record triggers the authenticator; its
    /// token is persisted with the current timestamp before being returned.
    /// When authentication fails nothing is written, so a stale record is
    /// never silently reused and no partial state lands on disk.
    pub async fn get_token<F, Fut>(&self, authenticate: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        match self.load() {
            Ok(Some(record)) if record.is_fresh() => {
                debug!("using cached subscription token");
                return Ok(record.token);
            }
            Ok(Some(_)) => info!("cached token expired, re-authenticating"),
            Ok(None) => info!("no cached token, authenticating"),
            Err(e) => warn!(error = %e, "unreadable token cache, re-authenticating"),
        }

        let token = authenticate().await?;
        let record = TokenRecord::new(token.clone());
        self.save(&record).context("Failed to store token record")?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::tempdir;

    fn cache_in(dir: &tempfile::TempDir) -> TokenCache {
        TokenCache::new(dir.path().join("auth.json"))
    }

    #[test]
    fn test_freshness_threshold() {
        let record = TokenRecord {
            time: 1_000_000,
            token: "T".to_string(),
        };

        assert!(record.is_fresh_at(1_000_000));
        assert!(record.is_fresh_at(1_000_000 + TOKEN_MAX_AGE_SECS - 1));
        // exactly 23 hours old is no longer usable
        assert!(!record.is_fresh_at(1_000_000 + TOKEN_MAX_AGE_SECS));
        assert!(!record.is_fresh_at(1_000_000 + TOKEN_MAX_AGE_SECS + 1));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let cache = cache_in(&dir);

        let record = TokenRecord {
            time: 1_700_000_000,
            token: "eyJhbGciOi".to_string(),
        };
        cache.save(&record).unwrap();

        let loaded = cache.load().unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        assert!(cache_in(&dir).load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fresh_record_skips_authentication() {
        let dir = tempdir().unwrap();
        let cache = cache_in(&dir);
        cache
            .save(&TokenRecord {
                time: Utc::now().timestamp() - 3600,
                token: "cached".to_string(),
            })
            .unwrap();

        let called = Cell::new(false);
        let token = cache
            .get_token(|| {
                called.set(true);
                async { Ok("network".to_string()) }
            })
            .await
            .unwrap();

        assert_eq!(token, "cached");
        assert!(!called.get(), "fresh record must not trigger a network call");
    }

    #[tokio::test]
    async fn test_stale_record_is_replaced() {
        let dir = tempdir().unwrap();
        let cache = cache_in(&dir);
        let stale_time = Utc::now().timestamp() - TOKEN_MAX_AGE_SECS - 1;
        cache
            .save(&TokenRecord {
                time: stale_time,
                token: "stale".to_string(),
            })
            .unwrap();

        let token = cache
            .get_token(|| async { Ok("renewed".to_string()) })
            .await
            .unwrap();
        assert_eq!(token, "renewed");

        let stored = cache.load().unwrap().unwrap();
        assert_eq!(stored.token, "renewed");
        assert!(stored.time > stale_time);
        assert!(stored.is_fresh());
    }

    #[tokio::test]
    async fn test_missing_record_authenticates_and_persists() {
        let dir = tempdir().unwrap();
        let cache = cache_in(&dir);

        let token = cache
            .get_token(|| async { Ok("first".to_string()) })
            .await
            .unwrap();
        assert_eq!(token, "first");
        assert_eq!(cache.load().unwrap().unwrap().token, "first");
    }

    #[tokio::test]
    async fn test_failed_authentication_persists_nothing() {
        let dir = tempdir().unwrap();
        let cache = cache_in(&dir);
        let stale = TokenRecord {
            time: 0,
            token: "stale".to_string(),
        };
        cache.save(&stale).unwrap();

        let result = cache
            .get_token(|| async { Err(anyhow::anyhow!("bad credentials")) })
            .await;
        assert!(result.is_err());

        // the stale record is left untouched rather than half-replaced
        assert_eq!(cache.load().unwrap().unwrap(), stale);
    }

    #[tokio::test]
    async fn test_corrupt_cache_triggers_reauth() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, "not json").unwrap();

        let cache = TokenCache::new(path.clone());
        let token = cache
            .get_token(|| async { Ok("recovered".to_string()) })
            .await
            .unwrap();
        assert_eq!(token, "recovered");
        assert_eq!(cache.load().unwrap().unwrap().token, "recovered");
    }
}
