// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk cache of conversation lists.
//!
//! Lists are cached per category as JSON so the directory can be shown
//! immediately on start, before the background refresh returns. Entries
//! older than the configured TTL read as missing. Only directory
//! summaries are stored, so agent-activity rows are already anonymized.

use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use murmur_config::model::CacheConfig;
use murmur_core::{ConversationCategory, MurmurError};
use murmur_directory::ConversationSummary;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    summaries: Vec<ConversationSummary>,
}

/// TTL'd JSON files, one per conversation category.
#[derive(Debug, Clone)]
pub struct ConversationCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ConversationCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// Builds the cache from config; `None` when caching is disabled.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config.enabled.then(|| {
            let ttl = i64::try_from(config.ttl_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX);
            Self::new(&config.dir, ttl)
        })
    }

    fn path(&self, category: ConversationCategory) -> PathBuf {
        self.dir.join(format!("conversations-{category}.json"))
    }

    /// Returns the cached list if present and fresh.
    ///
    /// A corrupt file reads as a miss.
    pub async fn load(
        &self,
        category: ConversationCategory,
    ) -> Result<Option<Vec<ConversationSummary>>, MurmurError> {
        let path = self.path(category);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MurmurError::Cache { source: e.into() }),
        };

        let entry: CacheEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable cache file");
                return Ok(None);
            }
        };

        let age = Utc::now().signed_duration_since(entry.stored_at);
        if age > self.ttl {
            debug!(%category, age_secs = age.num_seconds(), "cache entry expired");
            return Ok(None);
        }
        debug!(%category, count = entry.summaries.len(), "cache hit");
        Ok(Some(entry.summaries))
    }

    /// Writes a category's list, replacing any previous entry.
    pub async fn store(
        &self,
        category: ConversationCategory,
        summaries: &[ConversationSummary],
    ) -> Result<(), MurmurError> {
        #[derive(Serialize)]
        struct EntryRef<'a> {
            stored_at: DateTime<Utc>,
            summaries: &'a [ConversationSummary],
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MurmurError::Cache { source: e.into() })?;
        let body = serde_json::to_vec(&EntryRef {
            stored_at: Utc::now(),
            summaries,
        })
        .map_err(|e| MurmurError::Cache { source: e.into() })?;

        let path = self.path(category);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| MurmurError::Cache { source: e.into() })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| MurmurError::Cache { source: e.into() })?;
        debug!(%category, count = summaries.len(), "cache stored");
        Ok(())
    }

    /// Removes a category's entry. Missing entries are fine.
    pub async fn invalidate(&self, category: ConversationCategory) -> Result<(), MurmurError> {
        match tokio::fs::remove_file(self.path(category)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MurmurError::Cache { source: e.into() }),
        }
    }
}
