use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::http_cache::app_cache_dir;
use crate::simulate::{SimParams, SimRow};
use crate::stats::Summary;

const CACHE_FILE: &str = "sim_cache.json";
const CACHE_VERSION: u32 = 1;

/// A finished run stored against its parameter fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRun {
    pub rows: Vec<SimRow>,
    pub summary: Summary,
    pub saved_at: u64,
}

/// Cache the caller injects around `simulate`. Keys are pure functions of
/// (dataset id, full parameter set), so any policy change misses cleanly
/// instead of serving stale rows.
pub trait SimCache {
    fn get(&self, key: &str) -> Option<CachedRun>;
    fn put(&self, key: &str, run: CachedRun);
}

/// Key for one (dataset, parameter set) combination. The fingerprint hashes
/// every parameter field, not a hand-bumped version label.
pub fn cache_key(dataset_id: &str, params: &SimParams) -> String {
    format!(
        "{dataset_id}-start:{}-{}",
        params.season_start,
        params_fingerprint(params)
    )
}

fn params_fingerprint(params: &SimParams) -> String {
    let canonical = serde_json::to_string(params).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..12])
}

/// File-backed cache under a directory the caller picks (the app cache dir
/// by default). Whole-file read/modify/write with an atomic swap, like the
/// other on-disk stores.
#[derive(Debug, Clone)]
pub struct FileSimCache {
    dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SimCacheFile {
    version: u32,
    runs: HashMap<String, CachedRun>,
}

impl FileSimCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn in_app_cache() -> Option<Self> {
        app_cache_dir().map(Self::new)
    }

    fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    fn load(&self) -> SimCacheFile {
        let Ok(raw) = fs::read_to_string(self.path()) else {
            return SimCacheFile::default();
        };
        let cache = serde_json::from_str::<SimCacheFile>(&raw).unwrap_or_default();
        if cache.version != CACHE_VERSION {
            return SimCacheFile::default();
        }
        cache
    }

    fn save(&self, cache: &SimCacheFile) -> Result<()> {
        fs::create_dir_all(&self.dir).ok();
        let path = self.path();
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(cache).context("serialize sim cache")?;
        fs::write(&tmp, json).context("write sim cache")?;
        fs::rename(&tmp, &path).context("swap sim cache")?;
        Ok(())
    }
}

impl SimCache for FileSimCache {
    fn get(&self, key: &str) -> Option<CachedRun> {
        self.load().runs.get(key).cloned()
    }

    fn put(&self, key: &str, run: CachedRun) {
        let mut cache = self.load();
        cache.version = CACHE_VERSION;
        cache.runs.insert(key.to_string(), run);
        let _ = self.save(&cache);
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn fingerprint_tracks_every_field() {
        let start = NaiveDate::from_ymd_opt(2024, 11, 22).unwrap();
        let base = SimParams::new(start);

        let mut tweaked = base.clone();
        tweaked.daily_stake_percent = 25.0;
        assert_ne!(cache_key("nba-2024", &base), cache_key("nba-2024", &tweaked));

        let mut capless = base.clone();
        capless.max_odds = None;
        assert_ne!(cache_key("nba-2024", &base), cache_key("nba-2024", &capless));

        assert_ne!(cache_key("nba-2024", &base), cache_key("mlb-2024", &base));
        assert_eq!(cache_key("nba-2024", &base), cache_key("nba-2024", &base));
    }
}
