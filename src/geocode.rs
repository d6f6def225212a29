//! # Geocoding Module
//!
//! Resolves postal codes to coordinates with a persistent write-through cache
//!
//! ## Key Components
//! - [`GeoCache`] - Injected cache capability (file-backed or in-memory)
//! - [`geocode_batch`] - Rate-limited batch lookups against the BAN API
//! - [`postal_breakdown`] - Per-postal-code funnel counts for the geo view

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::models::Lead;
use crate::status::{is_qualified, is_sold};

const GEOCODE_URL: &str = "https://api-adresse.data.gouv.fr/search/";
const BATCH_SIZE: usize = 40;
const BATCH_PAUSE_MS: u64 = 40;

pub type Coord = (f64, f64);

/// Cache capability the geocoder works against. File-backed in production,
/// in-memory in tests.
pub trait GeoCache {
    fn get(&self, code: &str) -> Option<Coord>;
    fn set(&mut self, code: &str, coord: Coord);
    fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }
    /// Persist pending entries. Best-effort; default is a no-op.
    fn flush(&self) {}
}

/// Process-wide persistent cache: one JSON map keyed by postal code.
/// A missing or corrupt file degrades to an empty cache, never an error.
pub struct FileCache {
    path: PathBuf,
    entries: HashMap<String, Coord>,
}

impl FileCache {
    pub fn open(dir: &Path) -> Self {
        let path = dir.join("geo_cache.json");
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

}

impl GeoCache for FileCache {
    fn get(&self, code: &str) -> Option<Coord> {
        self.entries.get(code).copied()
    }

    fn set(&mut self, code: &str, coord: Coord) {
        self.entries.insert(code.to_string(), coord);
    }

    fn flush(&self) {
        let write = || -> Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
            }
            let raw = serde_json::to_string(&self.entries)?;
            std::fs::write(&self.path, raw).context("Failed to write geocode cache")?;
            Ok(())
        };
        if let Err(e) = write() {
            warn!("Geocode cache not persisted: {:#}", e);
        }
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: HashMap<String, Coord>,
}

impl GeoCache for MemoryCache {
    fn get(&self, code: &str) -> Option<Coord> {
        self.entries.get(code).copied()
    }

    fn set(&mut self, code: &str, coord: Coord) {
        self.entries.insert(code.to_string(), coord);
    }
}

/// Resolve every postal code, reading through the cache. Lookups run in
/// batches with a pause in between so the public API is not hammered; a
/// failed item simply stays unlocated and its siblings proceed.
pub async fn geocode_batch(
    codes: &[String],
    cache: &mut dyn GeoCache,
) -> HashMap<String, Coord> {
    let mut resolved: HashMap<String, Coord> = HashMap::new();
    let mut missing: Vec<&String> = Vec::new();

    for code in codes {
        match cache.get(code) {
            Some(coord) => {
                resolved.insert(code.clone(), coord);
            }
            None => missing.push(code),
        }
    }

    if missing.is_empty() {
        return resolved;
    }
    debug!("Geocoding {} uncached postal codes", missing.len());

    let client = reqwest::Client::new();
    for batch in missing.chunks(BATCH_SIZE) {
        for code in batch {
            match lookup(&client, code).await {
                Ok(Some(coord)) => {
                    cache.set(code, coord);
                    resolved.insert((*code).clone(), coord);
                }
                Ok(None) => debug!("No match for postal code {}", code),
                Err(e) => warn!("Geocode failed for {}: {:#}", code, e),
            }
        }
        cache.flush();
        tokio::time::sleep(Duration::from_millis(BATCH_PAUSE_MS)).await;
    }

    resolved
}

async fn lookup(client: &reqwest::Client, code: &str) -> Result<Option<Coord>> {
    let body: Value = client
        .get(GEOCODE_URL)
        .query(&[("q", code), ("type", "municipality"), ("limit", "1")])
        .send()
        .await
        .context("Geocode request failed")?
        .json()
        .await
        .context("Geocode payload was not JSON")?;

    // GeoJSON order is [lng, lat].
    let coords = body
        .get("features")
        .and_then(Value::as_array)
        .and_then(|f| f.first())
        .and_then(|f| f.get("geometry"))
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array);

    Ok(coords.and_then(|c| {
        let lng = c.first().and_then(Value::as_f64)?;
        let lat = c.get(1).and_then(Value::as_f64)?;
        Some((lat, lng))
    }))
}

/// Per-postal-code funnel counts over (already period-filtered) leads,
/// sorted by volume. Codes shorter than 4 characters are noise from the
/// sheet and are skipped.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalStats {
    pub code: String,
    pub department: String,
    pub leads: u64,
    pub qualified: u64,
    pub sold: u64,
    pub coord: Option<Coord>,
}

pub fn postal_breakdown(leads: &[&Lead]) -> Vec<PostalStats> {
    let mut stats: Vec<PostalStats> = Vec::new();

    for lead in leads {
        let code = lead.postal_code.trim();
        if code.len() < 4 {
            continue;
        }
        let slot = match stats.iter().position(|s| s.code == code) {
            Some(slot) => slot,
            None => {
                stats.push(PostalStats {
                    code: code.to_string(),
                    department: code.chars().take(2).collect(),
                    ..Default::default()
                });
                stats.len() - 1
            }
        };
        let entry = &mut stats[slot];
        entry.leads += 1;
        if is_qualified(lead) {
            entry.qualified += 1;
        }
        if is_sold(lead) {
            entry.sold += 1;
        }
    }

    stats.sort_by(|a, b| b.leads.cmp(&a.leads));
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead_at(postal_code: &str, status: &str) -> Lead {
        Lead {
            postal_code: postal_code.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_memory_cache_roundtrip() {
        let mut cache = MemoryCache::default();
        assert!(!cache.contains("69002"));
        cache.set("69002", (45.75, 4.83));
        assert_eq!(cache.get("69002"), Some((45.75, 4.83)));
        assert!(cache.contains("69002"));
    }

    #[tokio::test]
    async fn test_cached_codes_skip_the_network() {
        // Everything resolves from the cache, so no request is ever made
        // and the call returns immediately.
        let mut cache = MemoryCache::default();
        cache.set("69002", (45.75, 4.83));
        cache.set("69100", (45.77, 4.88));

        let codes = vec!["69002".to_string(), "69100".to_string()];
        let resolved = geocode_batch(&codes, &mut cache).await;
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["69002"], (45.75, 4.83));
    }

    #[test]
    fn test_corrupt_cache_file_degrades_to_empty() {
        let dir = std::env::temp_dir().join("solarops_test_corrupt_cache");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("geo_cache.json"), "{not json").unwrap();

        let cache = FileCache::open(&dir);
        assert!(cache.get("69002").is_none());
    }

    #[test]
    fn test_file_cache_write_through() {
        let dir = std::env::temp_dir().join("solarops_test_cache_rw");
        let _ = std::fs::remove_dir_all(&dir);

        let mut cache = FileCache::open(&dir);
        cache.set("69006", (45.77, 4.85));
        cache.flush();

        let reopened = FileCache::open(&dir);
        assert_eq!(reopened.get("69006"), Some((45.77, 4.85)));
    }

    #[test]
    fn test_postal_breakdown() {
        let leads = vec![
            lead_at("69002", "Nouveau"),
            lead_at("69002", "RDV Fixé"),
            lead_at("38200", "Nouveau"),
            lead_at("12", "Nouveau"), // too short, skipped
        ];
        let refs: Vec<&Lead> = leads.iter().collect();

        let stats = postal_breakdown(&refs);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].code, "69002");
        assert_eq!(stats[0].department, "69");
        assert_eq!(stats[0].leads, 2);
        assert_eq!(stats[0].qualified, 1);
    }
}
