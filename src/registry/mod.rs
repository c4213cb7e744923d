//! Channel Registry / Identity Cache
//!
//! Assigns every upstream channel a small stable numeric id, flags channels
//! with an HD simulcast and allocates a separate id for the HD variant. The
//! mapping is persisted as JSON so ids stay stable between runs:
//!
//! ```json
//! {"channel-42": {"id": "1", "channel": "42", "hashd": true, "hdid": "7"}}
//! ```
//!
//! A cached mapping is reused unchanged when it covers every current channel;
//! otherwise it is discarded and rebuilt from the current input order.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::AppResult;
use crate::models::{ChannelIdentity, ChannelIdentityMap, ChannelRecord, NO_HD_ID};
use crate::utils::atomic_file::replace_file;

/// Outcome of a [`ChannelRegistry::resolve`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The persisted mapping was valid and reused
    Reused,
    /// The mapping was rebuilt and written back
    Rebuilt,
    /// The mapping was rebuilt but could not be persisted
    RebuiltUnsaved,
}

pub struct ChannelRegistry {
    cache_file: PathBuf,
    hd_channels: BTreeSet<String>,
}

impl ChannelRegistry {
    pub fn new(cache_file: impl Into<PathBuf>, hd_channels: BTreeSet<String>) -> Self {
        Self {
            cache_file: cache_file.into(),
            hd_channels,
        }
    }

    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// Resolve identities for `channels`, reusing the cache when it is valid.
    ///
    /// Never fails: unreadable or malformed caches trigger a rebuild, and a
    /// failure to persist the rebuilt mapping is logged.
    pub fn resolve(&self, channels: &[ChannelRecord]) -> (ChannelIdentityMap, CacheStatus) {
        if let Some(cached) = self.load_cache() {
            if is_cache_valid(&cached, channels) {
                debug!(
                    "Reusing channel cache {} ({} entries)",
                    self.cache_file.display(),
                    cached.len()
                );
                return (cached, CacheStatus::Reused);
            }
            info!(
                "Channel cache {} does not match current input, rebuilding",
                self.cache_file.display()
            );
        }

        let identities = build_identities(channels, &self.hd_channels);
        let status = match self.save_cache(&identities) {
            Ok(()) => {
                info!(
                    "Wrote channel cache {} ({} entries)",
                    self.cache_file.display(),
                    identities.len()
                );
                CacheStatus::Rebuilt
            }
            Err(e) => {
                warn!(
                    "Failed to write channel cache {}: {}",
                    self.cache_file.display(),
                    e
                );
                CacheStatus::RebuiltUnsaved
            }
        };
        (identities, status)
    }

    /// Read the persisted mapping; absent or unparsable caches read as `None`
    pub fn load_cache(&self) -> Option<ChannelIdentityMap> {
        let contents = match fs::read_to_string(&self.cache_file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No channel cache at {}", self.cache_file.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read channel cache {}: {}", self.cache_file.display(), e);
                return None;
            }
        };

        serde_json::from_str(&contents)
            .map_err(|e| {
                warn!(
                    "JSON read error while processing the cache file {}: {}",
                    self.cache_file.display(),
                    e
                )
            })
            .ok()
    }

    /// Overwrite the persisted mapping
    pub fn save_cache(&self, identities: &ChannelIdentityMap) -> AppResult<()> {
        let json = serde_json::to_string_pretty(identities)?;
        replace_file(&self.cache_file, json.as_bytes())
    }
}

/// A cache is reusable when it has at least as many entries as there are
/// distinct channels, contains every current external id and its ids are
/// internally consistent
pub fn is_cache_valid(cached: &ChannelIdentityMap, channels: &[ChannelRecord]) -> bool {
    let distinct: BTreeSet<&str> = channels.iter().map(|c| c.external_id.as_str()).collect();
    let covers = cached.len() >= distinct.len() && distinct.iter().all(|id| cached.contains_key(*id));
    if covers && !ids_are_consistent(cached) {
        warn!("Channel cache assigns conflicting ids, discarding it");
        return false;
    }
    covers
}

/// Every SD and HD id is non-empty and used once, and every HD-flagged entry
/// carries a real HD id
fn ids_are_consistent(cached: &ChannelIdentityMap) -> bool {
    let mut used = HashSet::new();
    cached.values().all(|identity| {
        let sd_ok = !identity.assigned_id.is_empty() && used.insert(identity.assigned_id.as_str());
        let hd_ok = !identity.has_hd_variant
            || (identity.hd_assigned_id != NO_HD_ID
                && !identity.hd_assigned_id.is_empty()
                && used.insert(identity.hd_assigned_id.as_str()));
        sd_ok && hd_ok
    })
}

/// Allocate identities in input order.
///
/// Base ids are the 1-based input positions. HD ids come from a counter that
/// starts above the largest possible base id and advances once per HD-capable
/// channel, so the two ranges never overlap. A repeated external id keeps the
/// identity of its first occurrence.
pub fn build_identities(
    channels: &[ChannelRecord],
    hd_channels: &BTreeSet<String>,
) -> ChannelIdentityMap {
    let mut identities = ChannelIdentityMap::new();
    let mut next_hd_id = channels.len() + 1;

    for (position, channel) in channels.iter().enumerate() {
        if identities.contains_key(&channel.external_id) {
            warn!(
                "Duplicate channel id {} ({}), keeping first identity",
                channel.external_id, channel.name
            );
            continue;
        }

        let has_hd_variant = hd_channels.contains(&channel.name);
        let hd_assigned_id = if has_hd_variant {
            let id = next_hd_id.to_string();
            next_hd_id += 1;
            id
        } else {
            NO_HD_ID.to_string()
        };

        identities.insert(
            channel.external_id.clone(),
            ChannelIdentity {
                assigned_id: (position + 1).to_string(),
                channel: channel_number(&channel.external_id),
                has_hd_variant,
                hd_assigned_id,
            },
        );
    }

    identities
}

/// Upstream channel number: `channel-042` -> `42`; other ids pass through
pub fn channel_number(external_id: &str) -> String {
    external_id
        .strip_prefix("channel-")
        .and_then(|digits| digits.parse::<u64>().ok())
        .map(|n| n.to_string())
        .unwrap_or_else(|| external_id.to_string())
}
