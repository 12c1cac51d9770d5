//! Content-addressed snapshot cache.
//!
//! A parsed patch is stored as CBOR under the blake3 hash of the source
//! bytes it came from:
//!
//! ```text
//! <cache dir>/<64 hex digits>.pdsnap
//! ```
//!
//! Each snapshot repeats the hash and a format version. On load, an entry
//! whose stored hash or version disagrees is deleted and counts as a miss,
//! so a stale or foreign file can never be served.
//!
//! The same source parses differently under different [`Settings`] (widget
//! defaults, range policy), so a cache used for parsing is
//! [`scoped`](SnapshotCache::scoped) to a subdirectory named after a hash of
//! the settings:
//!
//! ```text
//! <cache dir>/settings-<16 hex digits>/<64 hex digits>.pdsnap
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PatchError, Result};
use crate::model::Patch;
use crate::settings::Settings;

/// Bumped whenever the model's serialized shape changes.
pub const SNAPSHOT_VERSION: u32 = 1;

pub const SNAPSHOT_EXTENSION: &str = "pdsnap";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Hex blake3 hash of the source the patch was parsed from
    pub source_hash: String,
    pub patch: Patch,
}

impl Snapshot {
    pub fn new(source: &[u8], patch: Patch) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            source_hash: content_hash(source),
            patch,
        }
    }
}

pub fn content_hash(source: &[u8]) -> String {
    blake3::hash(source).to_hex().to_string()
}

/// Short hex hash of every setting, stable across runs.
pub fn settings_fingerprint(settings: &Settings) -> Result<String> {
    let mut bytes = Vec::new();
    ciborium::into_writer(settings, &mut bytes).map_err(|e| PatchError::Snapshot {
        message: e.to_string(),
    })?;
    let hash = blake3::hash(&bytes).to_hex();
    Ok(hash.as_str()[..16].to_string())
}

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(snapshot, &mut bytes).map_err(|e| PatchError::Snapshot {
        message: e.to_string(),
    })?;
    Ok(bytes)
}

/// Decode a snapshot, rejecting any other format version.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot> {
    let snapshot: Snapshot = ciborium::from_reader(bytes).map_err(|e| PatchError::Snapshot {
        message: e.to_string(),
    })?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(PatchError::Snapshot {
            message: format!(
                "snapshot version {} is not supported (expected {SNAPSHOT_VERSION})",
                snapshot.version
            ),
        });
    }
    Ok(snapshot)
}

/// A directory of snapshots keyed by source content.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A cache for patches parsed under `settings`, kept apart from entries
    /// made under any other settings.
    pub fn scoped(&self, settings: &Settings) -> Result<Self> {
        let fingerprint = settings_fingerprint(settings)?;
        Ok(Self::new(self.dir.join(format!("settings-{fingerprint}"))))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}.{SNAPSHOT_EXTENSION}"))
    }

    /// The cached patch for `source`, if there is a valid entry.
    pub fn load(&self, source: &[u8]) -> Result<Option<Patch>> {
        let hash = content_hash(source);
        let path = self.path_for(&hash);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("snapshot cache miss for {hash}");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot = match decode_snapshot(&bytes) {
            Ok(snapshot) if snapshot.source_hash == hash => snapshot,
            Ok(_) => {
                log::debug!("snapshot {} does not match its source, removing", path.display());
                remove(&path)?;
                return Ok(None);
            }
            Err(e) => {
                log::debug!("snapshot {} is unreadable ({e}), removing", path.display());
                remove(&path)?;
                return Ok(None);
            }
        };

        log::debug!("snapshot cache hit for {hash}");
        Ok(Some(snapshot.patch))
    }

    /// Store `patch` under the hash of `source`, returning the file written.
    pub fn store(&self, source: &[u8], patch: &Patch) -> Result<PathBuf> {
        let snapshot = Snapshot::new(source, patch.clone());
        let path = self.path_for(&snapshot.source_hash);
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, encode_snapshot(&snapshot)?)?;
        log::debug!("stored snapshot {}", path.display());
        Ok(path)
    }

    /// Drop the entry for `source`. Returns whether one existed.
    pub fn invalidate(&self, source: &[u8]) -> Result<bool> {
        remove(&self.path_for(&content_hash(source)))
    }
}

fn remove(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::settings::Settings;
    use pretty_assertions::assert_eq;

    const SOURCE: &[u8] = b"#N canvas 0 50 450 300 12;\n#X obj 10 10 osc~ 440;\n";

    fn patch() -> Patch {
        parse(std::str::from_utf8(SOURCE).unwrap(), &Settings::default()).unwrap()
    }

    #[test]
    fn hash_is_hex_blake3() {
        let hash = content_hash(b"");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn snapshot_bytes_decode_to_the_same_snapshot() {
        let snapshot = Snapshot::new(SOURCE, patch());

        let back = decode_snapshot(&encode_snapshot(&snapshot).unwrap()).unwrap();

        assert_eq!(back, snapshot);
    }

    #[test]
    fn other_versions_are_rejected() {
        let mut snapshot = Snapshot::new(SOURCE, patch());
        snapshot.version = SNAPSHOT_VERSION + 1;

        let error = decode_snapshot(&encode_snapshot(&snapshot).unwrap()).unwrap_err();

        assert!(matches!(error, PatchError::Snapshot { .. }), "{error}");
    }

    #[test]
    fn store_then_load_hits() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path());

        assert_eq!(cache.load(SOURCE).unwrap(), None);
        let path = cache.store(SOURCE, &patch()).unwrap();

        assert_eq!(path, cache.path_for(&content_hash(SOURCE)));
        assert_eq!(cache.load(SOURCE).unwrap(), Some(patch()));
    }

    #[test]
    fn scopes_follow_the_settings() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path());
        let lenient = Settings {
            log_range: crate::settings::LogRangePolicy::AllowInverted,
            ..Settings::default()
        };

        let strict = cache.scoped(&Settings::default()).unwrap();
        let again = cache.scoped(&Settings::default()).unwrap();
        let other = cache.scoped(&lenient).unwrap();

        assert_eq!(strict.dir(), again.dir());
        assert_ne!(strict.dir(), other.dir());
        assert!(strict.dir().starts_with(dir.path()));
    }

    #[test]
    fn invalidate_removes_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path());
        cache.store(SOURCE, &patch()).unwrap();

        assert!(cache.invalidate(SOURCE).unwrap());
        assert!(!cache.invalidate(SOURCE).unwrap());
        assert_eq!(cache.load(SOURCE).unwrap(), None);
    }
}
