//! Write boundary for canonical records. The sync never retries or
//! interprets store failures; they go straight back to the caller.
use crate::CanonicalPlayerRecord;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error, PathBuf),
    Serialize(serde_json::Error),
    InvalidKey(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e, path) => write!(f, "store write failed for {}: {e}", path.display()),
            StoreError::Serialize(e) => write!(f, "could not serialize record: {e}"),
            StoreError::InvalidKey(key) => write!(f, "athlete id {key:?} is not a valid store key"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Keyed upsert by athlete id.
pub trait RecordStore {
    fn upsert(&mut self, record: &CanonicalPlayerRecord) -> Result<(), StoreError>;
}

/// One pretty-printed JSON file per athlete; rewriting the file is the upsert.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Io(e, dir.clone()))?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, athlete_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !athlete_id.is_empty()
            && athlete_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(athlete_id.to_owned()));
        }
        Ok(self.dir.join(format!("{athlete_id}.json")))
    }
}

impl RecordStore for JsonFileStore {
    fn upsert(&mut self, record: &CanonicalPlayerRecord) -> Result<(), StoreError> {
        let path = self.path_for(record.athlete_id())?;
        let json = serde_json::to_string_pretty(record).map_err(StoreError::Serialize)?;
        std::fs::write(&path, json).map_err(|e| StoreError::Io(e, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, yards: f64) -> CanonicalPlayerRecord {
        CanonicalPlayerRecord::new(id.into(), vec![("passYards".into(), yards)])
    }

    #[test]
    fn upsert_overwrites_by_athlete_id() {
        let dir = tempfile::tempdir().unwrap();
        let records = dir.path().join("records");
        let mut store = JsonFileStore::new(&records).unwrap();

        store.upsert(&record("3139477", 100.0)).unwrap();
        store.upsert(&record("3139477", 250.0)).unwrap();

        let written = std::fs::read_to_string(store.path_for("3139477").unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["athleteId"], "3139477");
        assert_eq!(value["stats"]["passYards"], 250.0);
        assert_eq!(std::fs::read_dir(&records).unwrap().count(), 1);
    }

    #[test]
    fn path_like_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path()).unwrap();

        let err = store.upsert(&record("../escape", 1.0)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
