use serde::{Deserialize, Serialize};
use tubeq_core::{HistoryEntry, Theme};
use tubeq_engine::OriginStorage;
use tubeq_logging::{tubeq_error, tubeq_info, tubeq_warn};

const HISTORY_KEY: &str = "ytmp3_history_v1.json";
const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedEntry {
    title: String,
    filename: String,
    ts: i64,
}

pub(crate) fn load_history(storage: &OriginStorage) -> Vec<HistoryEntry> {
    let content = match storage.read(HISTORY_KEY) {
        Ok(Some(text)) => text,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tubeq_warn!("Failed to read history from {:?}: {}", storage.dir(), err);
            return Vec::new();
        }
    };

    let entries: Vec<PersistedEntry> = match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(err) => {
            tubeq_warn!("Ignoring unreadable history in {:?}: {}", storage.dir(), err);
            return Vec::new();
        }
    };

    tubeq_info!("Loaded {} history entries from {:?}", entries.len(), storage.dir());
    entries
        .into_iter()
        .map(|entry| HistoryEntry {
            title: entry.title,
            filename: entry.filename,
            timestamp_ms: entry.ts,
        })
        .collect()
}

pub(crate) fn save_history(storage: &OriginStorage, entries: &[HistoryEntry]) {
    let persisted: Vec<PersistedEntry> = entries
        .iter()
        .map(|entry| PersistedEntry {
            title: entry.title.clone(),
            filename: entry.filename.clone(),
            ts: entry.timestamp_ms,
        })
        .collect();

    let content = match serde_json::to_string(&persisted) {
        Ok(text) => text,
        Err(err) => {
            tubeq_error!("Failed to serialize history: {}", err);
            return;
        }
    };

    if let Err(err) = storage.write(HISTORY_KEY, &content) {
        tubeq_error!("Failed to write history to {:?}: {}", storage.dir(), err);
    }
}

pub(crate) fn load_theme(storage: &OriginStorage) -> Option<Theme> {
    match storage.read(THEME_KEY) {
        Ok(value) => value.as_deref().and_then(Theme::parse),
        Err(err) => {
            tubeq_warn!("Failed to read theme preference: {}", err);
            None
        }
    }
}

pub(crate) fn save_theme(storage: &OriginStorage, theme: Theme) {
    if let Err(err) = storage.write(THEME_KEY, theme.as_str()) {
        tubeq_error!("Failed to write theme preference: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn entry(n: i64) -> HistoryEntry {
        HistoryEntry {
            title: format!("Track {n}"),
            filename: format!("track_{n}.mp3"),
            timestamp_ms: 1_700_000_000_000 + n,
        }
    }

    #[test]
    fn history_round_trips_through_storage() {
        let temp = TempDir::new().unwrap();
        let storage = OriginStorage::for_origin(temp.path(), "http://127.0.0.1:5000");
        assert!(load_history(&storage).is_empty());

        save_history(&storage, &[entry(2), entry(1)]);
        assert_eq!(load_history(&storage), vec![entry(2), entry(1)]);

        let raw = storage.read(HISTORY_KEY).unwrap().unwrap();
        assert!(raw.contains("\"ts\":1700000000002"));
    }

    #[test]
    fn corrupt_history_loads_as_empty() {
        let temp = TempDir::new().unwrap();
        let storage = OriginStorage::for_origin(temp.path(), "http://127.0.0.1:5000");
        storage.write(HISTORY_KEY, "{not json").unwrap();
        assert!(load_history(&storage).is_empty());
    }

    #[test]
    fn theme_round_trips_and_ignores_unknown_values() {
        let temp = TempDir::new().unwrap();
        let storage = OriginStorage::for_origin(temp.path(), "http://127.0.0.1:5000");
        assert_eq!(load_theme(&storage), None);

        save_theme(&storage, Theme::Dark);
        assert_eq!(load_theme(&storage), Some(Theme::Dark));

        storage.write(THEME_KEY, "sepia").unwrap();
        assert_eq!(load_theme(&storage), None);
    }
}
