use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::explorer::nav_graph::{NavigationEdge, RegisteredElement, ScreenNode};
use crate::store::store::{ExplorationStore, PersistenceRecord};

/// Appends every persistence record to a file as one JSON line.
pub struct JsonlStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, record: &PersistenceRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let mut file = self.file.lock().map_err(|_| StoreError::Poisoned)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

impl ExplorationStore for JsonlStore {
    fn save_screen_state(&self, node: &ScreenNode) -> Result<(), StoreError> {
        self.write(&PersistenceRecord::Screen(node.clone()))
    }

    fn increment_visit_count(&self, fingerprint: &str) -> Result<(), StoreError> {
        self.write(&PersistenceRecord::Visit {
            fingerprint: fingerprint.to_string(),
        })
    }

    fn save_edge(&self, edge: &NavigationEdge) -> Result<(), StoreError> {
        self.write(&PersistenceRecord::Edge(edge.clone()))
    }

    fn save_element(&self, element: &RegisteredElement) -> Result<(), StoreError> {
        self.write(&PersistenceRecord::Element(element.clone()))
    }

    fn apply(&self, record: &PersistenceRecord) -> Result<(), StoreError> {
        self.write(record)
    }
}

/// Read back a JSONL file written by [`JsonlStore`]. Blank lines are skipped.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<PersistenceRecord>, StoreError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_model::ScreenState;

    #[test]
    fn appends_and_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("records.jsonl");
        let store = JsonlStore::open(&path).expect("open");

        let node = ScreenNode {
            state: ScreenState {
                fingerprint: "abc".into(),
                package_name: "com.example".into(),
                activity_name: ".Main".into(),
                window_title: Some("Home".into()),
                element_count: 3,
                element_keys: Vec::new(),
            },
            depth: 0,
            visit_count: 1,
            discovered_at_ms: 0,
            login_screen: false,
        };
        store.save_screen_state(&node).expect("save screen");
        store.increment_visit_count("abc").expect("visit");

        // Reopening appends rather than truncating
        let again = JsonlStore::open(&path).expect("reopen");
        again.increment_visit_count("abc").expect("visit");

        let records = read_records(&path).expect("read");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], PersistenceRecord::Screen(node));
        assert!(matches!(&records[2], PersistenceRecord::Visit { fingerprint } if fingerprint == "abc"));
    }
}
