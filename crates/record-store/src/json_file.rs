use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::memory::{insert_into, remove_from, update_in};
use crate::{Mutation, Record, RecordStore, Result};

/// Record store that keeps its map in memory and rewrites a JSON file after
/// every mutation.
///
/// The file holds a JSON array of records. It is read once by [`open`]; a
/// missing file yields an empty store, an unreadable one is logged and
/// ignored. A mutation whose write fails is rolled back in memory.
///
/// [`open`]: JsonFileRecordStore::open
pub struct JsonFileRecordStore<R: Record> {
    path: PathBuf,
    records: Arc<RwLock<BTreeMap<R::Id, R>>>,
}

impl<R: Record> Clone for JsonFileRecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            records: self.records.clone(),
        }
    }
}

impl<R: Record> JsonFileRecordStore<R> {
    /// Opens the store backed by `path`, loading any existing records.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let records = load::<R>(&path).await;
        tracing::info!(
            kind = R::KIND,
            path = %path.display(),
            count = records.len(),
            "record store opened"
        );

        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
        })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &BTreeMap<R::Id, R>) -> Result<()> {
        let snapshot: Vec<&R> = records.values().collect();
        let json = serde_json::to_vec_pretty(&snapshot)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        metrics::counter!("record_store_flushes_total", "kind" => R::KIND).increment(1);
        Ok(())
    }
}

async fn load<R: Record>(path: &Path) -> BTreeMap<R::Id, R> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::error!(kind = R::KIND, path = %path.display(), error = %e, "failed to read records");
            return BTreeMap::new();
        }
    };

    match serde_json::from_slice::<Vec<R>>(&bytes) {
        Ok(records) => records.into_iter().map(|r| (r.id(), r)).collect(),
        Err(e) => {
            tracing::error!(kind = R::KIND, path = %path.display(), error = %e, "failed to parse records");
            BTreeMap::new()
        }
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for JsonFileRecordStore<R> {
    async fn get(&self, id: R::Id) -> Result<Option<R>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<R>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn insert(&self, record: R) -> Result<()> {
        let id = record.id();
        let mut records = self.records.write().await;
        insert_into(&mut records, record)?;

        if let Err(e) = self.persist(&records).await {
            records.remove(&id);
            return Err(e);
        }
        Ok(())
    }

    async fn update<'a>(&self, id: R::Id, mutation: Mutation<'a, R>) -> Result<R> {
        let mut records = self.records.write().await;
        let previous = records.get(&id).cloned();
        let updated = update_in(&mut records, id, mutation)?;

        if let Err(e) = self.persist(&records).await {
            if let Some(previous) = previous {
                records.insert(id, previous);
            }
            return Err(e);
        }
        Ok(updated)
    }

    async fn remove(&self, id: R::Id) -> Result<R> {
        let mut records = self.records.write().await;
        let removed = remove_from(&mut records, id)?;

        if let Err(e) = self.persist(&records).await {
            records.insert(id, removed);
            return Err(e);
        }
        Ok(removed)
    }

    async fn max_id(&self) -> Result<Option<R::Id>> {
        Ok(self.records.read().await.keys().next_back().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::tests::{Note, note};

    #[tokio::test]
    async fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonFileRecordStore<Note> =
            JsonFileRecordStore::open(dir.path().join("notes.json"))
                .await
                .unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store: JsonFileRecordStore<Note> = JsonFileRecordStore::open(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_are_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        let store = JsonFileRecordStore::open(&path).await.unwrap();

        store.insert(note(1, "a")).await.unwrap();
        store
            .update(1, Box::new(|n: &mut Note| n.text = "b".to_string()))
            .await
            .unwrap();

        let on_disk: Vec<Note> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, vec![note(1, "b")]);
    }
}
