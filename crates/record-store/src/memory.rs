use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Mutation, Record, RecordStore, Result, StoreError};

/// In-memory record store.
///
/// Cloning shares the underlying map.
pub struct InMemoryRecordStore<R: Record> {
    records: Arc<RwLock<BTreeMap<R::Id, R>>>,
}

impl<R: Record> InMemoryRecordStore<R> {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl<R: Record> Clone for InMemoryRecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

impl<R: Record> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn insert_into<R: Record>(map: &mut BTreeMap<R::Id, R>, record: R) -> Result<()> {
    let id = record.id();
    if map.contains_key(&id) {
        return Err(StoreError::AlreadyExists { id: id.to_string() });
    }
    map.insert(id, record);
    Ok(())
}

pub(crate) fn update_in<R: Record>(
    map: &mut BTreeMap<R::Id, R>,
    id: R::Id,
    mutation: Mutation<'_, R>,
) -> Result<R> {
    let record = map
        .get_mut(&id)
        .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
    mutation(record);
    Ok(record.clone())
}

pub(crate) fn remove_from<R: Record>(map: &mut BTreeMap<R::Id, R>, id: R::Id) -> Result<R> {
    map.remove(&id)
        .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
}

#[async_trait]
impl<R: Record> RecordStore<R> for InMemoryRecordStore<R> {
    async fn get(&self, id: R::Id) -> Result<Option<R>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<R>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn insert(&self, record: R) -> Result<()> {
        let mut records = self.records.write().await;
        insert_into(&mut records, record)
    }

    async fn update<'a>(&self, id: R::Id, mutation: Mutation<'a, R>) -> Result<R> {
        let mut records = self.records.write().await;
        update_in(&mut records, id, mutation)
    }

    async fn remove(&self, id: R::Id) -> Result<R> {
        let mut records = self.records.write().await;
        remove_from(&mut records, id)
    }

    async fn max_id(&self) -> Result<Option<R::Id>> {
        Ok(self.records.read().await.keys().next_back().copied())
    }
}
