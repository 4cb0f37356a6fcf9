use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;

/// A value that can be kept in a [`RecordStore`].
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Key type; records are listed in ascending key order.
    type Id: Copy + Ord + Display + Send + Sync + 'static;

    /// Record type name used in logs and metrics.
    const KIND: &'static str;

    /// Returns the record's key.
    fn id(&self) -> Self::Id;
}

/// In-place change applied by [`RecordStore::update`] while the store is locked.
pub type Mutation<'a, R> = Box<dyn FnOnce(&mut R) + Send + 'a>;

/// Keyed storage with read, create and update-by-id.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Loads a record by id.
    async fn get(&self, id: R::Id) -> Result<Option<R>>;

    /// Lists all records in ascending id order.
    async fn list(&self) -> Result<Vec<R>>;

    /// Creates a record.
    ///
    /// Fails with [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists)
    /// if the id is taken.
    async fn insert(&self, record: R) -> Result<()>;

    /// Applies `mutation` to the stored record and returns the updated copy.
    ///
    /// The read-modify-write happens under one lock acquisition.
    async fn update<'a>(&self, id: R::Id, mutation: Mutation<'a, R>) -> Result<R>;

    /// Removes a record and returns it.
    async fn remove(&self, id: R::Id) -> Result<R>;

    /// Returns the highest stored id, if any.
    async fn max_id(&self) -> Result<Option<R::Id>> {
        Ok(self.list().await?.last().map(Record::id))
    }
}

#[async_trait]
impl<R, S> RecordStore<R> for Arc<S>
where
    R: Record,
    S: RecordStore<R> + ?Sized,
{
    async fn get(&self, id: R::Id) -> Result<Option<R>> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<R>> {
        (**self).list().await
    }

    async fn insert(&self, record: R) -> Result<()> {
        (**self).insert(record).await
    }

    async fn update<'a>(&self, id: R::Id, mutation: Mutation<'a, R>) -> Result<R> {
        (**self).update(id, mutation).await
    }

    async fn remove(&self, id: R::Id) -> Result<R> {
        (**self).remove(id).await
    }

    async fn max_id(&self) -> Result<Option<R::Id>> {
        (**self).max_id().await
    }
}
