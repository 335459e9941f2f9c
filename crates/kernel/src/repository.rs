//! Generic persistence port consumed by resource modules.
//!
//! Resource handlers depend on `Repository<T>` rather than on a concrete
//! store, so the SQL-backed implementation and the in-memory fake used by
//! tests are interchangeable.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;

/// A record whose identifier is assigned by the storage layer on first save.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Copy + Ord + Debug + Send + Sync + 'static;

    /// Identifier, absent until the entity has been persisted.
    fn id(&self) -> Option<Self::Id>;

    /// Same entity carrying the given identifier.
    fn with_id(self, id: Self::Id) -> Self;
}

/// CRUD capability set over a single entity type.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// All stored entities in insertion order.
    async fn find_all(&self) -> anyhow::Result<Vec<T>>;

    async fn find_by_id(&self, id: T::Id) -> anyhow::Result<Option<T>>;

    async fn exists_by_id(&self, id: T::Id) -> anyhow::Result<bool>;

    /// Insert when the entity has no id, otherwise overwrite the stored row
    /// (inserting it if no row carries that id). Returns the stored entity.
    async fn save(&self, entity: T) -> anyhow::Result<T>;

    /// Remove the row if present; a missing id is not an error.
    async fn delete_by_id(&self, id: T::Id) -> anyhow::Result<()>;
}

struct Store<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

/// Process-local repository with storage-assigned, never reused ids.
pub struct InMemoryRepository<T> {
    store: Mutex<Store<T>>,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut Store<T>) -> R) -> anyhow::Result<R> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| anyhow!("in-memory repository lock poisoned"))?;
        Ok(f(&mut store))
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Repository<T> for InMemoryRepository<T>
where
    T: Entity<Id = i64>,
{
    async fn find_all(&self) -> anyhow::Result<Vec<T>> {
        self.with_store(|store| store.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<T>> {
        self.with_store(|store| store.rows.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: i64) -> anyhow::Result<bool> {
        self.with_store(|store| store.rows.contains_key(&id))
    }

    async fn save(&self, entity: T) -> anyhow::Result<T> {
        self.with_store(|store| {
            let id = match entity.id() {
                Some(id) => {
                    store.next_id = store.next_id.max(id.saturating_add(1));
                    id
                }
                None => {
                    let id = store.next_id;
                    store.next_id += 1;
                    id
                }
            };
            let saved = entity.with_id(id);
            store.rows.insert(id, saved.clone());
            saved
        })
    }

    async fn delete_by_id(&self, id: i64) -> anyhow::Result<()> {
        self.with_store(|store| {
            store.rows.remove(&id);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: Option<i64>,
        body: String,
    }

    impl Note {
        fn draft(body: &str) -> Self {
            Self {
                id: None,
                body: body.to_string(),
            }
        }
    }

    impl Entity for Note {
        type Id = i64;

        fn id(&self) -> Option<i64> {
            self.id
        }

        fn with_id(self, id: i64) -> Self {
            Self { id: Some(id), ..self }
        }
    }

    #[tokio::test]
    async fn save_assigns_sequential_ids() {
        let repo = InMemoryRepository::<Note>::new();
        let first = repo.save(Note::draft("a")).await.unwrap();
        let second = repo.save(Note::draft("b")).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(repo.find_all().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = InMemoryRepository::<Note>::new();
        let first = repo.save(Note::draft("a")).await.unwrap();
        repo.delete_by_id(1).await.unwrap();

        assert!(!repo.exists_by_id(1).await.unwrap());
        let next = repo.save(Note::draft("b")).await.unwrap();
        assert_ne!(next.id, first.id);
    }

    #[tokio::test]
    async fn save_with_id_overwrites_or_inserts() {
        let repo = InMemoryRepository::<Note>::new();
        let stored = repo.save(Note::draft("a")).await.unwrap();

        let updated = repo
            .save(Note {
                id: stored.id,
                body: "changed".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(repo.find_by_id(1).await.unwrap(), Some(updated));

        let upserted = repo
            .save(Note {
                id: Some(10),
                body: "fresh".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
        assert_eq!(repo.find_by_id(10).await.unwrap(), Some(upserted));
        assert_eq!(repo.save(Note::draft("c")).await.unwrap().id, Some(11));
    }

    #[tokio::test]
    async fn save_with_largest_id_does_not_overflow() {
        let repo = InMemoryRepository::<Note>::new();
        let saved = repo
            .save(Note {
                id: Some(i64::MAX),
                body: "edge".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(saved.id, Some(i64::MAX));
        assert!(repo.exists_by_id(i64::MAX).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_missing_id_is_a_no_op() {
        let repo: InMemoryRepository<Note> = InMemoryRepository::new();
        repo.delete_by_id(42).await.unwrap();
        assert!(repo.find_all().await.unwrap().is_empty());
    }
}
