//! Task records shared between the HTTP layer and running pipelines.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use super::error::TaskStoreError;
use crate::models::task::{Task, TransitionError};

/// Mutation applied to a task under the store's lock.
pub type TaskUpdate<'a> = &'a mut dyn FnMut(&mut Task) -> Result<(), TransitionError>;

/// Concurrent map of task id to task state.
///
/// Reads return snapshots. `update` is atomic: the mutation sees the
/// current record and its changes are kept only if it succeeds.
pub trait TaskStore: Send + Sync {
    fn create(&self, task: Task) -> Result<(), TaskStoreError>;

    fn get(&self, id: &Uuid) -> Result<Task, TaskStoreError>;

    /// Apply `apply` to the task and return the updated snapshot.
    fn update(&self, id: &Uuid, apply: TaskUpdate<'_>) -> Result<Task, TaskStoreError>;

    /// Remove and return the task.
    fn delete(&self, id: &Uuid) -> Result<Task, TaskStoreError>;

    /// All tasks, oldest first.
    fn list(&self) -> Result<Vec<Task>, TaskStoreError>;
}

#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn create(&self, task: Task) -> Result<(), TaskStoreError> {
        let mut tasks = self.tasks.write().map_err(|_| TaskStoreError::LockPoisoned)?;
        if tasks.contains_key(&task.id) {
            return Err(TaskStoreError::AlreadyExists(task.id));
        }
        tasks.insert(task.id, task);
        Ok(())
    }

    fn get(&self, id: &Uuid) -> Result<Task, TaskStoreError> {
        let tasks = self.tasks.read().map_err(|_| TaskStoreError::LockPoisoned)?;
        tasks.get(id).cloned().ok_or(TaskStoreError::NotFound(*id))
    }

    fn update(&self, id: &Uuid, apply: TaskUpdate<'_>) -> Result<Task, TaskStoreError> {
        let mut tasks = self.tasks.write().map_err(|_| TaskStoreError::LockPoisoned)?;
        let current = tasks.get_mut(id).ok_or(TaskStoreError::NotFound(*id))?;
        let mut draft = current.clone();
        apply(&mut draft)?;
        *current = draft.clone();
        Ok(draft)
    }

    fn delete(&self, id: &Uuid) -> Result<Task, TaskStoreError> {
        let mut tasks = self.tasks.write().map_err(|_| TaskStoreError::LockPoisoned)?;
        tasks.remove(id).ok_or(TaskStoreError::NotFound(*id))
    }

    fn list(&self) -> Result<Vec<Task>, TaskStoreError> {
        let tasks = self.tasks.read().map_err(|_| TaskStoreError::LockPoisoned)?;
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by_key(|t| t.created_at);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::TaskStatus;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn task() -> Task {
        Task::new(Uuid::new_v4(), "paper.pdf", PathBuf::from("/tmp/paper.pdf"))
    }

    #[test]
    fn create_then_get_returns_snapshot() {
        let store = InMemoryTaskStore::new();
        let t = task();
        store.create(t.clone()).unwrap();
        assert_eq!(store.get(&t.id).unwrap(), t);
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let store = InMemoryTaskStore::new();
        let t = task();
        store.create(t.clone()).unwrap();
        assert!(matches!(store.create(t), Err(TaskStoreError::AlreadyExists(_))));
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let store = InMemoryTaskStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.get(&id), Err(TaskStoreError::NotFound(_))));
        assert!(matches!(store.delete(&id), Err(TaskStoreError::NotFound(_))));
        assert!(matches!(
            store.update(&id, &mut |t| t.start()),
            Err(TaskStoreError::NotFound(_))
        ));
    }

    #[test]
    fn failed_update_leaves_record_untouched() {
        let store = InMemoryTaskStore::new();
        let t = task();
        store.create(t.clone()).unwrap();
        store.update(&t.id, &mut |t| t.start()).unwrap();

        let result = store.update(&t.id, &mut |t| {
            t.clear_source();
            t.start()
        });
        assert!(matches!(result, Err(TaskStoreError::Transition(_))));
        let stored = store.get(&t.id).unwrap();
        assert!(stored.source_location().is_some());
        assert_eq!(stored.status(), TaskStatus::Processing);
    }

    #[test]
    fn delete_removes_record() {
        let store = InMemoryTaskStore::new();
        let t = task();
        store.create(t.clone()).unwrap();
        assert_eq!(store.delete(&t.id).unwrap().id, t.id);
        assert!(store.get(&t.id).is_err());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn concurrent_starts_admit_exactly_one() {
        let store = Arc::new(InMemoryTaskStore::new());
        let t = task();
        store.create(t.clone()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let id = t.id;
                std::thread::spawn(move || store.update(&id, &mut |t| t.start()).is_ok())
            })
            .collect();
        let started = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(started, 1);
    }
}
