use bevy_defer::{AccessResult, Task};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum TaskKind {
    Listener,
    Connection(usize),
}

/// Tasks owned by the server. Dropping an entry cancels its task.
#[derive(Clone, Debug, Default)]
pub(crate) struct TaskStore(Arc<DashMap<TaskKind, Task<AccessResult>>>);

impl TaskStore {
    pub(crate) fn insert(&self, kind: TaskKind, task: Task<AccessResult>) {
        self.cleanup_finished();
        self.0.insert(kind, task);
    }

    pub(crate) fn is_running(&self, kind: TaskKind) -> bool {
        self.0
            .get(&kind)
            .is_some_and(|task| !task.value().is_finished())
    }

    pub(crate) fn finished_count(&self) -> usize {
        self.0
            .iter()
            .filter(|entry| entry.value().is_finished())
            .count()
    }

    pub(crate) fn cleanup_finished(&self) {
        self.0.retain(|_, task| !task.is_finished());
    }

    pub(crate) fn clear(&self) {
        self.0.clear();
    }
}
