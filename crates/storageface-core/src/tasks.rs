//! File tasks and the shared task list workers claim from.
//!
//! Claim and complete both take the list's mutex, so a task is handed to
//! exactly one worker and only that worker moves it to a terminal state.
//! Tasks are claimed in enumeration order.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }
}

/// One file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub local_path: PathBuf,
    /// `/`-separated destination inside the repository.
    pub destination: String,
    pub size: u64,
    pub status: TaskStatus,
    pub error: Option<String>,
}

impl FileTask {
    pub fn new(local_path: PathBuf, destination: String, size: u64) -> Self {
        Self {
            local_path,
            destination,
            size,
            status: TaskStatus::Pending,
            error: None,
        }
    }
}

/// What a worker gets when it claims a task: enough to upload without holding the lock.
#[derive(Debug, Clone)]
pub struct ClaimedTask {
    pub index: usize,
    pub local_path: PathBuf,
    pub destination: String,
    pub size: u64,
}

#[derive(Debug)]
struct Inner {
    tasks: Vec<FileTask>,
    next: usize,
}

#[derive(Debug)]
pub struct TaskList {
    inner: Mutex<Inner>,
}

impl TaskList {
    pub fn new(tasks: Vec<FileTask>) -> Self {
        Self {
            inner: Mutex::new(Inner { tasks, next: 0 }),
        }
    }

    // A worker that panicked mid-update cannot leave a task half-written, so
    // the data behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_bytes(&self) -> u64 {
        self.lock().tasks.iter().map(|t| t.size).sum()
    }

    /// Claims the next pending task and marks it in-progress.
    pub fn claim(&self) -> Option<ClaimedTask> {
        let mut inner = self.lock();
        while inner.next < inner.tasks.len() {
            let index = inner.next;
            inner.next += 1;
            let task = &mut inner.tasks[index];
            if task.status == TaskStatus::Pending {
                task.status = TaskStatus::InProgress;
                return Some(ClaimedTask {
                    index,
                    local_path: task.local_path.clone(),
                    destination: task.destination.clone(),
                    size: task.size,
                });
            }
        }
        None
    }

    /// Moves a claimed task to `Done` or `Failed`. Returns false (and changes
    /// nothing) if the task was not in progress.
    pub fn complete(&self, index: usize, outcome: Result<(), String>) -> bool {
        let mut inner = self.lock();
        let Some(task) = inner.tasks.get_mut(index) else {
            return false;
        };
        if task.status != TaskStatus::InProgress {
            return false;
        }
        match outcome {
            Ok(()) => task.status = TaskStatus::Done,
            Err(message) => {
                task.status = TaskStatus::Failed;
                task.error = Some(message);
            }
        }
        true
    }

    pub fn snapshot(&self) -> Vec<FileTask> {
        self.lock().tasks.clone()
    }

    pub fn all_terminal(&self) -> bool {
        self.lock().tasks.iter().all(|t| t.status.is_terminal())
    }
}
