//! Bounded-concurrency task runner.
//!
//! Runs a list of async tasks with at most `pool` in flight, keeping each
//! result in the slot of the task that produced it. Workers are futures
//! polled together on the caller's task, so tasks need not be `Send` or
//! `'static`.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Mutex;

use futures_util::FutureExt;
use futures_util::future::join_all;

/// Failure captured for a single task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError<E> {
    #[error("{0}")]
    Failed(E),

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Result slot of one task.
pub type TaskResult<T, E> = Result<T, TaskError<E>>;

/// Runs `tasks` with at most `pool` running concurrently.
///
/// Returns one result per task in input order. A task that fails or panics
/// only fills its own slot; the remaining tasks still run. A `pool` of 0 is
/// treated as 1.
pub async fn run_bounded<F, Fut, T, E>(pool: usize, tasks: Vec<F>) -> Vec<TaskResult<T, E>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let total = tasks.len();
    if total == 0 {
        return Vec::new();
    }

    let workers = pool.max(1).min(total);
    let queue = Mutex::new(tasks.into_iter().enumerate());

    let finished = join_all((0..workers).map(|_| worker(&queue))).await;

    let mut slots: Vec<(usize, TaskResult<T, E>)> = finished.into_iter().flatten().collect();
    slots.sort_by_key(|(index, _)| *index);
    slots.into_iter().map(|(_, result)| result).collect()
}

/// Claims tasks from the shared cursor until it is exhausted.
async fn worker<I, F, Fut, T, E>(queue: &Mutex<I>) -> Vec<(usize, TaskResult<T, E>)>
where
    I: Iterator<Item = (usize, F)>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut done = Vec::new();
    loop {
        let claimed = match queue.lock() {
            Ok(mut q) => q.next(),
            Err(poisoned) => poisoned.into_inner().next(),
        };
        let Some((index, task)) = claimed else {
            break;
        };

        let outcome = AssertUnwindSafe(async move { task().await })
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(TaskError::Failed(e)),
            Err(payload) => Err(TaskError::Panicked(panic_message(payload))),
        };
        done.push((index, result));
    }
    done
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
