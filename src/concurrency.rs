//! The one place the endpoint's core logic names a concrete concurrency
//! primitive. Everywhere else in the crate talks in terms of "spawn a task"
//! and "attach a completion callback"; here that's `tokio::spawn` and
//! `tokio::task::JoinHandle`.

use std::future::Future;

use tokio::task::{AbortHandle, JoinHandle};

/// Spawns `fut` on the current executor, returning both the join half (to be
/// awaited by a completion callback) and a cheaply cloneable abort half (to be
/// stashed wherever cancellation needs to reach the task from outside).
pub fn spawn_cancellable<F, T>(fut: F) -> (JoinHandle<T>, AbortHandle)
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(fut);
    let abort = handle.abort_handle();
    (handle, abort)
}
