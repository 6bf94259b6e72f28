//! # Deferred Actions
//!
//! Delayed navigation ("show a notice, then redirect after two seconds") and
//! view liveness. A [`DelayedAction`] is the only handle to a pending action:
//! cancelling or dropping it before the delay elapses guarantees the action
//! never runs, so a torn-down view cannot be navigated from a stale timer.
//!
//! ```text
//! defer(delay, action)
//!     ├── DelayedAction   (held by the view, dropped on teardown)
//!     └── ScheduledTask   (handed to the host's Spawn implementation)
//!             sleep(delay) → aborted?  → false
//!                          → action()  → true
//! ```

use async_trait::async_trait;
use futures::future::{AbortHandle, Abortable, LocalBoxFuture};
use futures::FutureExt;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Source of delays.
#[async_trait(?Send)]
pub trait Timer {
    async fn sleep(&self, duration: Duration);
}

/// Handle to a scheduled action. Dropping it cancels the action.
#[derive(Debug)]
pub struct DelayedAction {
    handle: AbortHandle,
    delay: Duration,
}

impl DelayedAction {
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_aborted()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for DelayedAction {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Future that sleeps then runs the action; resolves to whether it ran.
pub type ScheduledTask = LocalBoxFuture<'static, bool>;

/// Hands scheduled tasks to whatever drives futures in the host.
pub trait Spawn {
    fn spawn(&self, task: ScheduledTask);
}

#[derive(Clone)]
pub struct Scheduler {
    timer: Rc<dyn Timer>,
    spawner: Rc<dyn Spawn>,
}

impl Scheduler {
    pub fn new(timer: Rc<dyn Timer>, spawner: Rc<dyn Spawn>) -> Self {
        Self { timer, spawner }
    }

    /// Builds the task without spawning it.
    pub fn schedule<F>(&self, delay: Duration, action: F) -> (DelayedAction, ScheduledTask)
    where
        F: FnOnce() + 'static,
    {
        let (handle, registration) = AbortHandle::new_pair();
        let timer = Rc::clone(&self.timer);
        let sleep = Abortable::new(async move { timer.sleep(delay).await }, registration);
        let check = handle.clone();

        let task = async move {
            // A cancel that lands while the timer is completing still wins.
            match sleep.await {
                Ok(()) if !check.is_aborted() => {
                    action();
                    true
                }
                _ => false,
            }
        }
        .boxed_local();

        (DelayedAction { handle, delay }, task)
    }

    /// Schedules the action and spawns it; the returned handle cancels it.
    pub fn defer<F>(&self, delay: Duration, action: F) -> DelayedAction
    where
        F: FnOnce() + 'static,
    {
        let (pending, task) = self.schedule(delay, action);
        self.spawner.spawn(task);
        pending
    }
}

/// Spawns onto the browser event loop.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalSpawner;

#[cfg(target_arch = "wasm32")]
impl Spawn for LocalSpawner {
    fn spawn(&self, task: ScheduledTask) {
        worker::wasm_bindgen_futures::spawn_local(async move {
            task.await;
        });
    }
}

/// Timer backed by `setTimeout` through `worker::Delay`.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkerTimer;

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl Timer for WorkerTimer {
    async fn sleep(&self, duration: Duration) {
        worker::Delay::from(duration).await;
    }
}

/// Mounted flag shared between a view and its in-flight async work.
///
/// Async work checks [`Liveness::is_alive`] after every await before touching
/// view state.
#[derive(Clone, Debug)]
pub struct Liveness {
    alive: Rc<Cell<bool>>,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Rc::new(Cell::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Marks the view as torn down.
    pub fn unmount(&self) {
        self.alive.set(false);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}
