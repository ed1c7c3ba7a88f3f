//! Cooperative fixed-period task scheduler.
//!
//! A [`TaskScheduler`] holds up to `N` periodic actions. Each call to
//! [`update`](TaskScheduler::update) runs, in registration order, every
//! action whose period has elapsed since it last ran. There is no catch-up:
//! an action that overran its period simply runs again on the next
//! eligible update.
//!
//! Actions are plain function pointers taking the shared context by
//! mutable reference, so a scheduler never captures state of its own.
//!
//! # Example
//!
//! ```rust
//! use moar_core::TaskScheduler;
//!
//! fn bump(counter: &mut u32) {
//!     *counter += 1;
//! }
//!
//! let mut scheduler = TaskScheduler::<u32, 4>::new();
//! scheduler.add(bump, 10);
//!
//! let mut counter = 0;
//! scheduler.update(10, &mut counter);
//! scheduler.update(15, &mut counter); // too early
//! scheduler.update(20, &mut counter);
//! assert_eq!(counter, 2);
//! ```

use crate::time::{Millis, elapsed};

/// Periodic action signature.
pub type Action<C> = fn(&mut C);

/// One registered periodic action.
#[derive(Debug)]
pub struct Task<C> {
    action: Action<C>,
    period: Millis,
    last_run: Millis,
}

impl<C> Clone for Task<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Task<C> {}

impl<C> Task<C> {
    /// Period between runs in milliseconds.
    pub const fn period(&self) -> Millis {
        self.period
    }

    /// Timestamp of the last run (0 before the first run).
    pub const fn last_run(&self) -> Millis {
        self.last_run
    }
}

/// Fixed-capacity list of periodic actions.
///
/// # Type Parameters
///
/// - `C`: context handed to every action
/// - `N`: maximum number of tasks (compile-time constant for no_std)
#[derive(Debug)]
pub struct TaskScheduler<C, const N: usize> {
    tasks: [Option<Task<C>>; N],
    count: usize,
}

impl<C, const N: usize> TaskScheduler<C, N> {
    /// Creates an empty scheduler.
    pub const fn new() -> Self {
        Self {
            tasks: [None; N],
            count: 0,
        }
    }

    /// Registers an action to run every `period` milliseconds.
    ///
    /// Intended for initialisation only. Returns `false` when the scheduler
    /// is at capacity.
    pub fn add(&mut self, action: Action<C>, period: Millis) -> bool {
        if self.count == N {
            #[cfg(feature = "tracing")]
            tracing::warn!(capacity = N, "task scheduler full");
            return false;
        }
        self.tasks[self.count] = Some(Task {
            action,
            period,
            last_run: 0,
        });
        self.count += 1;
        true
    }

    /// Runs every due action against `ctx`.
    ///
    /// Returns the number of actions invoked.
    pub fn update(&mut self, now: Millis, ctx: &mut C) -> usize {
        let mut ran = 0;
        for task in self.tasks.iter_mut().flatten() {
            if elapsed(now, task.last_run) >= task.period {
                (task.action)(ctx);
                task.last_run = now;
                ran += 1;
            }
        }
        ran
    }

    /// Number of registered tasks.
    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// True if no task has been registered.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Maximum number of tasks.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Iterates over registered tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task<C>> {
        self.tasks.iter().flatten()
    }
}

impl<C, const N: usize> Default for TaskScheduler<C, N> {
    fn default() -> Self {
        Self::new()
    }
}
