//! Request-scoped tasks.
//!
//! A [`Task`] is a suspended computation over a [`RequestEnv`]. Building a task
//! does nothing; [`Task::run`] evaluates it against one request. Tasks are
//! plain values: they can be cloned, stored, and composed with
//! [`map`](Task::map), [`bind`](Task::bind), [`apply`](Task::apply) and
//! [`zip`](Task::zip), always evaluating left to right.
//!
//! [`Task::memo`] turns a task into one that runs at most once per request.
//! The cache lives in the environment, so a new request starts with nothing
//! cached.
//!
//! # Example
//!
//! ```
//! use encore_core::{RequestEnv, Task};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&calls);
//! let lookup = Task::from_fn(move |_env| Ok(counter.fetch_add(1, Ordering::SeqCst)))
//!     .memo();
//! let doubled = lookup.map(|n| n * 2);
//!
//! let env = RequestEnv::builder().build();
//! assert_eq!(lookup.run(&env).await.unwrap(), 0);
//! assert_eq!(doubled.run(&env).await.unwrap(), 0);
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! # }
//! ```

use crate::context::RequestEnv;
use crate::error::{EncoreError, EncoreResult};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type TaskFn<T> = dyn for<'a> Fn(&'a RequestEnv) -> BoxFuture<'a, EncoreResult<T>> + Send + Sync;

/// Identifies one memoized task across every request it is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MemoKey(u64);

impl MemoKey {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MemoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memo#{}", self.0)
    }
}

/// A lazy, composable computation over a request environment.
///
/// Cloning a task is cheap and yields a handle to the same computation;
/// clones of a memoized task share its cache slot.
pub struct Task<T> {
    run: Arc<TaskFn<T>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Task<T> {
    /// Lifts an asynchronous primitive into a task.
    ///
    /// The closure is invoked on every evaluation.
    pub fn from_async<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a RequestEnv) -> BoxFuture<'a, EncoreResult<T>> + Send + Sync + 'static,
    {
        Self { run: Arc::new(f) }
    }

    /// Lifts a synchronous read of the environment into a task.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&RequestEnv) -> EncoreResult<T> + Send + Sync + 'static,
    {
        Self::from_async(move |env| Box::pin(std::future::ready(f(env))))
    }

    /// A task that always yields `value`, with no side effect.
    pub fn pure(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::from_async(move |_env| {
            let value = value.clone();
            Box::pin(async move { Ok(value) })
        })
    }

    /// A task that always fails with `error`.
    pub fn fail(error: EncoreError) -> Self {
        Self::from_async(move |_env| {
            let error = error.clone();
            Box::pin(async move { Err(error) })
        })
    }

    /// Evaluates the task against `env`.
    pub fn run<'a>(&self, env: &'a RequestEnv) -> BoxFuture<'a, EncoreResult<T>> {
        (self.run)(env)
    }

    /// Transforms the output of this task.
    pub fn map<U, F>(&self, f: F) -> Task<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let inner = self.clone();
        let f = Arc::new(f);
        Task::from_async(move |env| {
            let pending = inner.run(env);
            let f = Arc::clone(&f);
            Box::pin(async move { pending.await.map(|value| f(value)) })
        })
    }

    /// Sequences a dependent task after this one.
    ///
    /// A failure of this task short-circuits; `f` is not called.
    pub fn bind<U, F>(&self, f: F) -> Task<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Task<U> + Send + Sync + 'static,
    {
        let inner = self.clone();
        let f = Arc::new(f);
        Task::from_async(move |env| {
            let pending = inner.run(env);
            let f = Arc::clone(&f);
            Box::pin(async move {
                let value = pending.await?;
                f(value).run(env).await
            })
        })
    }

    /// Pairs this task with `other`, evaluating this one first.
    pub fn zip<U: Send + 'static>(&self, other: &Task<U>) -> Task<(T, U)> {
        let left = self.clone();
        let right = other.clone();
        Task::from_async(move |env| {
            let left = left.run(env);
            let right = right.clone();
            Box::pin(async move {
                let a = left.await?;
                let b = right.run(env).await?;
                Ok((a, b))
            })
        })
    }

    /// Returns a task that evaluates this one at most once per request.
    ///
    /// The first evaluation within a [`RequestEnv`] runs the underlying
    /// computation and stores its outcome, error included. Every later
    /// evaluation of this handle (or a clone of it) against the same
    /// environment returns the stored outcome. Concurrent first evaluations
    /// are coalesced into one.
    ///
    /// Each call to `memo` creates a distinct cache slot; memoize once and
    /// share the resulting handle.
    pub fn memo(&self) -> Self
    where
        T: Clone + Sync,
    {
        let key = MemoKey::next();
        let inner = self.clone();
        Self::from_async(move |env| {
            let inner = inner.clone();
            Box::pin(async move {
                let cell = env.memo_cell::<T>(key)?;
                if let Some(outcome) = cell.get() {
                    tracing::trace!(request_id = %env.request_id(), memo = %key, "memo hit");
                    return outcome.clone();
                }
                cell.get_or_init(|| async {
                    tracing::trace!(request_id = %env.request_id(), memo = %key, "memo miss");
                    inner.run(env).await
                })
                .await
                .clone()
            })
        })
    }
}

impl<F: Send + 'static> Task<F> {
    /// Applies the function produced by this task to the value of `arg`.
    ///
    /// The function task is evaluated before the argument task.
    pub fn apply<A, B>(&self, arg: &Task<A>) -> Task<B>
    where
        F: FnOnce(A) -> B,
        A: Send + 'static,
        B: Send + 'static,
    {
        self.zip(arg).map(|(f, a)| f(a))
    }
}
