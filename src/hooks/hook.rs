//! # Hook: a lifecycle callback with an explicit calling convention.
//!
//! Like commands, hooks are tagged rather than inferred:
//! - [`Hook::Blocking`] runs on tokio's blocking pool (`spawn_blocking`), so a slow
//!   synchronous hook never stalls the run task;
//! - [`Hook::NonBlocking`] is awaited directly on the run task.
//!
//! Both variants contain panics and surface them as [`HookError::Panicked`].

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::error::{panic_message, HookError};

type BlockingFn<A, R> = Arc<dyn Fn(A) -> Result<R, HookError> + Send + Sync>;
type NonBlockingFn<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<R, HookError>> + Send + Sync>;

/// Callback taking `A` and producing `R` (`()` for notification hooks).
pub enum Hook<A, R = ()> {
    /// Synchronous callback, executed via `spawn_blocking`.
    Blocking(BlockingFn<A, R>),
    /// Asynchronous callback, awaited on the run task.
    NonBlocking(NonBlockingFn<A, R>),
}

impl<A, R> Hook<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
{
    /// Wraps a synchronous closure.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(A) -> Result<R, HookError> + Send + Sync + 'static,
    {
        Hook::Blocking(Arc::new(f))
    }

    /// Wraps a future-producing closure.
    pub fn non_blocking<F, Fut>(f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HookError>> + Send + 'static,
    {
        Hook::NonBlocking(Arc::new(move |args| f(args).boxed()))
    }

    /// Invokes the hook, converting panics into [`HookError::Panicked`].
    pub(crate) async fn invoke(&self, args: A) -> Result<R, HookError> {
        match self {
            Hook::Blocking(f) => {
                let f = Arc::clone(f);
                match tokio::task::spawn_blocking(move || f(args)).await {
                    Ok(res) => res,
                    Err(e) if e.is_panic() => Err(HookError::Panicked {
                        error: panic_message(&*e.into_panic()),
                    }),
                    Err(e) => Err(HookError::fail(e)),
                }
            }
            Hook::NonBlocking(f) => {
                let f = Arc::clone(f);
                // The closure call itself happens inside the guarded future.
                match AssertUnwindSafe(async move { f(args).await })
                    .catch_unwind()
                    .await
                {
                    Ok(res) => res,
                    Err(payload) => Err(HookError::Panicked {
                        error: panic_message(&*payload),
                    }),
                }
            }
        }
    }
}

impl<A, R> Clone for Hook<A, R> {
    fn clone(&self) -> Self {
        match self {
            Hook::Blocking(f) => Hook::Blocking(Arc::clone(f)),
            Hook::NonBlocking(f) => Hook::NonBlocking(Arc::clone(f)),
        }
    }
}

impl<A, R> fmt::Debug for Hook<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Blocking(_) => f.write_str("Hook::Blocking"),
            Hook::NonBlocking(_) => f.write_str("Hook::NonBlocking"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocking_hook_returns_value() {
        let hook: Hook<u32, u32> = Hook::blocking(|x| Ok(x * 2));
        assert_eq!(hook.invoke(21).await, Ok(42));
    }

    #[tokio::test]
    async fn blocking_hook_panic_is_contained() {
        let hook: Hook<()> = Hook::blocking(|_| panic!("boom"));
        let err = hook.invoke(()).await.unwrap_err();
        assert_eq!(
            err,
            HookError::Panicked {
                error: "boom".into()
            }
        );
    }

    #[tokio::test]
    async fn non_blocking_hook_panic_is_contained() {
        fn explode() -> Result<(), HookError> {
            panic!("async boom")
        }
        let hook: Hook<()> = Hook::non_blocking(|_| async { explode() });
        let err = hook.invoke(()).await.unwrap_err();
        assert_eq!(err.as_label(), "hook_panicked");
    }

    #[tokio::test]
    async fn non_blocking_hook_error_passes_through() {
        let hook: Hook<&'static str> =
            Hook::non_blocking(|who| async move { Err(HookError::fail(format!("no {who}"))) });
        assert_eq!(hook.invoke("fog").await, Err(HookError::fail("no fog")));
    }
}
