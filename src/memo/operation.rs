//! Wrapped Operation Module
//!
//! The asynchronous operation a [`Memoized`](crate::Memoized) caches.

use std::future::Future;

/// An async, fallible operation over arguments `A`.
///
/// Implemented for every `Fn(A) -> impl Future<Output = Result<V, E>>`.
/// Results are shared between callers, so values and errors must be `Clone`;
/// wrap non-cloneable errors in an `Arc`.
pub trait Operation<A>: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;
    type Error: Clone + Send + Sync + 'static;
    type Future: Future<Output = Result<Self::Output, Self::Error>> + Send + 'static;

    /// Starts one invocation.
    fn invoke(&self, args: A) -> Self::Future;
}

impl<A, F, Fut, V, E> Operation<A> for F
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = V;
    type Error = E;
    type Future = Fut;

    fn invoke(&self, args: A) -> Fut {
        self(args)
    }
}
