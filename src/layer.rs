//! Tower middleware: wrap any `Service` so its calls run under a retry
//! policy.
//!
//! The layer is the decorator form of the orchestrator: attach it with
//! `ServiceBuilder::layer` and every request is driven through the policy's
//! asynchronous attempt loop. The wrapped service's error type is surfaced
//! unchanged; the middleware adds no error variants of its own.

use crate::retry::RetryPolicy;
use futures::future::BoxFuture;
use tower_layer::Layer;
use tower_service::Service;

/// Layer applying a [`RetryPolicy`] to an inner service.
pub struct RetryLayer<E> {
    policy: RetryPolicy<E>,
}

impl<E> std::fmt::Debug for RetryLayer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryLayer").field("policy", &self.policy).finish()
    }
}

impl<E> Clone for RetryLayer<E> {
    fn clone(&self) -> Self {
        Self { policy: self.policy.clone() }
    }
}

impl<E> RetryLayer<E> {
    pub fn new(policy: RetryPolicy<E>) -> Self {
        Self { policy }
    }
}

impl<E> RetryPolicy<E> {
    /// Convert this policy into a tower layer.
    pub fn into_layer(self) -> RetryLayer<E> {
        RetryLayer::new(self)
    }
}

impl<S, E> Layer<S> for RetryLayer<E> {
    type Service = RetryService<S, E>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService { inner, policy: self.policy.clone() }
    }
}

/// Service produced by [`RetryLayer`].
///
/// Each call clones the request per attempt, so requests must be `Clone`;
/// the inner service is cloned per attempt as tower middlewares usually do.
pub struct RetryService<S, E> {
    inner: S,
    policy: RetryPolicy<E>,
}

impl<S: Clone, E> Clone for RetryService<S, E> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), policy: self.policy.clone() }
    }
}

impl<S: std::fmt::Debug, E> std::fmt::Debug for RetryService<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryService")
            .field("inner", &self.inner)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<S, E, Request> Service<Request> for RetryService<S, E>
where
    Request: Clone + Send + 'static,
    S: Service<Request, Error = E> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Future: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = E;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let policy = self.policy.clone();
        let inner = self.inner.clone();
        Box::pin(async move {
            policy
                .execute(move || {
                    let mut service = inner.clone();
                    let request = req.clone();
                    async move { service.call(request).await }
                })
                .await
        })
    }
}
