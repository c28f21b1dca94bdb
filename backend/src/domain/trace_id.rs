//! Per-request correlation id.
//!
//! The [`Trace`](crate::Trace) middleware opens a scope for every request;
//! [`Error`](super::Error) constructors read it back so error payloads and
//! log lines for the same request share one id. Spawned tasks do not inherit
//! the scope.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static CURRENT: TraceId;
}

/// Random identifier correlating one request's logs and errors.
///
/// # Examples
/// ```
/// use leads_backend::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let id: TraceId = "3fa85f64-5717-4562-b3fc-2c963f66afa6".parse().expect("uuid");
/// assert_eq!(TraceId::scope(id, async { TraceId::current() }).await, Some(id));
/// assert_eq!(TraceId::current(), None);
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Id of the request being served, if any.
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Run `fut` with `id` as the current trace id.
    pub async fn scope<Fut: Future>(id: Self, fut: Fut) -> Fut::Output {
        CURRENT.scope(id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_only_visible_inside_their_scope() {
        let id = TraceId::generate();

        let inside = TraceId::scope(id, async { TraceId::current() }).await;

        assert_eq!(inside, Some(id));
        assert_eq!(TraceId::current(), None);
    }

    #[tokio::test]
    async fn inner_scope_shadows_outer() {
        let outer = TraceId::generate();
        let inner = TraceId::generate();

        let seen = TraceId::scope(outer, async move {
            let nested = TraceId::scope(inner, async { TraceId::current() }).await;
            (nested, TraceId::current())
        })
        .await;

        assert_eq!(seen, (Some(inner), Some(outer)));
    }

    #[test]
    fn display_parses_back() {
        let id = TraceId::generate();
        assert_eq!(id.to_string().parse::<TraceId>(), Ok(id));
        assert!("request-1".parse::<TraceId>().is_err());
    }
}
