//! Concurrent fan-out to every configured provider.
//!
//! All calls are polled together on the current task with
//! [`futures::future::join_all`]; the join resolves only after the slowest
//! provider settles. Nothing is cancelled, retried, or timed out here.

use futures::future::join_all;
use std::future::Future;
use tracing::{debug, warn};

use crate::{
    error::{AggregateError, Outcome, ProviderError},
    model::Domain,
};

/// Invoke `call` on every provider concurrently and return one outcome per
/// provider, in provider order.
pub async fn fan_out<'a, P, T, F, Fut>(providers: &'a [P], call: F) -> Vec<Outcome<T>>
where
    F: Fn(&'a P) -> Fut,
    Fut: Future<Output = Outcome<T>>,
{
    join_all(providers.iter().map(call)).await
}

/// Split settled outcomes into successes, logging each failure.
///
/// Fails with [`AggregateError::AggregateUnavailable`] when nothing succeeded
/// (including when no provider was configured at all).
pub fn collect_successes<T>(
    domain: Domain,
    key: &str,
    outcomes: Vec<Outcome<T>>,
) -> Result<Vec<T>, AggregateError> {
    let total = outcomes.len();
    let mut successes = Vec::with_capacity(total);
    let mut failures: Vec<ProviderError> = Vec::new();

    for outcome in outcomes {
        match outcome {
            Ok(value) => successes.push(value),
            Err(err) => {
                warn!(%domain, key, provider = err.provider(), error = %err, "provider failed");
                failures.push(err);
            }
        }
    }

    debug!(%domain, key, total, succeeded = successes.len(), "fan-out settled");

    if successes.is_empty() {
        return Err(AggregateError::AggregateUnavailable {
            domain,
            key: key.to_string(),
            failures,
        });
    }

    Ok(successes)
}
