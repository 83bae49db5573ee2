//! Fork-join plumbing for the aggregation workflows.
//!
//! A workflow forks a small fixed set of downstream fetches, each spawned
//! onto the runtime with its own result slot (the join handle). The tasks
//! share one cancellation token: the first task to fail cancels it, and the
//! join waits for every task before inspecting results, so a call that is
//! already past its cancellation check may still complete but its result is
//! discarded, never used to build a response.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

/// Spawn one arm of a fork-join group. The future races the shared token;
/// on failure it cancels the token so sibling arms abort their I/O promptly.
pub(crate) fn spawn_guarded<T, Fut>(
    token: &CancellationToken,
    fut: Fut,
) -> JoinHandle<GatewayResult<T>>
where
    T: Send + 'static,
    Fut: Future<Output = GatewayResult<T>> + Send + 'static,
{
    let token = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => Err(GatewayError::Cancelled),
            result = fut => {
                if result.is_err() {
                    token.cancel();
                }
                result
            }
        }
    })
}

/// Wait for both arms, then surface the originating error if either failed.
pub(crate) async fn join2<A, B>(
    a: JoinHandle<GatewayResult<A>>,
    b: JoinHandle<GatewayResult<B>>,
) -> GatewayResult<(A, B)> {
    let (a, b) = tokio::join!(a, b);
    match (flatten(a), flatten(b)) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (a, b) => Err(pick_error([a.err(), b.err()])),
    }
}

/// Wait for all three arms, then surface the originating error if any
/// failed. Completion order is irrelevant: each result stays attributed to
/// its own slot.
pub(crate) async fn join3<A, B, C>(
    a: JoinHandle<GatewayResult<A>>,
    b: JoinHandle<GatewayResult<B>>,
    c: JoinHandle<GatewayResult<C>>,
) -> GatewayResult<(A, B, C)> {
    let (a, b, c) = tokio::join!(a, b, c);
    match (flatten(a), flatten(b), flatten(c)) {
        (Ok(a), Ok(b), Ok(c)) => Ok((a, b, c)),
        (a, b, c) => Err(pick_error([a.err(), b.err(), c.err()])),
    }
}

fn flatten<T>(joined: Result<GatewayResult<T>, tokio::task::JoinError>) -> GatewayResult<T> {
    match joined {
        Ok(result) => result,
        Err(err) => Err(GatewayError::Internal(format!("fork-join task: {err}"))),
    }
}

/// The error of the arm that won the cancellation race. Arms that merely
/// observed the token report `Cancelled` and never shadow the real cause.
fn pick_error<const N: usize>(errors: [Option<GatewayError>; N]) -> GatewayError {
    let mut cancelled = None;
    for err in errors.into_iter().flatten() {
        if matches!(err, GatewayError::Cancelled) {
            cancelled = Some(err);
        } else {
            return err;
        }
    }
    debug!("fork-join group ended with only cancelled arms");
    cancelled.unwrap_or_else(|| GatewayError::Internal("fork-join produced no error".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::time::Duration;

    #[tokio::test]
    async fn all_arms_succeed() {
        let token = CancellationToken::new();
        let a = spawn_guarded(&token, async { Ok(1) });
        let b = spawn_guarded(&token, async { Ok("two") });
        let (a, b) = join2(a, b).await.unwrap();
        assert_eq!((a, b), (1, "two"));
    }

    #[tokio::test]
    async fn first_error_cancels_siblings_and_wins() {
        let token = CancellationToken::new();

        // An arm that would only finish after a long sleep; it must observe
        // the cancellation instead.
        let slow = spawn_guarded(&token, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, GatewayError>(1)
        });
        let failing = spawn_guarded::<i32, _>(&token, async {
            Err(GatewayError::Downstream {
                status: StatusCode::NOT_FOUND,
                message: "book not found".into(),
            })
        });

        let err = join2(slow, failing).await.unwrap_err();
        match err {
            GatewayError::Downstream { status, .. } => {
                assert_eq!(status, StatusCode::NOT_FOUND)
            }
            other => panic!("expected the originating error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn late_success_is_discarded() {
        let token = CancellationToken::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        // This arm cannot observe cancellation and completes normally.
        let unstoppable = tokio::spawn(async move {
            let _ = rx.await;
            Ok::<_, GatewayError>(99)
        });
        let failing = spawn_guarded::<i32, _>(&token, async {
            Err(GatewayError::Precondition("no stars".into()))
        });

        let _ = tx.send(());
        let err = join2(unstoppable, failing).await.unwrap_err();
        assert!(matches!(err, GatewayError::Precondition(_)));
    }

    #[tokio::test]
    async fn join3_attributes_error_regardless_of_order() {
        let token = CancellationToken::new();
        let a = spawn_guarded(&token, async { Ok(1) });
        let b = spawn_guarded::<i32, _>(&token, async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(GatewayError::CircuitOpen {
                dependency: "rating".into(),
            })
        });
        let c = spawn_guarded(&token, async { Ok(3) });

        let err = join3(a, b, c).await.unwrap_err();
        assert!(matches!(err, GatewayError::CircuitOpen { .. }));
    }
}
