//! Constant-backoff retry for foreign-chain calls.

use std::{future::Future, time::Duration};

use tracing::*;

use crate::error::EvmResult;

/// Retries `op` until it succeeds, sleeping `backoff` between attempts.
///
/// A permanently unreachable foreign chain stalls the caller rather than
/// letting it skip verification, which is the intended failure mode for
/// anything feeding the deterministic path. Only ever run this off that
/// path.
pub async fn retry_forever<T, F, Fut>(what: &str, backoff: Duration, mut op: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = EvmResult<T>>,
{
    let mut attempt = 0u64;
    loop {
        match op().await {
            Ok(v) => return v,
            Err(err) => {
                attempt += 1;
                warn!(%what, %attempt, %err, "foreign chain call failed, retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::EvmError;

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let out = retry_forever("test", Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(EvmError::transport("down"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(out, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
