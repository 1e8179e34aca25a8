//! Deadlines for socket operations.

use std::future::Future;
use std::time::Duration;

use crate::error::{ProtocolError, Result};

/// Per-read deadline; vanilla clients are dropped after 30 seconds of silence
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between KeepAlive broadcasts
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// How long shutdown waits for sessions to drain
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `fut` with a deadline, mapping expiry to [`ProtocolError::Timeout`].
pub async fn with_timeout_error<F, T>(fut: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProtocolError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expiry_maps_to_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ProtocolError>(1)
        };
        let res = with_timeout_error(slow, Duration::from_secs(1)).await;
        assert!(matches!(res, Err(ProtocolError::Timeout)));
    }

    #[tokio::test]
    async fn inner_result_passes_through() {
        let res = with_timeout_error(async { Ok::<_, ProtocolError>(7) }, READ_TIMEOUT).await;
        assert_eq!(res.unwrap(), 7);

        let res = with_timeout_error(
            async { Err::<u8, _>(ProtocolError::ConnectionClosed) },
            READ_TIMEOUT,
        )
        .await;
        assert!(matches!(res, Err(ProtocolError::ConnectionClosed)));
    }
}
