use std::future::Future;
use std::time::Duration;

use crate::error::{Result, ZnpError};

/// Bound any ZNP operation by `duration`.
///
/// The engine itself never times out. On expiry the inner future is dropped,
/// which unregisters any waiter it owns, and [`ZnpError::Timeout`] is
/// returned.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| ZnpError::Timeout(duration))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expiry_maps_to_timeout_error() {
        let never = std::future::pending::<Result<()>>();
        let err = with_timeout(Duration::from_secs(5), never).await.unwrap_err();
        assert!(matches!(err, ZnpError::Timeout(d) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn inner_result_passes_through() {
        let ok = with_timeout(Duration::from_secs(1), async { Ok(7u8) }).await;
        assert_eq!(ok.unwrap(), 7);

        let failed = with_timeout(Duration::from_secs(1), async {
            Err::<u8, _>(ZnpError::Status(2))
        })
        .await;
        assert!(matches!(failed, Err(ZnpError::Status(2))));
    }
}
