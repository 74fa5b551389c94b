//! Transaction deadline.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ServiceError, ServiceResult};

/// Runs `work` with a deadline.
///
/// On expiry the future is dropped, which drops any open transaction it
/// owns; SQLite rolls that transaction back and the connection returns to
/// the pool.
pub async fn with_deadline<T, F>(operation: &'static str, limit: Duration, work: F) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "Transaction timed out");
            Err(ServiceError::unavailable(format!(
                "{operation} timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detailing_core::ErrorKind;

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_unavailable() {
        let result: ServiceResult<()> = with_deadline("slow", Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unavailable);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_inner_result_passes_through() {
        let ok = with_deadline("fast", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: ServiceResult<()> = with_deadline("fast", Duration::from_secs(1), async {
            Err(ServiceError::internal("boom"))
        })
        .await;
        assert_eq!(err.unwrap_err().kind, ErrorKind::Internal);
    }
}
