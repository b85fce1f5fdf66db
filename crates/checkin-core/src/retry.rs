use std::future::Future;

use tracing::warn;

use crate::error::ProtocolError;

/// Rebuild-and-resend at most once, and only when the blockhash expired
/// between composition and submission. Anything else surfaces at once.
#[derive(Debug, Default, Clone, Copy)]
pub struct RetryPolicy;

impl RetryPolicy {
    pub const MAX_ATTEMPTS: u32 = 2;

    /// Runs `attempt(n)` for `n = 1, 2, ...`. Each call must build its
    /// transaction from scratch.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, ProtocolError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ProtocolError>>,
    {
        let mut number = 1;
        loop {
            match attempt(number).await {
                Err(e) if e.is_freshness_expired() && number < Self::MAX_ATTEMPTS => {
                    warn!(operation, attempt = number, "blockhash expired, rebuilding transaction");
                    number += 1;
                }
                outcome => return outcome,
            }
        }
    }
}
