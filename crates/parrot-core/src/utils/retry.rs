//! Linear-backoff retry for flaky external calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempts made for a forced-alignment call.
pub const ALIGNER_ATTEMPTS: u32 = 3;

/// Backoff unit: attempt `n` failing waits `n × step` before the next one.
pub const ALIGNER_BACKOFF_STEP: Duration = Duration::from_millis(1000);

/// Run `op` up to `max_attempts` times.
///
/// `op` receives the 1-based attempt number. After failed attempt `n` the
/// call sleeps `n × step` on the tokio clock. The last error is returned when
/// every attempt fails.
pub async fn retry_linear<T, E, F, Fut>(
    max_attempts: u32,
    step: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                let delay = step * attempt;
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
