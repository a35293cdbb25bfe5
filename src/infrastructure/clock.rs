use std::time::{Duration, Instant};
use crate::domain::HopstatError;
use crate::ports::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl TokioClock {
    pub fn new() -> Self { Self }
}

impl Clock for TokioClock {
    fn now(&self) -> Instant { Instant::now() }

    async fn timeout<F, T>(&self, duration: Duration, future: F) -> Result<T, HopstatError>
    where
        F: std::future::Future<Output = T> + Send,
        T: Send,
    {
        tokio::time::timeout(duration, future).await
            .map_err(|_| HopstatError::timeout(format!("request timed out after {:?}", duration)))
    }
}
