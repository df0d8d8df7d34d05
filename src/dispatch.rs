use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::client::{ClientError, TileService};
use crate::coord::Position;
use crate::error::ValidationError;
use crate::region::{Region, TileResult};
use crate::threads::{Shutdown, WorkerPool};

/// How often a failed request is reissued before the run fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn fail_fast() -> Self {
        Self::default()
    }

    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Wait before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(retry)
    }
}

/// A region whose computation failed on every attempt.
#[derive(Debug, Error)]
#[error("part at {offset} failed after {attempts} attempt(s): {source}")]
pub struct TileFailure {
    pub offset: Position,
    pub attempts: u32,
    #[source]
    pub source: ClientError,
}

pub type TileOutcome = Result<TileResult, TileFailure>;

fn compute_with_retry(
    service: &dyn TileService,
    region: &Region,
    retry: RetryPolicy,
    shutdown: &Shutdown,
) -> TileOutcome {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match service.compute(region) {
            Ok(iterations) => return Ok(TileResult::new(region.clone(), iterations)),
            Err(err) if attempt <= retry.max_retries && !shutdown.is_triggered() => {
                warn!(
                    x = region.offset().x,
                    y = region.offset().y,
                    attempt,
                    error = %err,
                    "part failed, retrying"
                );
                thread::sleep(retry.delay(attempt));
            }
            Err(err) => {
                error!(
                    x = region.offset().x,
                    y = region.offset().y,
                    attempt,
                    error = %err,
                    "part failed"
                );
                return Err(TileFailure {
                    offset: region.offset(),
                    attempts: attempt,
                    source: err,
                });
            }
        }
    }
}

/// Issues one compute request per region with at most `concurrency` in
/// flight. Each outcome is sent to `results` as soon as it is known, in
/// completion order.
pub struct Dispatcher {
    pool: WorkerPool<Region>,
}

impl Dispatcher {
    pub fn start(
        service: Arc<dyn TileService>,
        concurrency: usize,
        retry: RetryPolicy,
        results: Sender<TileOutcome>,
    ) -> Result<Self, ValidationError> {
        if concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        let shutdown = Shutdown::new();
        let pool = WorkerPool::with_shutdown(concurrency, shutdown.clone(), || {
            let service = service.clone();
            let results = results.clone();
            let shutdown = shutdown.clone();
            move |region: Region| {
                let outcome = compute_with_retry(service.as_ref(), &region, retry, &shutdown);
                // The receiver is gone once the run has finished or failed
                let _ = results.send(outcome);
            }
        });
        Ok(Self { pool })
    }

    /// Queues every region and closes the queue.
    pub fn dispatch(&mut self, regions: &[Region]) {
        for region in regions {
            debug!(
                x = region.offset().x,
                y = region.offset().y,
                width = region.size().width,
                height = region.size().height,
                "enqueuing request"
            );
            if self.pool.submit(region.clone()).is_err() {
                break;
            }
        }
        self.pool.close();
    }

    /// Stops issuing requests. Requests already in flight are abandoned.
    pub fn abandon(&self) {
        self.pool.shutdown();
    }

    /// Waits for the workers to exit after every queued region was handled.
    pub fn join(self) {
        self.pool.join();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::complex::c;
    use crate::coord::Dimension;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::mpsc;

    /// Fails the first `failures` calls, then returns the pixel count of the
    /// region as every pixel's value.
    struct FlakyService {
        failures: u32,
        calls: AtomicU32,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FlakyService {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl TileService for FlakyService {
        fn compute(&self, region: &Region) -> Result<Vec<u32>, ClientError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            self.active.fetch_sub(1, Ordering::SeqCst);

            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(ClientError::Status {
                    url: "http://test/".to_string(),
                    status: 503,
                });
            }
            let area = region.size().area();
            Ok(vec![area as u32; area])
        }
    }

    fn regions() -> Vec<Region> {
        Region::create(Dimension::new(40, 30), c(-2.0, -1.0), c(1.0, 1.0), 64)
            .unwrap()
            .split(10)
            .unwrap()
    }

    fn run(service: Arc<FlakyService>, concurrency: usize, retry: RetryPolicy) -> Vec<TileOutcome> {
        let (tx, rx) = mpsc::channel();
        let mut dispatcher = Dispatcher::start(service, concurrency, retry, tx).unwrap();
        dispatcher.dispatch(&regions());
        dispatcher.join();
        rx.iter().collect()
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let (tx, _rx) = mpsc::channel();
        let service = Arc::new(FlakyService::new(0));
        assert!(matches!(
            Dispatcher::start(service, 0, RetryPolicy::fail_fast(), tx),
            Err(ValidationError::ZeroConcurrency)
        ));
    }

    #[test]
    fn test_one_outcome_per_region() {
        let service = Arc::new(FlakyService::new(0));
        let outcomes = run(service.clone(), 4, RetryPolicy::fail_fast());
        assert_eq!(outcomes.len(), 12);

        let mut offsets: Vec<Position> = outcomes
            .iter()
            .map(|o| o.as_ref().unwrap().region.offset())
            .collect();
        offsets.sort();
        let expected: Vec<Position> = regions().iter().map(|r| r.offset()).collect();
        assert_eq!(offsets, expected);
        assert_eq!(service.calls.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn test_concurrency_cap_is_respected() {
        let service = Arc::new(FlakyService::new(0));
        run(service.clone(), 3, RetryPolicy::fail_fast());
        let peak = service.peak.load(Ordering::SeqCst);
        assert!((1..=3).contains(&peak), "peak in-flight was {}", peak);
    }

    #[test]
    fn test_fail_fast_reports_failure() {
        let service = Arc::new(FlakyService::new(1));
        let outcomes = run(service, 1, RetryPolicy::fail_fast());
        let failure = outcomes[0].as_ref().unwrap_err();
        assert_eq!(failure.attempts, 1);
        assert!(matches!(
            failure.source,
            ClientError::Status { status: 503, .. }
        ));
        assert_eq!(outcomes.iter().filter(|o| o.is_err()).count(), 1);
    }

    #[test]
    fn test_retry_recovers() {
        let service = Arc::new(FlakyService::new(2));
        let outcomes = run(service.clone(), 1, RetryPolicy::new(2, Duration::from_millis(1)));
        assert!(outcomes.iter().all(|o| o.is_ok()));
        assert_eq!(service.calls.load(Ordering::SeqCst), 14);
    }

    #[test]
    fn test_retry_delay_grows_linearly() {
        let retry = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(retry.delay(1), Duration::from_millis(100));
        assert_eq!(retry.delay(3), Duration::from_millis(300));
    }
}
