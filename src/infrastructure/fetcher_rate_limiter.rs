use std::{sync::Arc, time::Duration};

use log::debug;
use tokio::{
    sync::Mutex,
    time::{Instant, sleep_until},
};

use crate::{CrawlerResult, PageFetcher, RawPage};

/// A request throttle letting at most one request through per interval, without burst.
///
/// Meant to be shared (behind an `Arc`) by every fetcher of the process.
#[derive(Debug)]
pub struct RequestThrottle {
    /// The minimum delay between two requests.
    interval: Duration,

    /// The earliest instant the next request may start at.
    next_slot: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    /// Creates a new `RequestThrottle` instance with the given minimum interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Creates a throttle that never waits.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Waits until a request may start, and books the following slot.
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            *next_slot = Some(slot + self.interval);

            slot
        };
        if slot > Instant::now() {
            debug!("Throttling request for {:?}", slot - Instant::now());
        }
        sleep_until(slot).await;
    }
}

/// This struct is responsible for enforcing the request rate on fetcher requests.
pub struct FetcherRateLimiter {
    /// The fetcher to be rate limited.
    fetcher: Arc<dyn PageFetcher>,

    /// The throttle shared with the other fetchers.
    throttle: Arc<RequestThrottle>,
}

impl FetcherRateLimiter {
    /// Creates a new `FetcherRateLimiter` instance with the given fetcher and throttle.
    pub fn new(fetcher: Arc<dyn PageFetcher>, throttle: Arc<RequestThrottle>) -> Self {
        Self { fetcher, throttle }
    }
}

#[async_trait::async_trait]
impl PageFetcher for FetcherRateLimiter {
    /// Waits for the throttle before delegating to the fetcher.
    async fn fetch(&self, url: &str) -> CrawlerResult<RawPage> {
        self.throttle.acquire().await;

        self.fetcher.fetch(url).await
    }
}
