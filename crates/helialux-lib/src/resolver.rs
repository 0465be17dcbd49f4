//! Cached, concurrency-guarded light state.
//!
//! The home-automation controller asks for every characteristic separately
//! and often. [`StateResolver`] answers from a cache while it is younger than
//! the freshness window and lets at most one device query be outstanding at
//! a time; callers arriving during a refresh get the cached value instead of
//! queueing behind it.
//!
//! Failures never poison the cache: a failed query or unreadable payload
//! marks it stale (so the next call re-queries) and darkens the cached
//! channels so nobody is told "on" with confidence after a failure.
//!
//! A write committed while a query is outstanding wins over that query's
//! result: the reading predates the write, so it is discarded and the cache
//! stays stale.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::device::SmartControl;
use crate::error::Result;
use crate::state::{Channels, LightState};
use crate::status;

/// Cache contents. Only ever changed under the mutex.
#[derive(Debug, Default)]
struct Cache {
    channels: Channels,
    /// `None` means stale.
    last_refreshed: Option<Instant>,
    /// Bumped by every committed write.
    write_generation: u64,
}

impl Cache {
    fn is_fresh(&self, window: Duration) -> bool {
        self.last_refreshed.is_some_and(|t| t.elapsed() < window)
    }
}

/// Releases the in-flight flag when dropped, on every exit path.
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard(flag))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owner of the cached light state.
#[derive(Debug)]
pub struct StateResolver {
    cache: Mutex<Cache>,
    refresh_in_flight: AtomicBool,
    freshness_window: Duration,
}

impl Default for StateResolver {
    fn default() -> Self {
        Self::new(crate::protocol::DEFAULT_FRESHNESS_WINDOW)
    }
}

impl StateResolver {
    /// All channels dark, immediately stale.
    pub fn new(freshness_window: Duration) -> Self {
        StateResolver {
            cache: Mutex::new(Cache::default()),
            refresh_in_flight: AtomicBool::new(false),
            freshness_window,
        }
    }

    pub fn freshness_window(&self) -> Duration {
        self.freshness_window
    }

    fn lock(&self) -> MutexGuard<'_, Cache> {
        // Every update writes all fields before releasing the lock, so a
        // poisoned lock still holds a consistent Cache.
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached state without any I/O.
    pub fn snapshot(&self) -> LightState {
        LightState::new(self.lock().channels)
    }

    /// Whether the cache is younger than the freshness window.
    pub fn is_fresh(&self) -> bool {
        self.lock().is_fresh(self.freshness_window)
    }

    /// Whether a device query is currently outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.refresh_in_flight.load(Ordering::Acquire)
    }

    /// Force the next [`resolve`](Self::resolve) to query the device.
    pub fn invalidate(&self) {
        self.lock().last_refreshed = None;
    }

    /// Return the light state, querying the device only when the cache is
    /// stale and no other query is in flight.
    pub fn resolve(&self, device: &impl SmartControl) -> Result<LightState> {
        if self.is_fresh() {
            log::debug!("cache hit");
            return Ok(self.snapshot());
        }

        let Some(guard) = RefreshGuard::acquire(&self.refresh_in_flight) else {
            log::debug!("refresh already in flight, serving cached state");
            return Ok(self.snapshot());
        };
        self.refresh(device, guard)
    }

    /// Query and normalize while holding the in-flight guard.
    fn refresh(&self, device: &impl SmartControl, _guard: RefreshGuard<'_>) -> Result<LightState> {
        // Another caller may have refreshed between our staleness check and
        // taking the guard.
        let generation = {
            let cache = self.lock();
            if cache.is_fresh(self.freshness_window) {
                log::debug!("cache refreshed meanwhile, skipping query");
                return Ok(LightState::new(cache.channels));
            }
            cache.write_generation
        };

        log::debug!("cache stale, querying {}", device.endpoint());
        let outcome = device
            .query_state()
            .map_err(crate::HelialuxError::from)
            .and_then(|body| status::normalize(&body).map_err(crate::HelialuxError::from));

        let mut cache = self.lock();
        if cache.write_generation != generation {
            log::debug!(
                "write committed during refresh, keeping {} and staying stale",
                cache.channels
            );
            return match outcome {
                Ok(_) => Ok(LightState::new(cache.channels)),
                Err(e) => {
                    log::warn!("status query failed: {e}");
                    Err(e)
                }
            };
        }
        match outcome {
            Ok(channels) => {
                cache.channels = channels;
                cache.last_refreshed = Some(Instant::now());
                log::debug!("refreshed: {channels}");
                Ok(LightState::new(channels))
            }
            Err(e) => {
                cache.channels = Channels::OFF;
                cache.last_refreshed = None;
                log::warn!("status query failed: {e}");
                Err(e)
            }
        }
    }

    /// Record a write the device accepted.
    ///
    /// The channels are replaced optimistically but the cache is left stale:
    /// the status endpoint may briefly report the previous values, so the
    /// next read re-confirms.
    pub(crate) fn commit_write(&self, channels: Channels) {
        let mut cache = self.lock();
        cache.channels = channels;
        cache.last_refreshed = None;
        cache.write_generation = cache.write_generation.wrapping_add(1);
    }
}
