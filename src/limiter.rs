//! Adaptive rate limiting for quota-constrained APIs.
//!
//! Two independent pacing mechanisms compose:
//!
//! 1. A preemptive token bucket (`governor`) bounds the worst-case request
//!    rate even with zero information from the server.
//! 2. A corrective layer tracks the `X-RateLimit-Remaining` /
//!    `X-RateLimit-Reset` headers of the last response seen and, once the
//!    reported allowance is exhausted, blocks until the window resets.
//!
//! Header-reported quota can lag real usage, so the token bucket is the floor
//! guarantee regardless of header data. APIs that never send the headers (the
//! npm registry) are paced by the bucket alone.

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header::HeaderMap;
use std::num::NonZeroU32;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Length of the quota window assumed before the server reports one.
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Time source abstraction so tests can simulate reset windows without real
/// sleeping.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time, sleeping on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Server-reported quota state, overwritten by every monitored response.
#[derive(Debug, Clone, Copy)]
struct QuotaState {
    remaining: i64,
    reset_at: SystemTime,
}

/// Shared pacer for all outbound calls to quota-constrained APIs.
///
/// Construct once and pass as `Arc<ApiLimiter>` to every call site that needs
/// gating. State lives for the process duration; nothing is persisted.
pub struct ApiLimiter<C: Clock = SystemClock> {
    bucket: DirectLimiter,
    state: Mutex<QuotaState>,
    clock: C,
}

impl ApiLimiter<SystemClock> {
    /// Create a limiter pacing at `requests_per_minute` with burst 1.
    pub fn new(requests_per_minute: u32) -> Self {
        Self::with_clock(requests_per_minute, SystemClock)
    }
}

impl<C: Clock> ApiLimiter<C> {
    /// Create a limiter with an explicit clock (injected in tests).
    pub fn with_clock(requests_per_minute: u32, clock: C) -> Self {
        let rate = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(rate).allow_burst(NonZeroU32::MIN);

        // Seed optimistically: a full allowance and a window starting now, so
        // no artificial wait happens before the first response is observed.
        let state = QuotaState {
            remaining: rate.get() as i64,
            reset_at: clock.now() + DEFAULT_WINDOW,
        };

        Self {
            bucket: RateLimiter::direct(quota),
            state: Mutex::new(state),
            clock,
        }
    }

    /// Admission gate. Call before every gated request.
    ///
    /// Order per call: token-bucket wait, then reactive quota check. The
    /// reactive check consults the state recorded from the previous response,
    /// and blocks for the full time-until-reset once the reported allowance
    /// is exhausted.
    pub async fn admit(&self) {
        self.bucket.until_ready().await;

        let wait = {
            let state = self.state.lock().unwrap();
            if state.remaining <= 0 {
                // duration_since fails when the reset is already behind us,
                // in which case there is nothing to wait for.
                state.reset_at.duration_since(self.clock.now()).ok()
            } else {
                None
            }
        };

        if let Some(wait) = wait {
            if !wait.is_zero() {
                warn!(
                    "rate limit reached, waiting {:.0?} before next request",
                    wait
                );
                self.clock.sleep(wait).await;
            }
        }
    }

    /// Overwrite local quota state from a response's rate-limit headers.
    ///
    /// Missing or malformed headers leave the corresponding field untouched.
    pub fn record_headers(&self, headers: &HeaderMap) {
        let remaining = headers
            .get(REMAINING_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok());

        let reset_at = headers
            .get(RESET_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));

        if remaining.is_none() && reset_at.is_none() {
            return;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = remaining {
            state.remaining = remaining;
        }
        if let Some(reset_at) = reset_at {
            state.reset_at = reset_at;
        }
        debug!(
            "quota update: {} remaining, reset at {:?}",
            state.remaining, state.reset_at
        );
    }

    /// Directly overwrite quota state. Exposed for callers that learn about
    /// quota out of band; the usual path is `record_headers`.
    pub fn record(&self, remaining: i64, reset_at: SystemTime) {
        let mut state = self.state.lock().unwrap();
        state.remaining = remaining;
        state.reset_at = reset_at;
    }
}
