use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Mutex;
use std::time::Instant;

/// Global token-bucket limiter shared across all routes.
///
/// Not keyed by caller; one bucket bounds the whole process.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    rate_per_sec: f32,
    burst_size: f32,
}

#[derive(Debug)]
struct Bucket {
    refilled_at: Instant,
    tokens: f32,
}

impl RateLimiter {
    #[must_use]
    pub fn new(rate_per_sec: f32, burst_size: f32) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                refilled_at: Instant::now(),
                tokens: burst_size,
            }),
            rate_per_sec,
            burst_size,
        }
    }

    /// Take one token, refilling for elapsed time first.
    pub fn check(&self) -> bool {
        let mut bucket = self.bucket.lock().unwrap();
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.refilled_at).as_secs_f32();

        bucket.tokens = (bucket.tokens + elapsed * self.rate_per_sec).min(self.burst_size);
        bucket.refilled_at = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Middleware enforcing the global rate limit when enabled.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.config.resilience.rate_limit_enabled && !state.rate_limiter.check() {
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limiter_burst_then_refill() {
        let limiter = RateLimiter::new(2.0, 3.0); // 2 req/s, 3 burst

        assert!(limiter.check());
        assert!(limiter.check());
        assert!(limiter.check());

        // Burst exhausted.
        assert!(!limiter.check());

        // Wait 0.6s -> +1.2 tokens, enough for exactly one more.
        std::thread::sleep(Duration::from_millis(600));
        assert!(limiter.check());
        assert!(!limiter.check());
    }
}
