use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Sliding-window limit on conversation turns.
///
/// Turn timestamps are tracked per session id; a turn is admitted while fewer
/// than `limit` turns fall inside the trailing `window`.
pub struct RateLimiter {
    turns: HashMap<String, VecDeque<Instant>>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        RateLimiter {
            turns: HashMap::new(),
            limit,
            window,
        }
    }

    /// `limit` turns per minute.
    pub fn per_minute(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Record a turn for `session_id` if it is within the limit.
    ///
    /// Returns `false` (and records nothing) when the window is full. Sessions
    /// with no turn left inside the window are dropped.
    pub fn check(&mut self, session_id: &str) -> bool {
        let now = Instant::now();
        let window = self.window;
        self.turns.retain(|_, turns| {
            evict_expired(turns, now, window);
            !turns.is_empty()
        });

        let session_turns = self.turns.entry(session_id.to_string()).or_default();
        if session_turns.len() < self.limit {
            session_turns.push_back(now);
            true
        } else {
            if session_turns.is_empty() {
                self.turns.remove(session_id);
            }
            false
        }
    }
}

/// Timestamps arrive in order, so expired ones sit at the front.
fn evict_expired(turns: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = turns.front() {
        if now.duration_since(*oldest) >= window {
            turns.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_allows_turns_within_limit() {
        let mut limiter = RateLimiter::per_minute(5);
        for _ in 0..5 {
            assert!(limiter.check("session-1"));
        }
        assert!(!limiter.check("session-1"));
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut limiter = RateLimiter::per_minute(1);
        assert!(limiter.check("a"));
        assert!(limiter.check("b"));
        assert!(!limiter.check("a"));
    }

    #[test]
    fn test_window_slides() {
        let mut limiter = RateLimiter::new(2, Duration::from_millis(50));
        assert!(limiter.check("session-2"));
        assert!(limiter.check("session-2"));
        assert!(!limiter.check("session-2"));

        thread::sleep(Duration::from_millis(60));

        assert!(limiter.check("session-2"));
    }

    #[test]
    fn test_idle_sessions_are_dropped() {
        let mut limiter = RateLimiter::new(1, Duration::from_millis(50));
        assert!(limiter.check("idle-1"));
        assert!(limiter.check("idle-2"));
        assert_eq!(limiter.turns.len(), 2);

        thread::sleep(Duration::from_millis(60));

        assert!(limiter.check("active"));
        assert_eq!(limiter.turns.len(), 1);
        assert!(limiter.turns.contains_key("active"));
    }

    #[test]
    fn test_zero_limit_tracks_nothing() {
        let mut limiter = RateLimiter::per_minute(0);
        assert!(!limiter.check("a"));
        assert!(limiter.turns.is_empty());
    }
}
