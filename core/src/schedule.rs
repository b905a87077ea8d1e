//! Debounced recompute scheduling.
//!
//! Rapid keystrokes on the search and threshold inputs coalesce into a
//! single recomputation: each input event schedules a token with a
//! deadline, and a newer event invalidates the prior token before it
//! fires. Superseded tokens are discarded, never executed.
//!
//! Time is injected by the caller — the event loop (and tests) drive
//! firing explicitly, the scheduler never reads a wall clock.

use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_DEBOUNCE_MS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token(u64);

#[derive(Debug)]
pub struct DebounceScheduler {
    delay: Duration,
    next_token: u64,
    pending: Option<(Token, DateTime<Utc>)>,
}

impl DebounceScheduler {
    pub fn new() -> Self {
        Self::with_delay_ms(DEFAULT_DEBOUNCE_MS)
    }

    pub fn with_delay_ms(ms: i64) -> Self {
        Self {
            delay: Duration::milliseconds(ms),
            next_token: 0,
            pending: None,
        }
    }

    /// Schedule a recomputation at `now + delay`, invalidating any
    /// token still pending.
    pub fn schedule(&mut self, now: DateTime<Utc>) -> Token {
        self.next_token += 1;
        let token = Token(self.next_token);
        self.pending = Some((token, now + self.delay));
        token
    }

    /// Whether `token` is still the one that will fire.
    pub fn is_current(&self, token: Token) -> bool {
        matches!(self.pending, Some((t, _)) if t == token)
    }

    /// The pending token whose deadline has passed, if any; firing
    /// consumes it.
    pub fn due(&mut self, now: DateTime<Utc>) -> Option<Token> {
        match self.pending {
            Some((token, deadline)) if now >= deadline => {
                self.pending = None;
                Some(token)
            }
            _ => None,
        }
    }
}

impl Default for DebounceScheduler {
    fn default() -> Self {
        Self::new()
    }
}
