//! Connection retry policy for stream transports.

use std::{future::Future, io, num::NonZeroU32, time::Duration};

use log::warn;
use tokio::{
    select,
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

use super::ConnectError;

/// Timing and attempt limits for establishing a connection.
///
/// The defaults keep retrying every 500 ms forever with a 2 s bound on each
/// attempt, so startup blocks until the peer is reachable. A multiplier above
/// one grows the delay towards `max_delay`; `max_attempts` caps the loop.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use sensorlink::transport::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.connect_timeout, Duration::from_secs(2));
/// assert_eq!(policy.initial_delay, Duration::from_millis(500));
/// assert!(policy.max_attempts.is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on a single connection attempt.
    pub connect_timeout: Duration,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Ceiling on the delay between attempts.
    pub max_delay: Duration,
    /// Growth factor applied to the delay after each failure.
    pub multiplier: u32,
    /// Stop after this many attempts; `None` retries until cancelled.
    pub max_attempts: Option<NonZeroU32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(500),
            multiplier: 1,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Clamp durations to at least one millisecond, order the delays and
    /// raise the multiplier to one.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use sensorlink::transport::RetryPolicy;
    ///
    /// let policy = RetryPolicy {
    ///     initial_delay: Duration::from_millis(5),
    ///     max_delay: Duration::from_millis(1),
    ///     multiplier: 0,
    ///     ..RetryPolicy::default()
    /// }
    /// .normalized();
    /// assert_eq!(policy.initial_delay, Duration::from_millis(1));
    /// assert_eq!(policy.max_delay, Duration::from_millis(5));
    /// assert_eq!(policy.multiplier, 1);
    /// ```
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let floor = Duration::from_millis(1);
        self.connect_timeout = self.connect_timeout.max(floor);
        self.initial_delay = self.initial_delay.max(floor);
        self.max_delay = self.max_delay.max(floor);
        if self.initial_delay > self.max_delay {
            std::mem::swap(&mut self.initial_delay, &mut self.max_delay);
        }
        self.multiplier = self.multiplier.max(1);
        self
    }

    /// Delay to use after `current` once another attempt has failed.
    #[must_use]
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(self.multiplier).min(self.max_delay)
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max.get())
    }
}

/// Run `connect` until it succeeds, the policy gives up, or `shutdown` is
/// cancelled.
///
/// Each attempt is bounded by `connect_timeout`; a timed-out attempt counts as
/// a failure with [`io::ErrorKind::TimedOut`].
///
/// # Errors
///
/// Returns [`ConnectError::Cancelled`] when `shutdown` fires and
/// [`ConnectError::AttemptsExhausted`] once `max_attempts` attempts failed.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
pub async fn connect_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    shutdown: &CancellationToken,
    mut connect: F,
) -> Result<T, ConnectError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    let policy = policy.normalized();
    let mut delay = policy.initial_delay;
    let mut attempts: u32 = 0;
    loop {
        attempts = attempts.saturating_add(1);
        let outcome = select! {
            biased;

            () = shutdown.cancelled() => return Err(ConnectError::Cancelled),
            res = timeout(policy.connect_timeout, connect()) => res,
        };
        let err = match outcome {
            Ok(Ok(connection)) => return Ok(connection),
            Ok(Err(err)) => err,
            Err(_) => io::Error::new(io::ErrorKind::TimedOut, "connection attempt timed out"),
        };
        if policy.exhausted(attempts) {
            return Err(ConnectError::AttemptsExhausted {
                attempts,
                last: err,
            });
        }
        warn!("connection attempt {attempts} failed: {err}; retrying in {delay:?}");
        select! {
            biased;

            () = shutdown.cancelled() => return Err(ConnectError::Cancelled),
            () = sleep(delay) => {}
        }
        delay = policy.next_delay(delay);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU32, Ordering},
        },
        time::Duration,
    };

    use rstest::rstest;
    use tokio::time::Instant;

    use super::*;

    fn refused() -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
    }

    #[rstest]
    #[case(Duration::from_millis(500), 1, Duration::from_millis(500))]
    #[case(Duration::from_millis(100), 2, Duration::from_millis(200))]
    #[case(Duration::from_millis(400), 2, Duration::from_millis(500))]
    fn next_delay_is_capped(
        #[case] current: Duration,
        #[case] multiplier: u32,
        #[case] expected: Duration,
    ) {
        let policy = RetryPolicy {
            initial_delay: Duration::from_millis(100),
            multiplier,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.next_delay(current), expected);
    }

    #[test]
    fn normalization_raises_zero_durations() {
        let policy = RetryPolicy {
            connect_timeout: Duration::ZERO,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 0,
            max_attempts: None,
        }
        .normalized();
        assert_eq!(policy.connect_timeout, Duration::from_millis(1));
        assert_eq!(policy.initial_delay, Duration::from_millis(1));
        assert_eq!(policy.max_delay, Duration::from_millis(1));
        assert_eq!(policy.multiplier, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: NonZeroU32::new(3),
            ..RetryPolicy::default()
        };
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let started = Instant::now();

        let err = connect_with_retry(&policy, &CancellationToken::new(), || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { refused() }
        })
        .await
        .expect_err("attempts exhausted");

        let ConnectError::AttemptsExhausted { attempts, last } = err else {
            panic!("expected AttemptsExhausted, got {err:?}");
        };
        assert_eq!(attempts, 3);
        assert_eq!(last.kind(), io::ErrorKind::ConnectionRefused);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(1), "two fixed delays");
    }

    #[tokio::test(start_paused = true)]
    async fn hung_attempts_time_out() {
        let policy = RetryPolicy {
            max_attempts: NonZeroU32::new(1),
            ..RetryPolicy::default()
        };

        let err = connect_with_retry(&policy, &CancellationToken::new(), || {
            std::future::pending::<io::Result<()>>()
        })
        .await
        .expect_err("timed out");

        assert!(matches!(
            err,
            ConnectError::AttemptsExhausted { attempts: 1, ref last }
                if last.kind() == io::ErrorKind::TimedOut
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_once_peer_appears() {
        let calls = AtomicU32::new(0);

        let value = connect_with_retry(&RetryPolicy::default(), &CancellationToken::new(), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 4 {
                    refused().map(|()| 0)
                } else {
                    Ok(attempt)
                }
            }
        })
        .await
        .expect("connected");

        assert_eq!(value, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_unbounded_retry() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let err = connect_with_retry(&RetryPolicy::default(), &token, || async { refused() })
            .await
            .expect_err("cancelled");
        assert!(matches!(err, ConnectError::Cancelled));
    }
}
