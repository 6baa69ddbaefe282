// ── Retry backoff policy ──
//
// Pure delay computation for bootstrap retries. Stateless after
// construction: the attempt number is always passed in.

use std::time::Duration;

use rand::Rng;

use crate::error::CoreError;

/// Exponential backoff with multiplicative jitter and an attempt cap.
///
/// Attempts are 1-based. The first attempt never waits; attempt `n >= 2`
/// waits `initial_delay * multiplier^(n-2)`, capped at `max_delay`, then
/// scaled by `1 + U(-jitter_factor, +jitter_factor)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter_factor: f64,
    max_attempts: u32,
}

impl BackoffPolicy {
    /// Build a policy, rejecting out-of-domain parameters immediately.
    pub fn new(
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
        jitter_factor: f64,
        max_attempts: u32,
    ) -> Result<Self, CoreError> {
        if initial_delay.is_zero() {
            return Err(invalid("initial_delay", "must be greater than zero"));
        }
        if max_delay.is_zero() {
            return Err(invalid("max_delay", "must be greater than zero"));
        }
        if initial_delay > max_delay {
            return Err(invalid(
                "initial_delay",
                format!("{initial_delay:?} exceeds max_delay {max_delay:?}"),
            ));
        }
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(invalid("multiplier", format!("must be > 0, got {multiplier}")));
        }
        if !(0.0..=1.0).contains(&jitter_factor) {
            return Err(invalid(
                "jitter_factor",
                format!("must be within [0, 1], got {jitter_factor}"),
            ));
        }
        if max_attempts == 0 {
            return Err(invalid("max_attempts", "must be at least 1"));
        }

        Ok(Self {
            initial_delay,
            max_delay,
            multiplier,
            jitter_factor,
            max_attempts,
        })
    }

    // ── Presets ──────────────────────────────────────────────────────

    /// Background reconnection: slow growth, many attempts, wide jitter.
    pub fn conservative() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(120),
            multiplier: 1.5,
            jitter_factor: 0.5,
            max_attempts: 10,
        }
    }

    /// Interactive "retry now": fast growth, few attempts, tight jitter.
    pub fn aggressive() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 3.0,
            jitter_factor: 0.1,
            max_attempts: 3,
        }
    }

    /// Test harnesses: sub-second and deterministic (no jitter).
    pub fn fast() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            multiplier: 2.0,
            jitter_factor: 0.0,
            max_attempts: 3,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn jitter_factor(&self) -> f64 {
        self.jitter_factor
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Same policy with a different attempt cap.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Result<Self, CoreError> {
        if max_attempts == 0 {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        self.max_attempts = max_attempts;
        Ok(self)
    }

    // ── Computation ──────────────────────────────────────────────────

    /// Whether `next_attempt` (1-based) is still within the cap.
    pub fn should_retry(&self, next_attempt: u32) -> bool {
        next_attempt <= self.max_attempts
    }

    /// Delay to wait before `attempt` (1-based) starts.
    pub fn delay(&self, attempt: u32) -> Duration {
        let sample = if self.jitter_factor > 0.0 {
            rand::rng().random_range(-self.jitter_factor..=self.jitter_factor)
        } else {
            0.0
        };
        self.delay_with_jitter(attempt, sample)
    }

    /// Un-jittered delay for `attempt`: the expected value of [`delay`](Self::delay).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        // Exponent is capped; 64 growth steps saturate any sane max_delay.
        let exponent = i32::try_from(attempt - 2).unwrap_or(i32::MAX).min(64);
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = base.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Apply a jitter sample in `[-jitter_factor, +jitter_factor]`.
    ///
    /// The result never drops below `initial_delay`, so a retry never fires
    /// sooner than the configured minimum.
    fn delay_with_jitter(&self, attempt: u32, sample: f64) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let sample = sample.clamp(-self.jitter_factor, self.jitter_factor);
        let jittered = self.base_delay(attempt).as_secs_f64() * (1.0 + sample);
        let floor = self.initial_delay.as_secs_f64();
        Duration::from_secs_f64(jittered.max(floor))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::conservative()
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidBackoff {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn policy(jitter: f64) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(100),
            Duration::from_secs(2),
            2.0,
            jitter,
            5,
        )
        .unwrap()
    }

    #[test]
    fn first_attempt_never_waits() {
        for p in [
            BackoffPolicy::conservative(),
            BackoffPolicy::aggressive(),
            BackoffPolicy::fast(),
        ] {
            assert_eq!(p.delay(0), Duration::ZERO);
            assert_eq!(p.delay(1), Duration::ZERO);
        }
    }

    #[test]
    fn delay_grows_then_caps() {
        let p = policy(0.0);
        assert_eq!(p.delay(2), Duration::from_millis(100));
        assert_eq!(p.delay(3), Duration::from_millis(200));
        assert_eq!(p.delay(4), Duration::from_millis(400));
        assert_eq!(p.delay(10), Duration::from_secs(2));
        assert_eq!(p.delay(u32::MAX), Duration::from_secs(2));
    }

    #[test]
    fn jittered_delay_stays_within_bounds() {
        let p = BackoffPolicy::conservative();
        let upper = p.max_delay().as_secs_f64() * (1.0 + p.jitter_factor());
        for attempt in 2..40 {
            for _ in 0..20 {
                let d = p.delay(attempt);
                assert!(d >= p.initial_delay(), "attempt {attempt}: {d:?} below floor");
                assert!(d.as_secs_f64() <= upper + 1e-9, "attempt {attempt}: {d:?} above cap");
            }
        }
    }

    #[test]
    fn jitter_extremes_are_applied_multiplicatively() {
        let p = policy(0.5);
        assert_eq!(p.delay_with_jitter(4, 0.5), Duration::from_millis(600));
        assert_eq!(p.delay_with_jitter(4, -0.5), Duration::from_millis(200));
        // Downward jitter on the first retry is floored at initial_delay.
        assert_eq!(p.delay_with_jitter(2, -0.5), Duration::from_millis(100));
        // Out-of-range samples are clamped to the factor.
        assert_eq!(p.delay_with_jitter(4, 9.0), Duration::from_millis(600));
    }

    #[test]
    fn expected_delay_is_non_decreasing() {
        let p = BackoffPolicy::conservative();
        let mut previous = Duration::ZERO;
        for attempt in 1..30 {
            let d = p.base_delay(attempt);
            assert!(d >= previous, "attempt {attempt}: {d:?} < {previous:?}");
            previous = d;
        }
    }

    #[test]
    fn should_retry_is_inclusive_cap() {
        let p = policy(0.0);
        assert!(p.should_retry(1));
        assert!(p.should_retry(5));
        assert!(!p.should_retry(6));
    }

    #[test]
    fn construction_rejects_out_of_domain_parameters() {
        let ms = Duration::from_millis;
        let cases = [
            BackoffPolicy::new(ms(0), ms(10), 2.0, 0.1, 3),
            BackoffPolicy::new(ms(10), ms(0), 2.0, 0.1, 3),
            BackoffPolicy::new(ms(20), ms(10), 2.0, 0.1, 3),
            BackoffPolicy::new(ms(10), ms(20), 0.0, 0.1, 3),
            BackoffPolicy::new(ms(10), ms(20), -1.0, 0.1, 3),
            BackoffPolicy::new(ms(10), ms(20), f64::NAN, 0.1, 3),
            BackoffPolicy::new(ms(10), ms(20), 2.0, -0.1, 3),
            BackoffPolicy::new(ms(10), ms(20), 2.0, 1.5, 3),
            BackoffPolicy::new(ms(10), ms(20), 2.0, 0.1, 0),
        ];
        for (i, case) in cases.into_iter().enumerate() {
            assert!(
                matches!(case, Err(CoreError::InvalidBackoff { .. })),
                "case {i} should fail: {case:?}"
            );
        }
    }

    #[test]
    fn presets_pass_validation() {
        for p in [
            BackoffPolicy::conservative(),
            BackoffPolicy::aggressive(),
            BackoffPolicy::fast(),
        ] {
            let rebuilt = BackoffPolicy::new(
                p.initial_delay(),
                p.max_delay(),
                p.multiplier(),
                p.jitter_factor(),
                p.max_attempts(),
            )
            .unwrap();
            assert_eq!(rebuilt, p);
        }
        assert!(BackoffPolicy::fast().max_delay() < Duration::from_secs(1));
        assert!(BackoffPolicy::conservative().max_attempts() > BackoffPolicy::aggressive().max_attempts());
    }
}
