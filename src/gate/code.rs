//! Short-lived numeric codes bound to a shared secret and a time step.
//!
//! Codes are TOTP values (HMAC-SHA1, six digits) over the step counter
//! `floor(unix_seconds / step_seconds)`. Instants before the epoch count as
//! step 0.

use std::fmt;

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use totp_rs::{Algorithm, TOTP};

pub const CODE_DIGITS: usize = 6;

pub const DEFAULT_STEP_SECONDS: u64 = 300;
pub const DEFAULT_TOLERANCE_STEPS: u32 = 2;
/// Upper bound on the tolerance window; each step costs one HMAC per check.
pub const MAX_TOLERANCE_STEPS: u32 = 60;

/// The code-generation secret. Never printed.
#[derive(Clone)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.clone()
    }
}

impl From<&str> for SharedSecret {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePolicy {
    step_seconds: u64,
    tolerance_steps: u32,
}

impl CodePolicy {
    /// `None` for a zero-length step or a tolerance above
    /// [`MAX_TOLERANCE_STEPS`].
    pub fn new(step_seconds: u64, tolerance_steps: u32) -> Option<Self> {
        (step_seconds > 0 && tolerance_steps <= MAX_TOLERANCE_STEPS).then_some(Self {
            step_seconds,
            tolerance_steps,
        })
    }

    pub fn step_seconds(&self) -> u64 {
        self.step_seconds
    }

    pub fn tolerance_steps(&self) -> u32 {
        self.tolerance_steps
    }

    /// Step counter containing `now`; pre-epoch instants are step 0.
    pub fn bucket(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from(now.timestamp()).map_or(0, |secs| secs / self.step_seconds)
    }
}

impl Default for CodePolicy {
    fn default() -> Self {
        Self {
            step_seconds: DEFAULT_STEP_SECONDS,
            tolerance_steps: DEFAULT_TOLERANCE_STEPS,
        }
    }
}

/// Generates and checks codes for one secret and policy. Pure; safe to share
/// across threads.
#[derive(Clone)]
pub struct CodeEngine {
    totp: TOTP,
    policy: CodePolicy,
}

impl fmt::Debug for CodeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeEngine")
            .field("secret", &"<redacted>")
            .field("policy", &self.policy)
            .finish()
    }
}

impl CodeEngine {
    pub fn new(secret: SharedSecret, policy: CodePolicy) -> Self {
        // skew 0: the tolerance window is walked in `validate`
        let totp = TOTP::new_unchecked(
            Algorithm::SHA1,
            CODE_DIGITS,
            0,
            policy.step_seconds,
            secret.to_bytes(),
        );
        Self { totp, policy }
    }

    pub fn policy(&self) -> CodePolicy {
        self.policy
    }

    fn code_for_bucket(&self, bucket: u64) -> String {
        // bucket * step never exceeds the timestamp the bucket came from
        self.totp
            .generate(bucket.saturating_mul(self.policy.step_seconds))
    }

    /// The current code at `now`.
    pub fn generate(&self, now: DateTime<Utc>) -> String {
        self.code_for_bucket(self.policy.bucket(now))
    }

    /// True when `candidate` equals the code of any bucket within the
    /// tolerance window around `now`.
    ///
    /// Never fails: empty, malformed and expired candidates are all simply
    /// `false`.
    pub fn validate(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        let candidate = candidate.trim();
        if candidate.len() != CODE_DIGITS || !candidate.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        let current = self.policy.bucket(now);
        let tolerance = u64::from(self.policy.tolerance_steps);
        let first = current.saturating_sub(tolerance);
        let last = current.saturating_add(tolerance);

        // every bucket is checked; no early exit on match
        let mut matched = subtle::Choice::from(0u8);
        for bucket in first..=last {
            let expected = self.code_for_bucket(bucket);
            matched |= expected.as_bytes().ct_eq(candidate.as_bytes());
        }
        matched.into()
    }
}

/// Free-function form of [`CodeEngine::generate`].
pub fn generate(secret: &SharedSecret, step_seconds: u64, now: DateTime<Utc>) -> Option<String> {
    let policy = CodePolicy::new(step_seconds, 0)?;
    Some(CodeEngine::new(secret.clone(), policy).generate(now))
}

/// Free-function form of [`CodeEngine::validate`]. An unusable policy
/// validates nothing.
pub fn validate(
    candidate: &str,
    secret: &SharedSecret,
    step_seconds: u64,
    tolerance_steps: u32,
    now: DateTime<Utc>,
) -> bool {
    CodePolicy::new(step_seconds, tolerance_steps)
        .is_some_and(|policy| CodeEngine::new(secret.clone(), policy).validate(candidate, now))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn engine(secret: &str) -> CodeEngine {
        CodeEngine::new(SharedSecret::from(secret), CodePolicy::default())
    }

    #[test]
    fn matches_rfc4226_vectors() {
        // with a one-second step the counter is the timestamp
        let e = CodeEngine::new(
            SharedSecret::from("12345678901234567890"),
            CodePolicy::new(1, 0).unwrap(),
        );
        let expected = ["755224", "287082", "359152", "969429", "338314"];
        for (counter, code) in expected.iter().enumerate() {
            assert_eq!(e.generate(at(counter as i64)), *code);
        }
    }

    #[test]
    fn matches_rfc6238_sha1_vector_truncated_to_six_digits() {
        // 8-digit reference value at T=59 with a 30 s step is 94287082
        let code = generate(&SharedSecret::from("12345678901234567890"), 30, at(59)).unwrap();
        assert_eq!(code, "287082");
    }

    #[test]
    fn generate_is_stable_within_a_bucket() {
        let e = engine("S1");
        let code = e.generate(at(900));
        assert_eq!(code.len(), CODE_DIGITS);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(e.generate(at(1000)), code);
        assert_eq!(e.generate(at(1199)), code);
    }

    #[test]
    fn different_secrets_diverge() {
        assert_ne!(engine("S1").generate(at(1000)), engine("S2").generate(at(1000)));
    }

    #[test]
    fn accepts_within_tolerance_window() {
        let e = engine("S1");
        let code = e.generate(at(1000)); // bucket 3
        // buckets 1..=5 cover [300, 1799]
        for t in [300, 400, 999, 1000, 1600, 1799] {
            assert!(e.validate(&code, at(t)), "should accept at t={t}");
        }
    }

    #[test]
    fn rejects_outside_tolerance_window() {
        let e = engine("S1");
        let code = e.generate(at(1000));
        for t in [299, 1800, 2000, 10_000] {
            assert!(!e.validate(&code, at(t)), "should reject at t={t}");
        }
    }

    #[test]
    fn zero_tolerance_only_accepts_current_bucket() {
        let e = CodeEngine::new(SharedSecret::from("S1"), CodePolicy::new(300, 0).unwrap());
        let code = e.generate(at(1000));
        assert!(e.validate(&code, at(900)));
        assert!(!e.validate(&code, at(1200)));
    }

    #[test]
    fn malformed_candidates_are_rejected() {
        let e = engine("S1");
        let code = e.generate(at(1000));
        assert!(e.validate(&format!(" {code}\n"), at(1000)));
        for bad in ["", "12345", "1234567", "12a456", "١٢٣٤٥٦", "      "] {
            assert!(!e.validate(bad, at(1000)), "accepted {bad:?}");
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let code = engine("S1").generate(at(1000));
        assert!(!engine("other").validate(&code, at(1000)));
    }

    #[test]
    fn pre_epoch_instants_share_step_zero() {
        let e = engine("S1");
        let early = at(-1_000_000);
        assert_eq!(e.generate(early), e.generate(at(0)));
        assert!(e.validate(&e.generate(early), early));
        assert!(e.validate(&e.generate(at(0)), at(-1)));
        // step 0 plus two steps of tolerance reaches t = 899
        assert!(e.validate(&e.generate(early), at(899)));
        assert!(!e.validate(&e.generate(early), at(900)));
    }

    #[test]
    fn extreme_times_do_not_panic() {
        let e = engine("S1");
        let far = DateTime::<Utc>::MAX_UTC;
        let code = e.generate(far);
        assert!(e.validate(&code, far));
    }

    #[test]
    fn unusable_policies_are_refused() {
        assert!(CodePolicy::new(300, MAX_TOLERANCE_STEPS).is_some());
        assert!(CodePolicy::new(300, MAX_TOLERANCE_STEPS + 1).is_none());
        assert!(CodePolicy::new(300, u32::MAX).is_none());
        assert!(!validate("123456", &SharedSecret::from("S1"), 300, u32::MAX, at(1000)));
        assert!(CodePolicy::new(0, 2).is_none());
        assert!(generate(&SharedSecret::from("S1"), 0, at(1000)).is_none());
        assert!(!validate("123456", &SharedSecret::from("S1"), 0, 2, at(1000)));
    }

    #[test]
    fn free_functions_agree_with_engine() {
        let secret = SharedSecret::from("S1");
        let code = generate(&secret, 300, at(1000)).unwrap();
        assert_eq!(code, engine("S1").generate(at(1000)));
        assert!(validate(&code, &secret, 300, 2, at(1600)));
        assert!(!validate(&code, &secret, 300, 2, at(2000)));
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let dbg = format!("{:?}", engine("super-secret"));
        assert!(!dbg.contains("super-secret"));
    }
}
