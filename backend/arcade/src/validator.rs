//! Score submission checks.
//!
//! Checks run in a fixed order and stop at the first failure, so a given
//! submission always reports the same reason:
//!
//! 1. shape      → `bad_params`
//! 2. signature  → `bad_sig`
//! 3. freshness  → `expired`
//! 4. run length → `run_ms_out_of_range`
//! 5. score      → `score_out_of_range`

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::ScoreFields;
use crate::signing::PlaySigner;

pub const TOKEN_TTL_SECS: i64 = 2 * 60 * 60;
pub const MIN_RUN_MS: i64 = 3_000;
pub const MAX_RUN_MS: i64 = 30 * 60 * 1_000;
pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 1_000_000_000;

/// Bytes of the SHA-256 digest kept for `ip_hash`.
const IP_HASH_BYTES: usize = 16;

/// Raw, untrusted submission body. Every field is optional so that shape
/// problems surface as `bad_params` instead of a deserializer error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreSubmission {
    pub slug: Option<String>,
    pub score: Option<Value>,
    pub run_ms: Option<Value>,
    pub seed: Option<String>,
    pub issued_at: Option<String>,
    pub play_sig: Option<String>,
}

/// Why a submission was refused. The display form is the stable reason code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    #[error("bad_params")]
    BadParams,
    #[error("bad_sig")]
    BadSig,
    #[error("expired")]
    Expired,
    #[error("run_ms_out_of_range")]
    RunMsOutOfRange,
    #[error("score_out_of_range")]
    ScoreOutOfRange,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadParams => "bad_params",
            Self::BadSig => "bad_sig",
            Self::Expired => "expired",
            Self::RunMsOutOfRange => "run_ms_out_of_range",
            Self::ScoreOutOfRange => "score_out_of_range",
        }
    }
}

/// Validate a submission against the signing key and the clock.
///
/// `client_ip` only feeds the returned `ip_hash`; it never affects the verdict.
pub fn validate(
    signer: &PlaySigner,
    submission: &ScoreSubmission,
    client_ip: &str,
    now: DateTime<Utc>,
) -> Result<ScoreFields, Rejection> {
    let slug = required(&submission.slug)?;
    let seed = required(&submission.seed)?;
    let issued_at = required(&submission.issued_at)?;
    let play_sig = required(&submission.play_sig)?;
    let score = integer(&submission.score).ok_or(Rejection::BadParams)?;
    let run_ms = integer(&submission.run_ms).ok_or(Rejection::BadParams)?;

    if !signer.verify(slug, seed, issued_at, play_sig) {
        return Err(Rejection::BadSig);
    }

    let issued = DateTime::parse_from_rfc3339(issued_at)
        .map_err(|_| Rejection::Expired)?
        .with_timezone(&Utc);
    if now - issued > Duration::seconds(TOKEN_TTL_SECS) {
        return Err(Rejection::Expired);
    }

    if !(MIN_RUN_MS..=MAX_RUN_MS).contains(&run_ms) {
        return Err(Rejection::RunMsOutOfRange);
    }
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(Rejection::ScoreOutOfRange);
    }

    Ok(ScoreFields {
        slug: slug.to_string(),
        score,
        run_ms,
        seed: seed.to_string(),
        issued_at: issued_at.to_string(),
        ip_hash: ip_hash(client_ip),
    })
}

/// Truncated SHA-256 of the client address, hex-encoded.
pub fn ip_hash(client_ip: &str) -> String {
    let digest = Sha256::digest(client_ip.as_bytes());
    hex::encode(&digest[..IP_HASH_BYTES])
}

fn required(field: &Option<String>) -> Result<&str, Rejection> {
    match field.as_deref() {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(Rejection::BadParams),
    }
}

/// Accept JSON integers, and floats with no fractional part.
/// Magnitudes beyond `i64` saturate so they fail the range checks, not the shape check.
fn integer(field: &Option<Value>) -> Option<i64> {
    let Some(Value::Number(n)) = field else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.as_u64().is_some() {
        return Some(i64::MAX);
    }
    let f = n.as_f64()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::issue;
    use crate::planner::plan;
    use crate::selector::Picks;
    use chrono::TimeZone;
    use serde_json::json;

    fn signer() -> PlaySigner {
        PlaySigner::new("test-secret")
    }

    fn issued_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    /// A valid submission for a freshly issued config.
    fn submission(score: Value, run_ms: Value) -> ScoreSubmission {
        let prompt = "neon canyon shmup";
        let p = plan(prompt);
        let cfg = issue(&signer(), &p, prompt, &Picks::default(), issued_now());
        ScoreSubmission {
            slug: Some(cfg.slug),
            score: Some(score),
            run_ms: Some(run_ms),
            seed: Some(cfg.seed),
            issued_at: Some(cfg.issued_at),
            play_sig: Some(cfg.play_sig),
        }
    }

    fn valid() -> ScoreSubmission {
        submission(json!(1234), json!(45_000))
    }

    fn check(sub: &ScoreSubmission, now: DateTime<Utc>) -> Result<ScoreFields, Rejection> {
        validate(&signer(), sub, "203.0.113.9", now)
    }

    #[test]
    fn accepts_fresh_valid_submission() {
        let sub = valid();
        let fields = check(&sub, issued_now()).unwrap();
        assert_eq!(fields.slug, sub.slug.unwrap());
        assert_eq!(fields.score, 1234);
        assert_eq!(fields.run_ms, 45_000);
        assert_eq!(fields.ip_hash, ip_hash("203.0.113.9"));
        assert_eq!(fields.ip_hash.len(), 32);
    }

    #[test]
    fn missing_or_malformed_fields_are_bad_params() {
        let mut sub = valid();
        sub.slug = None;
        assert_eq!(check(&sub, issued_now()), Err(Rejection::BadParams));

        let mut sub = valid();
        sub.play_sig = Some(String::new());
        assert_eq!(check(&sub, issued_now()), Err(Rejection::BadParams));

        let sub = submission(json!("1234"), json!(45_000));
        assert_eq!(check(&sub, issued_now()), Err(Rejection::BadParams));

        let sub = submission(json!(12.5), json!(45_000));
        assert_eq!(check(&sub, issued_now()), Err(Rejection::BadParams));

        assert_eq!(
            check(&ScoreSubmission::default(), issued_now()),
            Err(Rejection::BadParams)
        );
    }

    #[test]
    fn whole_floats_count_as_integers() {
        let sub = submission(json!(100.0), json!(3000.0));
        assert!(check(&sub, issued_now()).is_ok());
    }

    #[test]
    fn shape_is_checked_before_signature() {
        let mut sub = valid();
        sub.play_sig = Some("00".repeat(32));
        sub.run_ms = None;
        assert_eq!(check(&sub, issued_now()), Err(Rejection::BadParams));
    }

    #[test]
    fn any_flipped_signature_char_is_bad_sig() {
        let sub = valid();
        let sig = sub.play_sig.clone().unwrap();
        for i in 0..sig.len() {
            let mut chars: Vec<char> = sig.chars().collect();
            chars[i] = if chars[i] == '0' { '1' } else { '0' };
            let mut forged = sub.clone();
            forged.play_sig = Some(chars.into_iter().collect());
            let verdict = check(&forged, issued_now());
            assert_eq!(verdict, Err(Rejection::BadSig), "index {i}");
        }
    }

    #[test]
    fn tampered_signed_fields_are_bad_sig() {
        let mut sub = valid();
        sub.seed = Some("deadbeefdeadbeef".to_string());
        assert_eq!(check(&sub, issued_now()), Err(Rejection::BadSig));

        let mut sub = valid();
        sub.issued_at = Some("2099-01-01T00:00:00.000Z".to_string());
        assert_eq!(check(&sub, issued_now()), Err(Rejection::BadSig));
    }

    #[test]
    fn signature_is_checked_before_ranges() {
        let mut sub = submission(json!(-5), json!(1));
        sub.play_sig = Some("ab".repeat(32));
        assert_eq!(check(&sub, issued_now()), Err(Rejection::BadSig));
    }

    #[test]
    fn expiry_boundary() {
        let sub = valid();
        let ttl = Duration::seconds(TOKEN_TTL_SECS);
        let just_before = issued_now() + ttl - Duration::seconds(1);
        let just_after = issued_now() + ttl + Duration::seconds(1);
        assert!(check(&sub, just_before).is_ok());
        assert!(check(&sub, issued_now() + ttl).is_ok());
        assert_eq!(check(&sub, just_after), Err(Rejection::Expired));
    }

    #[test]
    fn unparseable_issued_at_is_expired() {
        let s = signer();
        let issued_at = "yesterday-ish";
        let sub = ScoreSubmission {
            slug: Some("shmup-clouds-x".to_string()),
            score: Some(json!(10)),
            run_ms: Some(json!(5000)),
            seed: Some("00".to_string()),
            issued_at: Some(issued_at.to_string()),
            play_sig: Some(s.sign("shmup-clouds-x", "00", issued_at)),
        };
        let verdict = validate(&s, &sub, "", issued_now());
        assert_eq!(verdict, Err(Rejection::Expired));
    }

    #[test]
    fn run_ms_boundaries() {
        let now = issued_now();
        assert_eq!(
            check(&submission(json!(1), json!(2_999)), now),
            Err(Rejection::RunMsOutOfRange)
        );
        assert!(check(&submission(json!(1), json!(3_000)), now).is_ok());
        assert!(check(&submission(json!(1), json!(1_800_000)), now).is_ok());
        assert_eq!(
            check(&submission(json!(1), json!(1_800_001)), now),
            Err(Rejection::RunMsOutOfRange)
        );
    }

    #[test]
    fn score_boundaries() {
        let now = issued_now();
        assert_eq!(
            check(&submission(json!(1_000_000_001), json!(5_000)), now),
            Err(Rejection::ScoreOutOfRange)
        );
        let top = submission(json!(1_000_000_000), json!(5_000));
        assert!(check(&top, now).is_ok());
        assert!(check(&submission(json!(0), json!(5_000)), now).is_ok());
        assert_eq!(
            check(&submission(json!(-1), json!(5_000)), now),
            Err(Rejection::ScoreOutOfRange)
        );
        assert_eq!(
            check(&submission(json!(u64::MAX), json!(5_000)), now),
            Err(Rejection::ScoreOutOfRange)
        );
    }

    #[test]
    fn run_ms_is_checked_before_score() {
        let sub = submission(json!(-1), json!(10));
        assert_eq!(check(&sub, issued_now()), Err(Rejection::RunMsOutOfRange));
    }

    #[test]
    fn reason_codes_are_stable() {
        for r in [
            Rejection::BadParams,
            Rejection::BadSig,
            Rejection::Expired,
            Rejection::RunMsOutOfRange,
            Rejection::ScoreOutOfRange,
        ] {
            assert_eq!(r.to_string(), r.as_str());
            assert_eq!(serde_json::to_value(r).unwrap(), json!(r.as_str()));
        }
    }

    #[test]
    fn submission_deserializes_from_partial_json() {
        let body = json!({ "slug": "a", "score": 3, "seed": null });
        let sub: ScoreSubmission = serde_json::from_value(body).unwrap();
        assert_eq!(sub.slug.as_deref(), Some("a"));
        assert_eq!(sub.score, Some(json!(3)));
        assert!(sub.seed.is_none());
        assert!(sub.play_sig.is_none());
        assert_eq!(check(&sub, issued_now()), Err(Rejection::BadParams));
    }
}
