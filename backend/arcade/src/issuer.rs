//! Builds the signed [`GameConfig`] handed to the client renderer.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::{CryptoRng, RngCore};
use serde::Serialize;

use crate::planner::{Genre, Mechanics, Palette, Plan};
use crate::selector::{PickedUrls, Picks};
use crate::signing::PlaySigner;

const SEED_BYTES: usize = 8;
const SLUG_SUFFIX_BYTES: usize = 2;

const SPEED_RANGE: (f64, f64) = (0.5, 1.5);
const SPAWN_RATE_RANGE: (f64, f64) = (0.5, 1.5);
const GRAVITY_RANGE: (f64, f64) = (0.0, 1.5);

/// Cosmetic feel parameters. Not signed and not validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Juice {
    pub shake: f64,
    pub hitstop_ms: u32,
    pub trail: bool,
    pub particles: &'static str,
    pub bloom: bool,
}

impl Default for Juice {
    fn default() -> Self {
        Self {
            shake: 0.6,
            hitstop_ms: 60,
            trail: true,
            particles: "heavy",
            bloom: true,
        }
    }
}

/// Everything the client needs to play one run and later submit a score.
/// The server keeps no copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameConfig {
    pub slug: String,
    pub prompt: String,
    pub seed: String,
    pub issued_at: String,
    pub play_sig: String,
    pub genre: Genre,
    pub palette: Palette,
    pub mechanics: Mechanics,
    pub assets: PickedUrls,
    pub juice: Juice,
}

/// Issue a config using the thread-local CSPRNG.
pub fn issue(
    signer: &PlaySigner,
    plan: &Plan,
    prompt: &str,
    picks: &Picks,
    now: DateTime<Utc>,
) -> GameConfig {
    issue_with_rng(signer, plan, prompt, picks, now, &mut rand::thread_rng())
}

pub fn issue_with_rng<R: RngCore + CryptoRng>(
    signer: &PlaySigner,
    plan: &Plan,
    prompt: &str,
    picks: &Picks,
    now: DateTime<Utc>,
    rng: &mut R,
) -> GameConfig {
    let issued_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let seed = random_hex(rng, SEED_BYTES);

    let background_tag = plan
        .asset_tags
        .background
        .first()
        .map(String::as_str)
        .unwrap_or("clouds");
    let slug = format!(
        "{}-{}-{}-{}",
        plan.genre.as_str(),
        background_tag,
        now.format("%Y-%m-%d"),
        random_hex(rng, SLUG_SUFFIX_BYTES)
    );

    let play_sig = signer.sign(&slug, &seed, &issued_at);

    GameConfig {
        slug,
        prompt: prompt.to_string(),
        seed,
        issued_at,
        play_sig,
        genre: plan.genre,
        palette: plan.palette,
        mechanics: clamp_mechanics(&plan.mechanics),
        assets: picks.urls(),
        juice: Juice::default(),
    }
}

pub fn clamp_mechanics(m: &Mechanics) -> Mechanics {
    Mechanics {
        speed: clamp(m.speed, SPEED_RANGE),
        spawn_rate: clamp(m.spawn_rate, SPAWN_RATE_RANGE),
        gravity: clamp(m.gravity, GRAVITY_RANGE),
    }
}

/// Saturating clamp; NaN goes to the lower bound.
fn clamp(v: f64, (lo, hi): (f64, f64)) -> f64 {
    if v.is_nan() {
        lo
    } else {
        v.clamp(lo, hi)
    }
}

fn random_hex<R: RngCore>(rng: &mut R, len: usize) -> String {
    let mut buf = vec![0u8; len];
    rng.fill_bytes(&mut buf);
    hex::encode(buf)
}
