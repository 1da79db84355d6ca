//! Prompt → [`Plan`] rules.
//!
//! Every category is decided by an ordered table of `(keywords, value)`
//! rows. The lowercased prompt is scanned top to bottom and the first row
//! with any keyword present as a substring wins; when nothing matches the
//! category default is used. Planning never fails: an empty or nonsense
//! prompt simply yields the all-default plan.

use serde::{Deserialize, Serialize};

/// Maximum number of characters of the prompt echoed back as `vibe`.
pub const VIBE_MAX_CHARS: usize = 40;

/// Gravity applied when the genre needs it.
const PLATFORMER_GRAVITY: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Platformer,
    Runner,
    Shmup,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platformer => "platformer",
            Self::Runner => "runner",
            Self::Shmup => "shmup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    Neon,
    Night,
    Dusk,
    Pastel,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mechanics {
    pub speed: f64,
    pub spawn_rate: f64,
    pub gravity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTags {
    pub sprite: Vec<String>,
    pub background: Vec<String>,
}

/// Structured description of the game to assemble for a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub genre: Genre,
    pub palette: Palette,
    /// Display-only snippet of the prompt.
    pub vibe: String,
    pub mechanics: Mechanics,
    pub asset_tags: AssetTags,
}

type Rules<T> = &'static [(&'static [&'static str], T)];

const GENRE_RULES: Rules<Genre> = &[
    (&["platform", "jump"], Genre::Platformer),
    (&["runner"], Genre::Runner),
];

const PALETTE_RULES: Rules<Palette> = &[
    (&["neon"], Palette::Neon),
    (&["night"], Palette::Night),
    (&["dusk"], Palette::Dusk),
    (&["pastel"], Palette::Pastel),
];

const SPRITE_RULES: Rules<&str> = &[
    (&["knight"], "knight"),
    (&["ship", "space"], "ship"),
    (&["unicorn"], "unicorn"),
    (&["runner", "run"], "runner"),
];

const BACKGROUND_RULES: Rules<&str> = &[
    (&["dungeon"], "dungeon"),
    (&["city", "roof"], "city"),
    (&["cloud", "island"], "clouds"),
    (&["canyon", "desert"], "canyon"),
];

/// First-match-wins lookup over an ordered rule table.
fn first_match<T: Copy>(text: &str, rules: Rules<T>, default: T) -> T {
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, value)| *value)
        .unwrap_or(default)
}

/// Build a plan from a free-text prompt. Pure and deterministic.
pub fn plan(prompt: &str) -> Plan {
    let text = prompt.to_lowercase();

    let genre = first_match(&text, GENRE_RULES, Genre::Shmup);
    let palette = first_match(&text, PALETTE_RULES, Palette::Day);
    let sprite = first_match(&text, SPRITE_RULES, "runner");
    let background = first_match(&text, BACKGROUND_RULES, "clouds");

    let gravity = if genre == Genre::Platformer {
        PLATFORMER_GRAVITY
    } else {
        0.0
    };

    Plan {
        genre,
        palette,
        vibe: prompt.chars().take(VIBE_MAX_CHARS).collect(),
        mechanics: Mechanics {
            speed: 1.0,
            spawn_rate: 1.0,
            gravity,
        },
        asset_tags: AssetTags {
            sprite: vec![sprite.to_string()],
            background: vec![background.to_string()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_defaults(p: &Plan) {
        assert_eq!(p.genre, Genre::Shmup);
        assert_eq!(p.palette, Palette::Day);
        assert_eq!(p.asset_tags.sprite, vec!["runner"]);
        assert_eq!(p.asset_tags.background, vec!["clouds"]);
        assert_eq!(p.mechanics.gravity, 0.0);
    }

    #[test]
    fn empty_and_nonsense_prompts_fall_back_to_defaults() {
        assert_defaults(&plan(""));
        assert_defaults(&plan("xyzzy"));
        assert_eq!(plan("").vibe, "");
    }

    #[test]
    fn planning_is_deterministic() {
        let prompts = ["", "neon canyon shmup", "Jumping KNIGHT at night"];
        for p in prompts {
            assert_eq!(plan(p), plan(p));
        }
    }

    #[test]
    fn neon_canyon_shmup() {
        let p = plan("neon canyon shmup");
        assert_eq!(p.genre, Genre::Shmup);
        assert_eq!(p.palette, Palette::Neon);
        assert_eq!(p.asset_tags.background, vec!["canyon"]);
        assert_eq!(p.asset_tags.sprite, vec!["runner"]);
    }

    #[test]
    fn platformer_gets_gravity() {
        let p = plan("a JUMP game");
        assert_eq!(p.genre, Genre::Platformer);
        assert_eq!(p.mechanics.gravity, PLATFORMER_GRAVITY);
        assert_eq!(p.mechanics.speed, 1.0);
        assert_eq!(p.mechanics.spawn_rate, 1.0);
    }

    #[test]
    fn earlier_rows_win() {
        // "platform" outranks "runner" for genre.
        assert_eq!(plan("platform runner").genre, Genre::Platformer);
        // "neon" outranks "night" for palette.
        assert_eq!(plan("night neon").palette, Palette::Neon);
        // "knight" outranks "ship"; "dungeon" outranks "city".
        let p = plan("spaceship knight city dungeon");
        assert_eq!(p.asset_tags.sprite, vec!["knight"]);
        assert_eq!(p.asset_tags.background, vec!["dungeon"]);
    }

    #[test]
    fn substring_keywords_match() {
        let p = plan("rooftop islands");
        assert_eq!(p.asset_tags.background, vec!["city"]);
        assert_eq!(plan("space race").asset_tags.sprite, vec!["ship"]);
        assert_eq!(plan("desert").asset_tags.background, vec!["canyon"]);
    }

    #[test]
    fn vibe_is_truncated_by_characters() {
        let prompt = "é".repeat(50);
        let p = plan(&prompt);
        assert_eq!(p.vibe.chars().count(), VIBE_MAX_CHARS);

        let short = "pastel unicorn runner";
        assert_eq!(plan(short).vibe, short);
    }
}
