//! Tag vocabulary used to widen a plan's wanted tags before matching
//! them against asset filenames.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Which inventory a tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Sprite,
    Background,
}

type AliasTable = &'static [(&'static str, &'static [&'static str])];

const SPRITE_ALIASES: AliasTable = &[
    ("ship", &["ship", "spaceship", "fighter"]),
    ("knight", &["knight", "sword", "hero"]),
    ("runner", &["runner", "kid", "athlete"]),
    ("unicorn", &["unicorn", "horse", "pony", "animal"]),
];

const BACKGROUND_ALIASES: AliasTable = &[
    ("canyon", &["canyon", "desert", "mesa"]),
    ("dungeon", &["dungeon", "moss", "stone"]),
    ("city", &["city", "rooftop", "neon"]),
    ("clouds", &["clouds", "sky", "islands"]),
];

fn table(kind: AssetKind) -> AliasTable {
    match kind {
        AssetKind::Sprite => SPRITE_ALIASES,
        AssetKind::Background => BACKGROUND_ALIASES,
    }
}

/// Union of every wanted tag with its aliases, lowercased.
/// Tags without a table entry expand to themselves.
pub fn expand<S: AsRef<str>>(kind: AssetKind, wanted: &[S]) -> BTreeSet<String> {
    let aliases = table(kind);
    let mut out = BTreeSet::new();
    for tag in wanted {
        let tag = tag.as_ref();
        out.insert(tag.to_lowercase());
        if let Some((_, words)) = aliases.iter().find(|(canonical, _)| *canonical == tag) {
            out.extend(words.iter().map(|w| w.to_lowercase()));
        }
    }
    out
}
