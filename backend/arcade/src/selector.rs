//! Picks one sprite and one background for a plan.
//!
//! Selection is a first-match linear scan, not a ranking: the first
//! candidate whose filename tags intersect the expanded wanted tags wins,
//! otherwise the first candidate overall. Callers must hand inventories in
//! a stable order (the storage listing sorts by name) so the same prompt
//! and bucket contents always pick the same files.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::AssetRef;
use crate::planner::Plan;
use crate::vocab::{self, AssetKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Picks {
    pub sprite: Option<AssetRef>,
    pub background: Option<AssetRef>,
}

/// URL-only view of [`Picks`], as embedded in configs and API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickedUrls {
    pub sprite_url: Option<String>,
    pub background_url: Option<String>,
}

impl Picks {
    pub fn urls(&self) -> PickedUrls {
        PickedUrls {
            sprite_url: self.sprite.as_ref().map(|a| a.url.clone()),
            background_url: self.background.as_ref().map(|a| a.url.clone()),
        }
    }
}

pub fn select(plan: &Plan, sprites: &[AssetRef], backgrounds: &[AssetRef]) -> Picks {
    Picks {
        sprite: pick_one(AssetKind::Sprite, &plan.asset_tags.sprite, sprites),
        background: pick_one(
            AssetKind::Background,
            &plan.asset_tags.background,
            backgrounds,
        ),
    }
}

fn pick_one(kind: AssetKind, tags: &[String], inventory: &[AssetRef]) -> Option<AssetRef> {
    let wanted = vocab::expand(kind, tags);
    inventory
        .iter()
        .find(|asset| matches(asset, &wanted))
        .or_else(|| inventory.first())
        .cloned()
}

fn matches(asset: &AssetRef, wanted: &BTreeSet<String>) -> bool {
    !tags_from_name(&asset.name).is_disjoint(wanted)
}

/// Lowercase the file name, drop its extension and split it on runs of
/// non-alphanumeric characters.
pub fn tags_from_name(name: &str) -> BTreeSet<String> {
    let lower = name.to_lowercase();
    let stem = match lower.rsplit_once('.') {
        Some((stem, ext)) if is_extension(ext) => stem,
        _ => lower.as_str(),
    };
    stem.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn is_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
}
