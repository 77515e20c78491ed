//! `morph` command: reconcile two markup files offline.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::common::plural_count;
use crate::dom::{Document, Mutation};
use crate::morph::{UpdateMode, morph};

/// Morph `live` into `target` and print the resulting markup.
pub fn run(live: &Path, target: &Path, push: bool) -> Result<()> {
    let html = morph_files(live, target, push)?;
    println!("{html}");
    Ok(())
}

fn morph_files(live: &Path, target: &Path, push: bool) -> Result<String> {
    let live_markup = fs::read_to_string(live)
        .with_context(|| format!("failed to read {}", live.display()))?;
    let target_markup = fs::read_to_string(target)
        .with_context(|| format!("failed to read {}", target.display()))?;

    let mode = if push {
        UpdateMode::Push
    } else {
        UpdateMode::Navigation
    };
    Ok(morph_markup(&live_markup, &target_markup, mode))
}

fn morph_markup(live_markup: &str, target_markup: &str, mode: UpdateMode) -> String {
    let mut live = Document::parse(live_markup);
    let mut target = Document::parse(target_markup);
    live.track_mutations();

    let (live_root, target_root) = (live.root(), target.root());
    morph(&mut live, live_root, &mut target, target_root, mode);

    let mutations = live.take_mutations();
    crate::debug!("morph"; "{}", summarize(&mutations));
    live.to_html()
}

fn summarize(mutations: &[Mutation]) -> String {
    let (mut attrs, mut props, mut inserts, mut removes, mut moves) = (0, 0, 0, 0, 0);
    for mutation in mutations {
        match mutation {
            Mutation::SetAttr { .. } | Mutation::RemoveAttr { .. } => attrs += 1,
            Mutation::SetProperty { .. } => props += 1,
            Mutation::Insert { .. } => inserts += 1,
            Mutation::Remove { .. } => removes += 1,
            Mutation::Move { .. } => moves += 1,
        }
    }
    [
        plural_count(attrs, "attribute change"),
        plural_count(props, "property write"),
        plural_count(inserts, "insert"),
        plural_count(removes, "removal"),
        plural_count(moves, "move"),
    ]
    .join(", ")
}
