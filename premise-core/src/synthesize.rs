//! Premise synthesis over a finished tree, and the optional verification
//! pass over the synthesized log.
//!
//! Synthesis walks every depth-6 leaf of the twist tree in traversal
//! order and appends one record per leaf to a JSONL log immediately, so
//! a crash loses at most the in-flight leaf. Leaves whose ids already
//! appear in the log are skipped, which makes reruns idempotent.

use crate::client::PipelineContext;
use crate::error::{Error, Result};
use crate::level::Level;
use crate::prompts;
use crate::store;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Temperature for the synthesis prompt; deterministic output.
const SYNTHESIS_TEMPERATURE: f32 = 0.0;

/// Temperature for the verification judgment.
const VERIFY_TEMPERATURE: f32 = 0.6;

static VERDICT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(Yes|No)\]\]").expect("verdict pattern"));

/// One synthesized story premise; one line of the premise log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiseRecord {
    pub id: String,
    pub premise: String,
    pub theme: String,
    pub background: String,
    pub persona: String,
    pub event: String,
    pub ending: String,
    pub twist: String,
}

/// Replace masked levels' values with the empty string.
pub fn apply_mask(values: [String; 6], masks: &[Level]) -> [String; 6] {
    let mut out = values;
    for mask in masks {
        out[mask.index()] = String::new();
    }
    out
}

/// Parse mask names, rejecting unknown level names before any generation.
pub fn parse_masks(names: &[String]) -> Result<Vec<Level>> {
    names.iter().map(|name| name.parse()).collect()
}

fn key_path_values(path: &[String]) -> Result<[String; 6]> {
    <[String; 6]>::try_from(path.to_vec()).map_err(|path: Vec<String>| {
        let found = path.len();
        Error::PathDepth {
            path,
            expected: 6,
            found,
        }
    })
}

/// Synthesize one premise per unsynthesized leaf of the tree at
/// `tree_path`, appending to the log at `premise_path`.
///
/// Returns the number of records appended this run.
pub async fn run_synthesis(
    ctx: &PipelineContext,
    tree_path: &Path,
    premise_path: &Path,
    masks: &[Level],
) -> Result<usize> {
    let tree = store::load_tree(tree_path).await?;
    let existing: Vec<PremiseRecord> = store::read_jsonl(premise_path).await?;
    info!("Load modules from: {}", tree_path.display());
    info!("Synthesize premises in: {}", premise_path.display());
    if !masks.is_empty() {
        info!("Masked levels: {masks:?}");
    }

    let synthesized: HashSet<String> = existing.into_iter().map(|record| record.id).collect();

    let mut appended = 0;
    for (path, id) in tree.leaf_entries() {
        if synthesized.contains(id.as_str()) {
            continue;
        }

        let values = apply_mask(key_path_values(&path)?, masks);
        let [theme, background, persona, event, ending, twist] = values;
        let prompt = prompts::synthesize(&theme, &background, &persona, &event, &ending, &twist);
        let premise = ctx.chat().complete(&prompt, SYNTHESIS_TEMPERATURE).await?;

        let record = PremiseRecord {
            id: id.as_str().to_string(),
            premise,
            theme,
            background,
            persona,
            event,
            ending,
            twist,
        };
        store::append_jsonl(premise_path, &record).await?;
        appended += 1;
    }
    Ok(appended)
}

/// Judgment extracted from a verification response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    /// The model flagged the premise as inconsistent or factually wrong.
    Flagged,
    /// Explicit pass, or no judgment pattern found.
    Clean,
}

/// First `[[Yes]]`/`[[No]]` in the response; no match defaults to clean.
fn extract_verdict(text: &str) -> Verdict {
    match VERDICT.captures(text) {
        Some(caps) if &caps[1] == "Yes" => Verdict::Flagged,
        _ => Verdict::Clean,
    }
}

/// Filter the premise log through a model consistency judgment.
///
/// Flagged records are dropped with a warning; passing records are
/// appended to the verified log unchanged. Records already verified are
/// skipped. Returns `(kept, dropped)` counts for this run.
pub async fn run_verification(
    ctx: &PipelineContext,
    premise_path: &Path,
    verified_path: &Path,
) -> Result<(usize, usize)> {
    let premises: Vec<PremiseRecord> = store::read_jsonl(premise_path).await?;
    let verified: Vec<PremiseRecord> = store::read_jsonl(verified_path).await?;
    info!("Load premises from: {}", premise_path.display());
    info!("Verify premises in: {}", verified_path.display());

    let done: HashSet<String> = verified.into_iter().map(|record| record.id).collect();

    let mut kept = 0;
    let mut dropped = 0;
    for record in premises {
        if done.contains(&record.id) {
            continue;
        }

        let prompt = prompts::verify(&record.premise);
        let response = ctx.chat().complete(&prompt, VERIFY_TEMPERATURE).await?;

        match extract_verdict(&response) {
            Verdict::Flagged => {
                warn!(
                    "Detect error in id: {}, premise: {}",
                    record.id, record.premise
                );
                dropped += 1;
            }
            Verdict::Clean => {
                store::append_jsonl(verified_path, &record).await?;
                kept += 1;
            }
        }
    }
    Ok((kept, dropped))
}
