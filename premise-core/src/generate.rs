//! Candidate generation for one tree level.
//!
//! Each stage has a fixed prompt plan: background fans out over three
//! component prompts, persona over three cast configurations, and the
//! deeper stages issue a single prompt. Responses are newline-delimited
//! serial-numbered lists; the numbering is stripped and the batch is
//! shuffled so later truncation to a target count carries no positional
//! bias.

use crate::client::PipelineContext;
use crate::error::{Error, Result};
use crate::level::Stage;
use crate::prompts;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;

/// Sampling temperature for all level generation prompts.
pub const GENERATION_TEMPERATURE: f32 = 0.6;

static SERIAL_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.").expect("serial pattern"));

/// Strip `<number>.` sequences anywhere in each line and trim whitespace.
pub fn filter_serial_numbers<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            SERIAL_NUMBER
                .replace_all(line.as_ref(), "")
                .trim()
                .to_string()
        })
        .collect()
}

/// Build the prompt batch for generating children of `parent` at `stage`.
///
/// The parent key path must be exactly one level short of the stage depth.
fn prompt_plan(stage: Stage, parent: &[String]) -> Result<Vec<String>> {
    let expected = stage.depth() - 1;
    if parent.len() != expected {
        return Err(Error::PathDepth {
            path: parent.to_vec(),
            expected,
            found: parent.len(),
        });
    }

    let plan = match stage {
        Stage::Background => {
            let theme = &parent[0];
            prompts::BACKGROUND_COMPONENTS
                .iter()
                .map(|component| prompts::background(theme, component))
                .collect()
        }
        Stage::Persona => {
            let (theme, background) = (&parent[0], &parent[1]);
            vec![
                prompts::protagonist(theme, background),
                prompts::protagonist_antagonist(theme, background),
                prompts::protagonist_deuteragonist(theme, background),
            ]
        }
        Stage::Event => vec![prompts::event(&parent[0], &parent[1], &parent[2])],
        Stage::Ending => vec![prompts::ending(
            &parent[0], &parent[1], &parent[2], &parent[3],
        )],
        Stage::Twist => vec![prompts::twist(
            &parent[0], &parent[1], &parent[2], &parent[3], &parent[4],
        )],
    };
    Ok(plan)
}

/// Generate one shuffled batch of candidate children for `parent`.
///
/// Prompts run sequentially; each completion is awaited before the next.
pub async fn generate_candidates(
    ctx: &PipelineContext,
    stage: Stage,
    parent: &[String],
) -> Result<Vec<String>> {
    let mut lines: Vec<String> = Vec::new();
    for prompt in prompt_plan(stage, parent)? {
        let response = ctx.chat().complete(&prompt, GENERATION_TEMPERATURE).await?;
        lines.extend(
            response
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string),
        );
    }

    let mut candidates = filter_serial_numbers(&lines);
    // A line holding nothing but its serial number strips down to empty.
    candidates.retain(|candidate| !candidate.is_empty());
    candidates.shuffle(&mut rand::thread_rng());
    Ok(candidates)
}
