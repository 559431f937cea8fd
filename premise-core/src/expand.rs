//! The tree expansion driver.
//!
//! For one stage, grows every parent path's children to the configured
//! target count: generate a candidate batch, drop near-duplicates of the
//! already accepted siblings, insert the survivors with fresh ids, and
//! persist the whole output tree once the parent is complete. Parents
//! already at target are skipped, which makes reruns resume after a
//! crash and makes a second run over finished files a no-op.

use crate::client::PipelineContext;
use crate::dedup::{self, SIMILARITY_THRESHOLD};
use crate::error::{Error, Result};
use crate::generate;
use crate::level::Stage;
use crate::store;
use crate::tree::{LeafId, ModuleTree};
use log::{debug, info};
use std::path::Path;

/// Generation rounds allowed per parent before the run aborts.
pub const DEFAULT_MAX_ROUNDS: usize = 20;

/// Tuning for one expansion stage run.
#[derive(Debug, Clone)]
pub struct StageOptions {
    /// Children each parent path must reach.
    pub target: usize,
    /// Generation rounds allowed for one parent before the stage aborts
    /// with [`Error::InsufficientDiversity`]. Progress persisted so far
    /// is kept; a rerun resumes from it.
    pub max_rounds: usize,
    /// Similarity above which a candidate is dropped as a duplicate.
    pub threshold: f32,
}

impl StageOptions {
    /// Defaults for a stage: its standard target, 20 rounds, 0.85.
    pub fn for_stage(stage: Stage) -> Self {
        Self {
            target: stage.default_target(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            threshold: SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target = target;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}

/// Run one expansion stage over `module_dir`.
///
/// Reads the previous level's tree (which must exist), grows this
/// level's tree until every parent has `options.target` children, and
/// persists after each completed parent.
pub async fn run_stage(
    ctx: &PipelineContext,
    stage: Stage,
    module_dir: &Path,
    options: &StageOptions,
) -> Result<()> {
    let input_path = module_dir.join(stage.input_file());
    let output_path = module_dir.join(stage.output_file());

    let input = store::load_tree(&input_path).await?;
    let mut output = store::load_or_create_tree(&output_path).await?;
    info!("Load parents from: {}", input_path.display());
    info!("Collect {stage}s in: {}", output_path.display());

    let parents: Vec<Vec<String>> = input
        .leaf_entries()
        .into_iter()
        .map(|(path, _)| path)
        .collect();

    for parent in &parents {
        expand_parent(ctx, stage, &mut output, parent, options).await?;
        store::save_tree(&output, &output_path).await?;
    }
    Ok(())
}

/// Grow one parent path's children to the target count.
async fn expand_parent(
    ctx: &PipelineContext,
    stage: Stage,
    output: &mut ModuleTree,
    parent: &[String],
    options: &StageOptions,
) -> Result<()> {
    output.ensure_branch(parent)?;
    let mut count = output.child_count(parent);
    if count >= options.target {
        debug!("Skip complete parent {parent:?}");
        return Ok(());
    }

    let mut rounds = 0;
    while count < options.target {
        if rounds >= options.max_rounds {
            return Err(Error::InsufficientDiversity {
                path: parent.to_vec(),
                have: count,
                want: options.target,
                rounds,
            });
        }
        rounds += 1;

        let batch = generate::generate_candidates(ctx, stage, parent).await?;
        let existing = output.child_keys(parent);
        let fresh = dedup::deduplicate(ctx.embedder(), &batch, &existing, options.threshold).await?;

        for candidate in fresh.into_iter().take(options.target - count) {
            if output.insert_leaf(parent, &candidate, LeafId::generate())? {
                count += 1;
            }
        }
    }
    debug!("Collected {count} {stage}s under {parent:?} in {rounds} rounds");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{numbered_list, MockChat, MockEmbedder};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(chat: Arc<MockChat>) -> PipelineContext {
        PipelineContext::new(chat, Arc::new(MockEmbedder::new()))
    }

    async fn write_theme_tree(dir: &Path) {
        tokio::fs::write(dir.join("theme.json"), r#"{"fantasy": "t1"}"#)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_input_tree_is_fatal() {
        let dir = TempDir::new().unwrap();
        let ctx = context(Arc::new(MockChat::new(Vec::new())));
        let options = StageOptions::for_stage(Stage::Background).with_target(1);

        let err = run_stage(&ctx, Stage::Background, dir.path(), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingTree(_)));
    }

    #[tokio::test]
    async fn test_resumes_from_partial_output() {
        let dir = TempDir::new().unwrap();
        write_theme_tree(dir.path()).await;

        // One background already accepted from an earlier run.
        tokio::fs::write(
            dir.path().join("background.json"),
            r#"{"fantasy": {"an abandoned lighthouse": "b1"}}"#,
        )
        .await
        .unwrap();

        // Every prompt yields the same two candidates; one is already
        // accepted, so only the other can fill the remaining slot.
        let response = numbered_list(&["an abandoned lighthouse", "a glacier monastery"]);
        let chat = Arc::new(MockChat::new(vec![response]));
        let ctx = context(chat.clone());
        let options = StageOptions::for_stage(Stage::Background).with_target(2);

        run_stage(&ctx, Stage::Background, dir.path(), &options)
            .await
            .unwrap();

        let output = store::load_tree(&dir.path().join("background.json"))
            .await
            .unwrap();
        let keys = output.child_keys(&["fantasy".to_string()]);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"an abandoned lighthouse".to_string()));
        assert!(keys.contains(&"a glacier monastery".to_string()));

        // The pre-existing child keeps its original identifier.
        let id = output
            .leaf_id(&[
                "fantasy".to_string(),
                "an abandoned lighthouse".to_string(),
            ])
            .unwrap();
        assert_eq!(id.as_str(), "b1");
    }

    #[tokio::test]
    async fn test_insufficient_diversity_aborts() {
        let dir = TempDir::new().unwrap();
        write_theme_tree(dir.path()).await;

        // The model keeps producing the same single candidate; after the
        // first acceptance every further round dedups to nothing.
        let chat = Arc::new(MockChat::new(vec![numbered_list(&["the only idea"])]));
        let ctx = context(chat);
        let options = StageOptions::for_stage(Stage::Background)
            .with_target(3)
            .with_max_rounds(4);

        let err = run_stage(&ctx, Stage::Background, dir.path(), &options)
            .await
            .unwrap_err();

        match err {
            Error::InsufficientDiversity {
                path,
                have,
                want,
                rounds,
            } => {
                assert_eq!(path, vec!["fantasy".to_string()]);
                assert_eq!(have, 1);
                assert_eq!(want, 3);
                assert_eq!(rounds, 4);
            }
            other => panic!("unexpected error: {other}"),
        }

        // The parent never completed, so nothing was persisted beyond
        // the auto-created empty tree.
        let on_disk = tokio::fs::read_to_string(dir.path().join("background.json"))
            .await
            .unwrap();
        assert_eq!(on_disk, "{}");
    }

    #[tokio::test]
    async fn test_multiple_parents_all_reach_target() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(
            dir.path().join("theme.json"),
            r#"{"fantasy": "t1", "noir": "t2"}"#,
        )
        .await
        .unwrap();

        // Scripted one response per round; each of the two parents runs
        // one round of three background prompts.
        let chat = Arc::new(MockChat::new(vec![
            numbered_list(&["a drowned city", "a sky harbor"]),
            numbered_list(&["a glass desert", "an iron forest"]),
            numbered_list(&["a salt plain", "a coral cave"]),
            numbered_list(&["a rain-slick precinct", "a smoky dance hall"]),
            numbered_list(&["a dockside warehouse", "a neon alley"]),
            numbered_list(&["a shuttered casino", "a night train"]),
        ]));
        let ctx = context(chat);
        let options = StageOptions::for_stage(Stage::Background).with_target(4);

        run_stage(&ctx, Stage::Background, dir.path(), &options)
            .await
            .unwrap();

        let output = store::load_tree(&dir.path().join("background.json"))
            .await
            .unwrap();
        assert_eq!(output.child_count(&["fantasy".to_string()]), 4);
        assert_eq!(output.child_count(&["noir".to_string()]), 4);
    }
}
