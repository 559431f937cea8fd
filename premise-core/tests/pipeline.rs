//! End-to-end pipeline tests over temporary directories with scripted
//! model responses. No test here touches the network.

use premise_core::store;
use premise_core::testing::{numbered_list, MockChat, MockEmbedder};
use premise_core::{
    run_stage, run_synthesis, run_verification, LeafId, ModuleTree, PipelineContext,
    PremiseRecord, Stage, StageOptions,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

fn context(chat: Arc<MockChat>) -> PipelineContext {
    PipelineContext::new(chat, Arc::new(MockEmbedder::new()))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

async fn write_theme_tree(dir: &Path) {
    tokio::fs::write(dir.join("theme.json"), r#"{"fantasy": "t1"}"#)
        .await
        .expect("write theme tree");
}

/// A finished six-level tree with a single leaf.
async fn write_single_leaf_twist_tree(dir: &Path) -> LeafId {
    let parent = strings(&[
        "frontier myth",
        "a dusty rail town",
        "a reluctant marshal",
        "a gold-train heist",
        "the marshal rides on",
    ]);
    let id = LeafId::from("leaf-1");
    let mut tree = ModuleTree::new();
    tree.insert_leaf(&parent, "the heist was a decoy", id.clone())
        .expect("insert twist leaf");
    store::save_tree(&tree, &dir.join("twist.json"))
        .await
        .expect("save twist tree");
    id
}

// =============================================================================
// Expansion driver
// =============================================================================

#[tokio::test]
async fn test_background_stage_end_to_end() {
    let dir = TempDir::new().expect("temp dir");
    write_theme_tree(dir.path()).await;

    let chat = Arc::new(MockChat::new(vec![
        numbered_list(&["a drowned city", "a sky harbor"]),
        numbered_list(&["an iron forest"]),
        numbered_list(&["a salt plain"]),
    ]));
    let ctx = context(chat.clone());
    let options = StageOptions::for_stage(Stage::Background).with_target(2);

    run_stage(&ctx, Stage::Background, dir.path(), &options)
        .await
        .expect("background stage");

    let tree = store::load_tree(&dir.path().join("background.json"))
        .await
        .expect("load output tree");

    let theme_path = strings(&["fantasy"]);
    let keys = tree.child_keys(&theme_path);
    assert_eq!(keys.len(), 2);

    // Every accepted background came from the scripted batches.
    let candidates = [
        "a drowned city",
        "a sky harbor",
        "an iron forest",
        "a salt plain",
    ];
    for key in &keys {
        assert!(candidates.contains(&key.as_str()), "unexpected key {key}");
    }

    // Each child carries its own freshly generated UUID.
    let mut leaf_path = theme_path.clone();
    leaf_path.push(keys[0].clone());
    let first = tree.leaf_id(&leaf_path).expect("first leaf id").clone();
    leaf_path.pop();
    leaf_path.push(keys[1].clone());
    let second = tree.leaf_id(&leaf_path).expect("second leaf id").clone();

    assert_ne!(first, second);
    assert!(Uuid::parse_str(first.as_str()).is_ok());
    assert!(Uuid::parse_str(second.as_str()).is_ok());
}

#[tokio::test]
async fn test_finished_stage_rerun_is_noop() {
    let dir = TempDir::new().expect("temp dir");
    write_theme_tree(dir.path()).await;

    let first_chat = Arc::new(MockChat::new(vec![
        numbered_list(&["a drowned city", "a sky harbor", "an iron forest"]),
        numbered_list(&["a salt plain"]),
        numbered_list(&["a coral cave"]),
    ]));
    let options = StageOptions::for_stage(Stage::Background).with_target(2);
    run_stage(
        &context(first_chat),
        Stage::Background,
        dir.path(),
        &options,
    )
    .await
    .expect("first run");

    let output_path = dir.path().join("background.json");
    let before = tokio::fs::read_to_string(&output_path)
        .await
        .expect("read output");

    // Second run over finished files makes no model calls and changes
    // nothing on disk.
    let second_chat = Arc::new(MockChat::new(Vec::new()));
    run_stage(
        &context(second_chat.clone()),
        Stage::Background,
        dir.path(),
        &options,
    )
    .await
    .expect("second run");

    let after = tokio::fs::read_to_string(&output_path)
        .await
        .expect("read output again");
    assert_eq!(before, after);
    assert_eq!(second_chat.call_count(), 0);
}

#[tokio::test]
async fn test_background_then_persona_chain() {
    let dir = TempDir::new().expect("temp dir");
    write_theme_tree(dir.path()).await;

    let chat = Arc::new(MockChat::new(vec![
        // Background stage: one round of three component prompts.
        numbered_list(&["a drowned city"]),
        numbered_list(&["an iron forest"]),
        numbered_list(&["a salt plain"]),
        // Persona stage: one round of three cast prompts.
        numbered_list(&["a pearl diver turned smuggler"]),
        numbered_list(&["protagonist: a tide priest; antagonist: a dry-land baron"]),
        numbered_list(&["protagonist: a salvage captain; deuteragonist: a mute child"]),
    ]));
    let ctx = context(chat.clone());

    run_stage(
        &ctx,
        Stage::Background,
        dir.path(),
        &StageOptions::for_stage(Stage::Background).with_target(1),
    )
    .await
    .expect("background stage");

    run_stage(
        &ctx,
        Stage::Persona,
        dir.path(),
        &StageOptions::for_stage(Stage::Persona).with_target(1),
    )
    .await
    .expect("persona stage");

    let personas = store::load_tree(&dir.path().join("persona.json"))
        .await
        .expect("load persona tree");
    let entries = personas.leaf_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0.len(), 3);
    assert_eq!(entries[0].0[0], "fantasy");
    assert_eq!(chat.call_count(), 6);
}

// =============================================================================
// Synthesis
// =============================================================================

#[tokio::test]
async fn test_synthesis_single_leaf() {
    let dir = TempDir::new().expect("temp dir");
    let id = write_single_leaf_twist_tree(dir.path()).await;

    let premise_text = "A reluctant marshal in a dusty rail town foils a gold-train heist that turns out to be a decoy.";
    let chat = Arc::new(MockChat::new(vec![premise_text.to_string()]));
    let ctx = context(chat.clone());

    let premise_path = dir.path().join("premise.jsonl");
    let appended = run_synthesis(&ctx, &dir.path().join("twist.json"), &premise_path, &[])
        .await
        .expect("synthesis");
    assert_eq!(appended, 1);

    let records: Vec<PremiseRecord> = store::read_jsonl(&premise_path).await.expect("read log");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id.as_str());
    assert_eq!(records[0].premise, premise_text);
    assert_eq!(records[0].theme, "frontier myth");
    assert_eq!(records[0].twist, "the heist was a decoy");

    // Synthesis is deterministic: temperature 0.0.
    assert_eq!(chat.calls()[0].temperature, 0.0);

    // Rerunning synthesizes nothing new.
    let idle_chat = Arc::new(MockChat::new(Vec::new()));
    let appended = run_synthesis(
        &context(idle_chat.clone()),
        &dir.path().join("twist.json"),
        &premise_path,
        &[],
    )
    .await
    .expect("rerun");
    assert_eq!(appended, 0);
    assert_eq!(idle_chat.call_count(), 0);

    let records: Vec<PremiseRecord> = store::read_jsonl(&premise_path).await.expect("reread log");
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_synthesis_masks_blank_levels() {
    use premise_core::Level;

    let dir = TempDir::new().expect("temp dir");
    write_single_leaf_twist_tree(dir.path()).await;

    let chat = Arc::new(MockChat::new(vec!["A premise without its cast.".to_string()]));
    let ctx = context(chat.clone());

    let premise_path = dir.path().join("premise.jsonl");
    run_synthesis(
        &ctx,
        &dir.path().join("twist.json"),
        &premise_path,
        &[Level::Persona, Level::Twist],
    )
    .await
    .expect("masked synthesis");

    let records: Vec<PremiseRecord> = store::read_jsonl(&premise_path).await.expect("read log");
    assert_eq!(records[0].persona, "");
    assert_eq!(records[0].twist, "");
    assert_eq!(records[0].theme, "frontier myth");
    assert_eq!(records[0].event, "a gold-train heist");

    // The masked values never reach the prompt.
    let prompt = &chat.calls()[0].prompt;
    assert!(!prompt.contains("a reluctant marshal"));
    assert!(!prompt.contains("the heist was a decoy"));
    assert!(prompt.contains("frontier myth"));
}

// =============================================================================
// Verification
// =============================================================================

fn premise_record(id: &str, premise: &str) -> PremiseRecord {
    PremiseRecord {
        id: id.to_string(),
        premise: premise.to_string(),
        theme: "frontier myth".to_string(),
        background: "a dusty rail town".to_string(),
        persona: "a reluctant marshal".to_string(),
        event: "a gold-train heist".to_string(),
        ending: "the marshal rides on".to_string(),
        twist: "the heist was a decoy".to_string(),
    }
}

#[tokio::test]
async fn test_verification_drops_flagged_records() {
    let dir = TempDir::new().expect("temp dir");
    let premise_path = dir.path().join("premise.jsonl");
    let verified_path = dir.path().join("verified_premise.jsonl");

    let flagged = premise_record("p1", "A medieval knight checks his wristwatch.");
    let clean = premise_record("p2", "A marshal guards a rail town.");
    store::append_jsonl(&premise_path, &flagged)
        .await
        .expect("append p1");
    store::append_jsonl(&premise_path, &clean)
        .await
        .expect("append p2");

    let chat = Arc::new(MockChat::new(vec![
        "[[Yes]] The premise contains an anachronism.".to_string(),
        "[[No]]".to_string(),
    ]));
    let (kept, dropped) = run_verification(&context(chat), &premise_path, &verified_path)
        .await
        .expect("verification");

    assert_eq!((kept, dropped), (1, 1));

    let verified: Vec<PremiseRecord> = store::read_jsonl(&verified_path)
        .await
        .expect("read verified");
    assert_eq!(verified, vec![clean]);
}

#[tokio::test]
async fn test_verification_missing_verdict_passes() {
    let dir = TempDir::new().expect("temp dir");
    let premise_path = dir.path().join("premise.jsonl");
    let verified_path = dir.path().join("verified_premise.jsonl");

    let record = premise_record("p1", "A marshal guards a rail town.");
    store::append_jsonl(&premise_path, &record)
        .await
        .expect("append");

    let chat = Arc::new(MockChat::new(vec![
        "I could not reach a judgment.".to_string()
    ]));
    let (kept, dropped) = run_verification(&context(chat), &premise_path, &verified_path)
        .await
        .expect("verification");

    assert_eq!((kept, dropped), (1, 0));
    let verified: Vec<PremiseRecord> = store::read_jsonl(&verified_path)
        .await
        .expect("read verified");
    assert_eq!(verified, vec![record]);
}

#[tokio::test]
async fn test_verification_rerun_skips_already_verified() {
    let dir = TempDir::new().expect("temp dir");
    let premise_path = dir.path().join("premise.jsonl");
    let verified_path = dir.path().join("verified_premise.jsonl");

    let first = premise_record("p1", "First premise.");
    let second = premise_record("p2", "Second premise.");
    store::append_jsonl(&premise_path, &first)
        .await
        .expect("append p1");
    store::append_jsonl(&premise_path, &second)
        .await
        .expect("append p2");

    let chat = Arc::new(MockChat::new(vec!["[[No]]".to_string(), "[[No]]".to_string()]));
    run_verification(&context(chat), &premise_path, &verified_path)
        .await
        .expect("first verification");

    // Both records are already verified; the rerun makes no model calls.
    let idle_chat = Arc::new(MockChat::new(Vec::new()));
    let (kept, dropped) = run_verification(&context(idle_chat.clone()), &premise_path, &verified_path)
        .await
        .expect("rerun");

    assert_eq!((kept, dropped), (0, 0));
    assert_eq!(idle_chat.call_count(), 0);

    let verified: Vec<PremiseRecord> = store::read_jsonl(&verified_path)
        .await
        .expect("read verified");
    assert_eq!(verified.len(), 2);
}
