//! Story premise induction engine.
//!
//! This crate provides:
//! - A six-level story-element tree (theme → background → persona →
//!   event → ending → twist) persisted as nested JSON
//! - A resumable expansion driver that grows each level to a target
//!   population, deduplicating near-identical siblings by embedding
//!   similarity
//! - A synthesis pass that turns finished leaf paths into one-sentence
//!   story premises, with an optional model verification pass
//!
//! # Quick Start
//!
//! ```ignore
//! use premise_core::{run_stage, PipelineContext, Stage, StageOptions};
//!
//! #[tokio::main]
//! async fn main() -> premise_core::Result<()> {
//!     let ctx = PipelineContext::from_env()?;
//!     let options = StageOptions::for_stage(Stage::Background);
//!     run_stage(&ctx, Stage::Background, "data/modules".as_ref(), &options).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dedup;
pub mod error;
pub mod expand;
pub mod generate;
pub mod level;
pub mod prompts;
pub mod store;
pub mod synthesize;
pub mod testing;
pub mod tree;

// Primary public API
pub use client::{ChatClient, Embedder, PipelineContext};
pub use error::{Error, Result};
pub use expand::{run_stage, StageOptions, DEFAULT_MAX_ROUNDS};
pub use level::{Level, Stage};
pub use synthesize::{run_synthesis, run_verification, PremiseRecord};
pub use tree::{KeyPath, LeafId, ModuleTree, Node};
