//! Command line entry points for the premise pipeline.
//!
//! `premise induce` grows one tree level to its target population;
//! `premise synthesize` turns the finished twist tree into a premise
//! log, optionally verified by a second model pass.

use clap::{Parser, Subcommand, ValueEnum};
use premise_core::{
    run_stage, run_synthesis, run_verification, Level, PipelineContext, Stage, StageOptions,
    DEFAULT_MAX_ROUNDS,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "premise",
    about = "Grow story-element trees and synthesize story premises"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grow one level of the story-element tree to its target population.
    Induce {
        /// Directory holding the per-level tree files.
        #[arg(long)]
        module_dir: PathBuf,

        /// Which level to generate.
        #[arg(long, value_enum)]
        step: StepArg,

        #[arg(long, default_value_t = 30)]
        max_backgrounds_per_theme: usize,

        #[arg(long, default_value_t = 9)]
        max_personas_per_background: usize,

        #[arg(long, default_value_t = 2)]
        max_events_per_persona: usize,

        #[arg(long, default_value_t = 1)]
        max_endings_per_event: usize,

        #[arg(long, default_value_t = 1)]
        max_twists_per_ending: usize,

        /// Generation rounds allowed per parent before giving up.
        #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
        max_rounds_per_parent: usize,
    },

    /// Synthesize premises from the finished twist tree.
    Synthesize {
        /// Directory holding the per-level tree files.
        #[arg(long)]
        module_dir: PathBuf,

        /// Directory for the premise logs.
        #[arg(long)]
        premise_dir: PathBuf,

        /// Run the model verification pass over synthesized premises.
        #[arg(long)]
        enable_verify: bool,

        /// Levels to blank before synthesis (e.g. persona,twist).
        #[arg(long, value_enum, value_delimiter = ',')]
        masks: Vec<MaskArg>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StepArg {
    Background,
    Persona,
    Event,
    Ending,
    Twist,
}

impl From<StepArg> for Stage {
    fn from(step: StepArg) -> Self {
        match step {
            StepArg::Background => Stage::Background,
            StepArg::Persona => Stage::Persona,
            StepArg::Event => Stage::Event,
            StepArg::Ending => Stage::Ending,
            StepArg::Twist => Stage::Twist,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MaskArg {
    Theme,
    Background,
    Persona,
    Event,
    Ending,
    Twist,
}

impl From<MaskArg> for Level {
    fn from(mask: MaskArg) -> Self {
        match mask {
            MaskArg::Theme => Level::Theme,
            MaskArg::Background => Level::Background,
            MaskArg::Persona => Level::Persona,
            MaskArg::Event => Level::Event,
            MaskArg::Ending => Level::Ending,
            MaskArg::Twist => Level::Twist,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        log::error!("{err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> premise_core::Result<()> {
    let ctx = PipelineContext::from_env()?;

    match cli.command {
        Command::Induce {
            module_dir,
            step,
            max_backgrounds_per_theme,
            max_personas_per_background,
            max_events_per_persona,
            max_endings_per_event,
            max_twists_per_ending,
            max_rounds_per_parent,
        } => {
            let stage = Stage::from(step);
            let target = match stage {
                Stage::Background => max_backgrounds_per_theme,
                Stage::Persona => max_personas_per_background,
                Stage::Event => max_events_per_persona,
                Stage::Ending => max_endings_per_event,
                Stage::Twist => max_twists_per_ending,
            };
            let options = StageOptions::for_stage(stage)
                .with_target(target)
                .with_max_rounds(max_rounds_per_parent);
            run_stage(&ctx, stage, &module_dir, &options).await
        }

        Command::Synthesize {
            module_dir,
            premise_dir,
            enable_verify,
            masks,
        } => {
            let masks: Vec<Level> = masks.into_iter().map(Level::from).collect();
            let tree_path = module_dir.join(Stage::Twist.output_file());
            let premise_path = premise_dir.join("premise.jsonl");

            let appended = run_synthesis(&ctx, &tree_path, &premise_path, &masks).await?;
            log::info!("Synthesized {appended} new premises");

            if enable_verify {
                let verified_path = premise_dir.join("verified_premise.jsonl");
                let (kept, dropped) =
                    run_verification(&ctx, &premise_path, &verified_path).await?;
                log::info!("Verification kept {kept} premises, dropped {dropped}");
            }
            Ok(())
        }
    }
}
