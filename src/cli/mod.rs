// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
// Two commands are supported:
//   1. `forward`   - runs the tagger over a CoNLL-U file and
//                    prints the logits shape of every batch
//   2. `configure` - validates model and optimiser settings,
//                    optionally saving them as JSON
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ConfigureArgs, ForwardArgs};

#[derive(Parser, Debug)]
#[command(
    name = "morphotag",
    version = "0.1.0",
    about = "Encoder-based morphological tagger: POS tags, lemma edit classes and features."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case; printing happens here only.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Forward(args)   => run_forward(args),
            Commands::Configure(args) => run_configure(args),
        }
    }
}

fn run_forward(args: ForwardArgs) -> Result<()> {
    use crate::application::forward_use_case::ForwardUseCase;

    tracing::info!("Running forward passes over '{}'", args.input.display());
    let summary = ForwardUseCase::new(args.try_into()?).execute()?;

    println!(
        "{} sentences, {} words, vocabulary {}",
        summary.sentences, summary.words, summary.vocab_size
    );
    println!("Tagset sizes: {:?}", summary.tagset_sizes);
    for (i, batch) in summary.batches.iter().enumerate() {
        let shapes: Vec<String> = batch
            .logits
            .iter()
            .map(|(task, dims)| format!("{task}={dims:?}"))
            .collect();
        println!(
            "batch {:>4}: {} sentences, {} subwords, {} words | {}",
            i, batch.sentences, batch.subwords, batch.max_words, shapes.join(" ")
        );
    }
    Ok(())
}

fn run_configure(args: ConfigureArgs) -> Result<()> {
    use crate::application::configure_use_case::ConfigureUseCase;

    let report = ConfigureUseCase::new(args.model.try_into()?, args.save_dir).execute()?;

    println!("encoder:    {}", report.encoder);
    println!("classifier: {}", report.classifier);
    if let Some(path) = report.saved_to {
        println!("Config saved to '{}'", path.display());
    }
    Ok(())
}
