mod ask;
mod cli;
mod config;
mod logging;
mod quiz;
mod tasks;

use anyhow::{Context, Result};
use clap::Parser;
use memora_core::{FileExtractor, TiktokenCounter};
use memora_llm::LlmClient;
use tokio::runtime::Runtime;

use crate::cli::{Cli, Command};
use crate::config::MemoraConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = if cli.verbose {
        true
    } else {
        logging::env_flag()
    };
    logging::init(verbose);
    let mut config = MemoraConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.provider.as_deref(), cli.model.as_deref())?;
    config.validate()?;
    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    match cli.command {
        Command::Generate {
            files,
            subject,
            anki,
            output,
        } => {
            let client = build_client(&config)?;
            let args = tasks::GenerateArgs {
                files,
                subject,
                anki,
                output,
            };
            let generated =
                runtime.block_on(tasks::generate_bank(&client, &FileExtractor, &args, &config))?;
            println!(
                "{} flashcards from {} chunk(s) saved to {}",
                generated.cards,
                generated.chunks,
                generated.path.display()
            );
            if generated.failed_chunks > 0 || generated.skipped_documents > 0 {
                println!(
                    "{} chunk(s) failed and {} document(s) were skipped; see the log for details",
                    generated.failed_chunks, generated.skipped_documents
                );
            }
        }
        Command::Ask {
            files,
            question,
            detail,
            show_sources,
        } => {
            let client = build_client(&config)?;
            let encoder = TiktokenCounter::new(config.tokenizer)?;
            let args = ask::AskArgs {
                files,
                question,
                detail,
                show_sources,
            };
            let outcome = runtime.block_on(ask::ask(
                &client,
                &FileExtractor,
                &encoder,
                &args,
                &config,
            ))?;
            print!("{}", ask::render(&outcome, args.show_sources));
        }
        Command::Quiz {
            bank,
            number,
            random,
            explain,
            ask,
        } => {
            let bank = quiz::load_bank(&bank)?;
            let choice = if random {
                quiz::CardChoice::Random
            } else {
                quiz::CardChoice::Number(number.unwrap_or(1))
            };
            let (question, answer) = quiz::pick(&bank, choice, &mut rand::thread_rng())?;
            println!("Q: {question}\nA: {answer}");
            if explain {
                let client = build_client(&config)?;
                let explanation =
                    runtime.block_on(quiz::explain_card(&client, answer, ask.as_deref()))?;
                println!("\n{explanation}");
            }
        }
    }
    Ok(())
}

fn build_client(config: &MemoraConfig) -> Result<LlmClient> {
    LlmClient::new(config.provider, config.model.clone(), config.timeout())
        .context("failed to set up the language model client")
}
