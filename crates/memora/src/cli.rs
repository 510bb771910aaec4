use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "memora", about = "Memora - Study Wise: flashcards and answers from your lecture notes")]
pub struct Cli {
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    /// TOML file with settings; environment variables override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub model: Option<String>,
    /// `openai` or `local`.
    #[arg(long, global = true)]
    pub provider: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Turn documents into a flashcard bank file.
    Generate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        subject: String,
        /// Write `question :: answer` rows instead of `Q:`/`A:` pairs.
        #[arg(long, default_value_t = false)]
        anki: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Answer a question from the documents.
    Ask {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        question: String,
        /// Rewrite the answer with more detail (1-10).
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
        detail: Option<u8>,
        #[arg(long, default_value_t = false)]
        show_sources: bool,
    },
    /// Show a card from a bank file.
    Quiz {
        bank: PathBuf,
        /// 1-based card number; wraps past the end.
        #[arg(long, conflicts_with = "random")]
        number: Option<usize>,
        #[arg(long, default_value_t = false)]
        random: bool,
        #[arg(long, default_value_t = false)]
        explain: bool,
        /// Question to address while explaining.
        #[arg(long, requires = "explain")]
        ask: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_with_globals() {
        let cli = Cli::try_parse_from([
            "memora",
            "generate",
            "a.pdf",
            "b.docx",
            "--subject",
            "biology",
            "--anki",
            "--provider",
            "local",
        ])
        .unwrap();
        assert_eq!(cli.provider.as_deref(), Some("local"));
        match cli.command {
            Command::Generate {
                files,
                subject,
                anki,
                output,
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(subject, "biology");
                assert!(anki);
                assert!(output.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn detail_must_be_in_range() {
        assert!(Cli::try_parse_from([
            "memora", "ask", "a.txt", "--question", "why?", "--detail", "11"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "memora", "ask", "a.txt", "--question", "why?", "--detail", "10"
        ])
        .is_ok());
    }

    #[test]
    fn quiz_flags_are_checked() {
        assert!(Cli::try_parse_from(["memora", "quiz", "bank.txt", "--number", "2", "--random"])
            .is_err());
        assert!(Cli::try_parse_from(["memora", "quiz", "bank.txt", "--ask", "why?"]).is_err());
        assert!(Cli::try_parse_from(["memora", "quiz", "bank.txt", "--explain", "--ask", "why?"])
            .is_ok());
    }
}
