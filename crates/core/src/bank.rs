use indexmap::IndexMap;
use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MemoraError, Result};

/// Last line of every bank file written by this crate.
pub const AUTHORSHIP_MARKER: &str = "Generated by Memora - Study Wise";

const QUESTION_PREFIX: &str = "Q:";
const ANSWER_PREFIX: &str = "A:";
const DELIMITER: &str = "::";
const QUESTION_COLUMN: usize = 80;
const RULE_WIDTH: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankFormat {
    /// `Q: ...` / `A: ...` pairs separated by blank lines.
    #[default]
    Plain,
    /// Anki-friendly `question :: answer` rows.
    Delimited,
}

/// Ordered question → answer mapping.
///
/// A question that shows up twice keeps the position of its first
/// appearance and takes the answer of its last one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardBank {
    cards: IndexMap<String, String>,
}

enum Pending {
    NoPending,
    HaveQuestion(String),
    HavePair(String, String),
}

impl FlashcardBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse either encoding (or a mix of both, line by line).
    ///
    /// No provenance check happens here; see [`FlashcardBank::load`].
    pub fn parse(input: &str) -> Self {
        let mut bank = Self::new();
        let mut pending = Pending::NoPending;
        let mut seen_content = false;
        for raw_line in input.lines() {
            let line = raw_line.trim_start();
            if line.trim().is_empty() {
                continue;
            }
            let first_content = !seen_content;
            seen_content = true;
            if let Some(rest) = line.strip_prefix(QUESTION_PREFIX) {
                bank.flush(&mut pending);
                let question = rest.trim();
                if !question.is_empty() {
                    pending = Pending::HaveQuestion(question.to_string());
                }
            } else if let Some(rest) = line.strip_prefix(ANSWER_PREFIX) {
                let answer = rest.trim();
                if answer.is_empty() {
                    continue;
                }
                pending = match std::mem::replace(&mut pending, Pending::NoPending) {
                    Pending::HaveQuestion(question) => {
                        Pending::HavePair(question, answer.to_string())
                    }
                    other => other,
                };
            } else if let Some((question, answer)) = line.split_once(DELIMITER) {
                bank.flush(&mut pending);
                let (question, answer) = (question.trim(), answer.trim());
                if first_content && question == "Question" && answer == "Answer" {
                    continue;
                }
                bank.insert(question, answer);
            }
        }
        bank.flush(&mut pending);
        bank
    }

    /// Parse a bank file, rejecting anything whose last line is not the
    /// authorship marker.
    pub fn load(input: &str) -> Result<Self> {
        match input.lines().last() {
            Some(line) if line == AUTHORSHIP_MARKER => Ok(Self::parse(input)),
            Some(_) => Err(MemoraError::MalformedBankFile(
                "the file was not generated by Memora - Study Wise".to_string(),
            )),
            None => Err(MemoraError::MalformedBankFile("the file is empty".to_string())),
        }
    }

    fn flush(&mut self, pending: &mut Pending) {
        if let Pending::HavePair(question, answer) = std::mem::replace(pending, Pending::NoPending)
        {
            self.insert(&question, &answer);
        }
    }

    /// Insert a card; empty questions or answers are ignored.
    pub fn insert(&mut self, question: &str, answer: &str) -> bool {
        if question.is_empty() || answer.is_empty() {
            return false;
        }
        self.cards.insert(question.to_string(), answer.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(&str, &str)> {
        self.cards
            .get_index(index)
            .map(|(q, a)| (q.as_str(), a.as_str()))
    }

    pub fn answer(&self, question: &str) -> Option<&str> {
        self.cards.get(question).map(String::as_str)
    }

    /// 1-based lookup that wraps around past the last card, the way the
    /// quiz "next" button does.
    pub fn card(&self, number: usize) -> Option<(&str, &str)> {
        if self.cards.is_empty() {
            return None;
        }
        let index = number.saturating_sub(1) % self.cards.len();
        self.get(index)
    }

    pub fn random_card<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(&str, &str)> {
        self.iter().choose(rng)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cards.iter().map(|(q, a)| (q.as_str(), a.as_str()))
    }

    pub fn encode(&self, format: BankFormat) -> String {
        match format {
            BankFormat::Plain => self.to_plain(),
            BankFormat::Delimited => self.to_delimited(),
        }
    }

    /// `question :: answer` rows under a header and a rule.
    ///
    /// A question that a row cannot carry (one holding `::`, ending in `:`
    /// or opening with a `Q:`/`A:` tag) is written as a tagged pair instead,
    /// which [`FlashcardBank::parse`] reads back unchanged.
    pub fn to_delimited(&self) -> String {
        let mut out = format!("{:<width$}{DELIMITER}Answer\n", "Question", width = QUESTION_COLUMN);
        out.push_str(&"-".repeat(RULE_WIDTH));
        out.push('\n');
        for (question, answer) in self.iter() {
            let (question, answer) = (single_line(question), single_line(answer));
            if fits_delimited_row(&question) {
                out.push_str(&format!(
                    "{question:<width$}{DELIMITER}{answer}\n",
                    width = QUESTION_COLUMN
                ));
            } else {
                debug!(question = %question, "question kept as a tagged pair");
                out.push_str(&format!("{QUESTION_PREFIX} {question}\n{ANSWER_PREFIX} {answer}\n"));
            }
        }
        out.push('\n');
        out.push_str(AUTHORSHIP_MARKER);
        out
    }

    pub fn to_plain(&self) -> String {
        let body = self
            .iter()
            .map(|(q, a)| format!("Q: {}\nA: {}", single_line(q), single_line(a)))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("{body}\n\n{AUTHORSHIP_MARKER}")
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for FlashcardBank {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut bank = Self::new();
        for (question, answer) in iter {
            bank.insert(question, answer);
        }
        bank
    }
}

fn fits_delimited_row(question: &str) -> bool {
    let head = question.trim_start();
    !(question.contains(DELIMITER)
        || question.ends_with(':')
        || head.starts_with(QUESTION_PREFIX)
        || head.starts_with(ANSWER_PREFIX))
}

fn single_line(text: &str) -> String {
    if text.contains(['\n', '\r']) {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        text.to_string()
    }
}
