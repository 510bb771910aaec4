use std::fs;

use memora_core::{BankFormat, FlashcardBank, MemoraError, AUTHORSHIP_MARKER};
use tempfile::tempdir;

#[test]
fn bank_file_roundtrip_on_disk() {
    let bank = sample_bank();
    let dir = tempdir().unwrap();
    for format in [BankFormat::Plain, BankFormat::Delimited] {
        let path = dir.path().join(format!("{format:?}.txt"));
        fs::write(&path, bank.encode(format)).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().last(), Some(AUTHORSHIP_MARKER));
        let loaded = FlashcardBank::load(&raw).unwrap();
        assert_eq!(loaded, bank);
    }
}

#[test]
fn foreign_file_is_rejected() {
    let raw = "Q: What is ATP?\nA: The energy currency of the cell.\n\nGenerated by someone else";
    let err = FlashcardBank::load(raw).unwrap_err();
    assert!(matches!(err, MemoraError::MalformedBankFile(_)));
}

#[test]
fn model_output_with_noise_parses() {
    let raw = "Here are your flashcards:\n\nQ: What is osmosis?\nA: Diffusion of water across a membrane.\n\
               Some stray continuation line.\n\nQ: What is a solute?\n\nA: A dissolved substance.\n";
    let bank = FlashcardBank::parse(raw);
    assert_eq!(bank.len(), 2);
    assert_eq!(
        bank.answer("What is osmosis?"),
        Some("Diffusion of water across a membrane.")
    );
    assert_eq!(bank.answer("What is a solute?"), Some("A dissolved substance."));
}

fn sample_bank() -> FlashcardBank {
    [
        ("What is ATP?", "The energy currency of the cell."),
        ("Define homeostasis.", "Maintenance of a stable internal environment."),
        ("What does Km measure?", "Substrate concentration at half Vmax."),
    ]
    .into_iter()
    .collect()
}
