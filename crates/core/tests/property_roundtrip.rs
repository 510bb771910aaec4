use memora_core::{default_separators, split_text, FlashcardBank};
use proptest::prelude::*;

proptest! {
    #[test]
    fn split_reconstructs_the_input(
        text in "[a-z ,\n]{0,400}",
        max_size in 3usize..60,
        overlap_seed in 0usize..30,
    ) {
        let overlap = overlap_seed % ((max_size - 1) / 2 + 1);
        prop_assume!(max_size >= 2 * overlap + 1);
        let chunks = split_text(&text, max_size, overlap, &default_separators()).unwrap();
        prop_assert_eq!(chunks.is_empty(), text.is_empty());
        let mut rebuilt = String::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            prop_assert!(!chunk.is_empty());
            prop_assert!(chunk.chars().count() <= max_size);
            if idx == 0 {
                rebuilt.push_str(chunk);
            } else {
                rebuilt.extend(chunk.chars().skip(overlap));
            }
        }
        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn delimited_encoding_round_trips(cards in card_list()) {
        let bank: FlashcardBank = cards
            .iter()
            .map(|(q, a)| (q.as_str(), a.as_str()))
            .collect();
        prop_assume!(!bank.is_empty());
        let decoded = FlashcardBank::load(&bank.to_delimited()).unwrap();
        prop_assert_eq!(&decoded, &bank);
        let order: Vec<_> = decoded.iter().map(|(q, _)| q.to_string()).collect();
        let expected: Vec<_> = bank.iter().map(|(q, _)| q.to_string()).collect();
        prop_assert_eq!(order, expected);
    }

    #[test]
    fn plain_encoding_round_trips(cards in card_list()) {
        let bank: FlashcardBank = cards
            .iter()
            .map(|(q, a)| (q.as_str(), a.as_str()))
            .collect();
        prop_assume!(!bank.is_empty());
        prop_assert_eq!(FlashcardBank::load(&bank.to_plain()).unwrap(), bank);
    }
}

fn card_list() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((field(), field()), 1..12)
}

// Trimmed, single-line text; colons, `::` runs and leading tags included.
fn field() -> impl Strategy<Value = String> {
    "([QA]:)?[a-z0-9][a-z0-9 ?.,():-]{0,30}[a-z0-9?.:]"
}
