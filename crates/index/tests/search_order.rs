use memora_index::{HashEmbedder, MemoryIndex, RetrievalIndex};
use proptest::prelude::*;

proptest! {
    #[test]
    fn smaller_breadth_is_a_prefix_of_larger(
        texts in prop::collection::vec("[a-e ]{1,20}", 1..15),
        query in "[a-e ]{1,10}",
        k in 1usize..15,
    ) {
        let index = MemoryIndex::from_texts(HashEmbedder::default(), texts.clone());
        let n = index.len();
        let wide = index.search(&query, n, n).unwrap();
        let narrow = index.search(&query, k, n).unwrap();
        prop_assert_eq!(narrow.len(), k.min(n));
        prop_assert_eq!(&wide[..narrow.len()], &narrow[..]);
        for pair in wide.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}
