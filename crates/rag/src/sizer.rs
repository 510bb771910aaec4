//! Picks how many passages to retrieve so the context fits a token budget.
//!
//! Breadth grows sublinearly with the index size as `k = round(N^speed)`.
//! When the joined passages come out too long, `speed` is lowered in `step`s
//! until they fit or `speed` runs out. Steps that would land on a breadth
//! that already failed are skipped in one jump, so a tiny `step` costs no
//! more searches than a coarse one.

use memora_core::{MemoraError, Result, TokenEncoder};
use memora_index::{Passage, RetrievalIndex};
use tracing::{debug, info};

pub const DEFAULT_TOKEN_LIMIT: usize = 2000;
pub const DEFAULT_INITIAL_SPEED: f64 = 0.52;
pub const DEFAULT_SPEED_STEP: f64 = 0.025;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizerOptions {
    /// Accepted contexts count strictly fewer tokens than this.
    pub token_limit: usize,
    pub initial_speed: f64,
    pub step: f64,
}

impl Default for SizerOptions {
    fn default() -> Self {
        Self {
            token_limit: DEFAULT_TOKEN_LIMIT,
            initial_speed: DEFAULT_INITIAL_SPEED,
            step: DEFAULT_SPEED_STEP,
        }
    }
}

impl SizerOptions {
    pub fn validate(&self) -> Result<()> {
        if self.token_limit == 0 {
            return Err(MemoraError::InvalidConfig(
                "token limit must be positive".to_string(),
            ));
        }
        if !(self.initial_speed.is_finite() && self.initial_speed > 0.0) {
            return Err(MemoraError::InvalidConfig(format!(
                "initial speed must be positive, got {}",
                self.initial_speed
            )));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(MemoraError::InvalidConfig(format!(
                "speed step must be positive, got {}",
                self.step
            )));
        }
        if self.initial_speed - self.step == self.initial_speed {
            return Err(MemoraError::InvalidConfig(format!(
                "speed step {} is too small to lower initial speed {}",
                self.step, self.initial_speed
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizedRetrieval {
    pub k: usize,
    pub fetch_k: usize,
    pub speed: f64,
    pub token_count: usize,
    pub passages: Vec<Passage>,
    /// Searches issued, the accepted one included.
    pub attempts: usize,
}

/// `round(n^speed)` clamped to `[1, n]`; 0 for an empty index.
pub fn breadth_for(n: usize, speed: f64) -> usize {
    if n == 0 {
        return 0;
    }
    let k = (n as f64).powf(speed).round();
    if k.is_nan() || k < 1.0 {
        1
    } else {
        (k as usize).min(n)
    }
}

pub fn size_retrieval<I, T>(
    index: &I,
    encoder: &T,
    query: &str,
    options: &SizerOptions,
) -> Result<SizedRetrieval>
where
    I: RetrievalIndex + ?Sized,
    T: TokenEncoder + ?Sized,
{
    options.validate()?;
    let n = index.len();
    let unsatisfiable = |attempts| MemoraError::RetrievalUnsatisfiable {
        token_limit: options.token_limit,
        index_size: n,
        attempts,
    };
    if n == 0 {
        return Err(unsatisfiable(0));
    }
    let mut attempts = 0usize;
    let mut round = 0u64;
    loop {
        let speed = speed_at(options, round);
        if speed <= 0.0 {
            break;
        }
        let k = breadth_for(n, speed);
        attempts += 1;
        let passages = index.search(query, k, n)?;
        let joined = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let token_count = encoder.count(&joined);
        debug!(
            attempt = attempts,
            speed,
            k,
            token_count,
            token_limit = options.token_limit,
            "retrieval sizing attempt"
        );
        if token_count < options.token_limit {
            info!(k, index_size = n, token_count, "retrieval breadth selected");
            return Ok(SizedRetrieval {
                k,
                fetch_k: n,
                speed,
                token_count,
                passages,
                attempts,
            });
        }
        match next_round(n, k, round, options) {
            Some(next) => round = next,
            None => break,
        }
    }
    Err(unsatisfiable(attempts))
}

fn speed_at(options: &SizerOptions, round: u64) -> f64 {
    options.initial_speed - round as f64 * options.step
}

/// First round after `round` whose breadth is below `failed`, or whose speed
/// is no longer positive. `None` once no smaller breadth is reachable.
fn next_round(n: usize, failed: usize, round: u64, options: &SizerOptions) -> Option<u64> {
    if failed <= 1 {
        return None;
    }
    // breadth_for(n, s) < failed exactly when n^s < failed - 0.5
    let threshold = (failed as f64 - 0.5).ln() / (n as f64).ln();
    let gap = ((options.initial_speed - threshold) / options.step).ceil();
    let mut next = if gap.is_finite() && gap > round as f64 {
        gap as u64
    } else {
        round + 1
    };
    let mut bump = 1u64;
    for _ in 0..u64::BITS {
        let speed = speed_at(options, next);
        if speed <= 0.0 || breadth_for(n, speed) < failed {
            return Some(next);
        }
        next = next.checked_add(bump)?;
        bump = bump.saturating_mul(2);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedIndex(Vec<String>);

    impl RetrievalIndex for FixedIndex {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn search(&self, _query: &str, k: usize, _fetch_k: usize) -> Result<Vec<Passage>> {
            Ok(self
                .0
                .iter()
                .take(k)
                .enumerate()
                .map(|(id, text)| Passage {
                    id,
                    text: text.clone(),
                    score: 1.0 - id as f32 / 100.0,
                })
                .collect())
        }
    }

    struct WordCount;

    impl TokenEncoder for WordCount {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    struct AlwaysOver;

    impl TokenEncoder for AlwaysOver {
        fn count(&self, _text: &str) -> usize {
            usize::MAX
        }
    }

    fn passages(n: usize, words_each: usize) -> FixedIndex {
        FixedIndex((0..n).map(|i| format!("p{i} ").repeat(words_each)).collect())
    }

    #[test]
    fn breadth_is_monotone_in_speed() {
        for n in [1usize, 2, 10, 100, 1000, 12_345] {
            let mut previous = 0;
            for step in 0..=100 {
                let k = breadth_for(n, step as f64 / 100.0);
                assert!((1..=n).contains(&k));
                assert!(k >= previous);
                previous = k;
            }
        }
        assert_eq!(breadth_for(0, 0.5), 0);
        assert_eq!(breadth_for(100, 0.52), 11);
    }

    #[test]
    fn first_breadth_accepted_when_it_fits() {
        let index = passages(100, 10);
        let sized = size_retrieval(&index, &WordCount, "q", &SizerOptions::default()).unwrap();
        assert_eq!(sized.k, 11);
        assert_eq!(sized.fetch_k, 100);
        assert_eq!(sized.attempts, 1);
        assert_eq!(sized.passages.len(), 11);
        assert_eq!(sized.token_count, 110);
    }

    #[test]
    fn shrinks_until_under_budget() {
        let index = passages(100, 10);
        let options = SizerOptions {
            token_limit: 50,
            ..SizerOptions::default()
        };
        let sized = size_retrieval(&index, &WordCount, "q", &options).unwrap();
        assert!(sized.token_count < 50);
        assert!(sized.k < 11);
        assert_eq!(sized.passages.len(), sized.k);
        assert!(sized.attempts > 1);
        assert!(sized.speed < DEFAULT_INITIAL_SPEED);
    }

    #[test]
    fn gives_up_when_nothing_fits() {
        let index = passages(50, 1);
        let err = size_retrieval(&index, &AlwaysOver, "q", &SizerOptions::default()).unwrap_err();
        match err {
            MemoraError::RetrievalUnsatisfiable {
                attempts,
                index_size,
                ..
            } => {
                assert_eq!(index_size, 50);
                assert!(attempts >= 1);
                assert!(attempts <= 21);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn repeated_breadths_are_searched_once() {
        let index = passages(3, 1);
        let err = size_retrieval(&index, &AlwaysOver, "q", &SizerOptions::default()).unwrap_err();
        // 3^speed rounds to 2 and then 1 as speed falls
        assert!(matches!(
            err,
            MemoraError::RetrievalUnsatisfiable { attempts: 2, .. }
        ));
    }

    #[test]
    fn tiny_step_skips_straight_to_the_next_breadth() {
        let index = passages(3, 1);
        let options = SizerOptions {
            step: 1e-12,
            ..SizerOptions::default()
        };
        let err = size_retrieval(&index, &AlwaysOver, "q", &options).unwrap_err();
        assert!(matches!(
            err,
            MemoraError::RetrievalUnsatisfiable { attempts: 2, .. }
        ));

        // 11 passages at speed 0.52, then one breadth less per search until 4 fit
        let index = passages(100, 10);
        let options = SizerOptions {
            token_limit: 50,
            step: 1e-9,
            ..SizerOptions::default()
        };
        let sized = size_retrieval(&index, &WordCount, "q", &options).unwrap();
        assert_eq!(sized.k, 4);
        assert_eq!(sized.token_count, 40);
        assert_eq!(sized.attempts, 8);
    }

    #[test]
    fn rejects_a_step_that_cannot_move_the_speed() {
        let options = SizerOptions {
            step: 1e-18,
            ..SizerOptions::default()
        };
        assert!(matches!(
            size_retrieval(&passages(3, 1), &AlwaysOver, "q", &options),
            Err(MemoraError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_index_is_unsatisfiable() {
        let err = size_retrieval(
            &FixedIndex(Vec::new()),
            &WordCount,
            "q",
            &SizerOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MemoraError::RetrievalUnsatisfiable { attempts: 0, .. }
        ));
    }

    #[test]
    fn rejects_bad_options() {
        let index = passages(5, 1);
        for options in [
            SizerOptions {
                token_limit: 0,
                ..SizerOptions::default()
            },
            SizerOptions {
                initial_speed: 0.0,
                ..SizerOptions::default()
            },
            SizerOptions {
                step: -0.1,
                ..SizerOptions::default()
            },
        ] {
            assert!(matches!(
                size_retrieval(&index, &WordCount, "q", &options),
                Err(MemoraError::InvalidConfig(_))
            ));
        }
    }
}
