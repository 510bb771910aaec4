use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    // a second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if verbose {
        tracing::debug!("verbose logging enabled");
    }
}

pub fn stage(stage: &str, message: impl AsRef<str>) {
    info!(stage, "{}", message.as_ref());
}

pub fn env_flag() -> bool {
    env::var("MEMORA_VERBOSE")
        .map(|value| parse_bool(&value))
        .unwrap_or(false)
}

pub(crate) fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_truthy_spellings() {
        for raw in ["1", "true", " YES ", "On"] {
            assert!(parse_bool(raw), "{raw}");
        }
        for raw in ["", "0", "off", "nope"] {
            assert!(!parse_bool(raw), "{raw}");
        }
    }
}
