use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use memora_core::{
    default_separators, BatchOptions, SplitterConfig, TokenizerKind, DEFAULT_CHUNK_OVERLAP,
    DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY_LIMIT,
};
use memora_llm::LlmProvider;
use memora_rag::{SizerOptions, DEFAULT_INITIAL_SPEED, DEFAULT_SPEED_STEP, DEFAULT_TOKEN_LIMIT};
use serde::Deserialize;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SETTLE_MS: u64 = 2000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct MemoraConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub token_limit: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub concurrency: usize,
    pub settle_ms: u64,
    pub timeout_secs: u64,
    pub tokenizer: TokenizerKind,
    pub initial_speed: f64,
    pub speed_step: f64,
}

impl Default for MemoraConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: DEFAULT_MODEL.to_string(),
            token_limit: DEFAULT_TOKEN_LIMIT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            concurrency: DEFAULT_CONCURRENCY_LIMIT,
            settle_ms: DEFAULT_SETTLE_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            tokenizer: TokenizerKind::default(),
            initial_speed: DEFAULT_INITIAL_SPEED,
            speed_step: DEFAULT_SPEED_STEP,
        }
    }
}

/// Optional keys of a `memora.toml` file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    provider: Option<String>,
    model: Option<String>,
    token_limit: Option<usize>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    concurrency: Option<usize>,
    settle_ms: Option<u64>,
    timeout_secs: Option<u64>,
    tokenizer: Option<String>,
    initial_speed: Option<f64>,
    speed_step: Option<f64>,
}

impl MemoraConfig {
    /// Defaults, then the TOML file at `path`, then `MEMORA_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = path {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            config.apply_toml(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?;
        }
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    fn apply_toml(&mut self, raw: &str) -> Result<()> {
        let file: FileConfig = toml::from_str(raw)?;
        if let Some(provider) = file.provider {
            self.provider = parse_provider(&provider)?;
        }
        if let Some(tokenizer) = file.tokenizer {
            self.tokenizer = parse_tokenizer(&tokenizer)?;
        }
        set(&mut self.model, file.model);
        set(&mut self.token_limit, file.token_limit);
        set(&mut self.chunk_size, file.chunk_size);
        set(&mut self.chunk_overlap, file.chunk_overlap);
        set(&mut self.concurrency, file.concurrency);
        set(&mut self.settle_ms, file.settle_ms);
        set(&mut self.timeout_secs, file.timeout_secs);
        set(&mut self.initial_speed, file.initial_speed);
        set(&mut self.speed_step, file.speed_step);
        Ok(())
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(provider) = lookup("MEMORA_PROVIDER") {
            self.provider = parse_provider(&provider)?;
        }
        if let Some(model) = lookup("MEMORA_MODEL") {
            self.model = model;
        }
        if let Some(tokenizer) = lookup("MEMORA_TOKENIZER") {
            self.tokenizer = parse_tokenizer(&tokenizer)?;
        }
        parse_into(&lookup, "MEMORA_TOKEN_LIMIT", &mut self.token_limit)?;
        parse_into(&lookup, "MEMORA_CHUNK_SIZE", &mut self.chunk_size)?;
        parse_into(&lookup, "MEMORA_CHUNK_OVERLAP", &mut self.chunk_overlap)?;
        parse_into(&lookup, "MEMORA_CONCURRENCY", &mut self.concurrency)?;
        parse_into(&lookup, "MEMORA_SETTLE_MS", &mut self.settle_ms)?;
        parse_into(&lookup, "MEMORA_TIMEOUT_SECS", &mut self.timeout_secs)?;
        Ok(())
    }

    /// Command-line flags beat everything else.
    pub fn apply_overrides(&mut self, provider: Option<&str>, model: Option<&str>) -> Result<()> {
        if let Some(provider) = provider {
            self.provider = parse_provider(provider)?;
        }
        if let Some(model) = model {
            self.model = model.to_string();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.splitter_config().validate()?;
        self.sizer_options().validate()?;
        if self.model.trim().is_empty() {
            return Err(anyhow!("model name must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout must be at least one second"));
        }
        Ok(())
    }

    pub fn splitter_config(&self) -> SplitterConfig {
        SplitterConfig {
            max_size: self.chunk_size,
            overlap: self.chunk_overlap,
            separators: default_separators(),
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            concurrency_limit: self.concurrency,
            settle_delay: Duration::from_millis(self.settle_ms),
        }
    }

    pub fn sizer_options(&self) -> SizerOptions {
        SizerOptions {
            token_limit: self.token_limit,
            initial_speed: self.initial_speed,
            step: self.speed_step,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn parse_into<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) -> Result<()> {
    if let Some(raw) = lookup(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{key} must be a non-negative integer, got '{raw}'"))?;
    }
    Ok(())
}

fn parse_provider(name: &str) -> Result<LlmProvider> {
    LlmProvider::from_str(name).ok_or_else(|| anyhow!("unknown provider {name}"))
}

fn parse_tokenizer(name: &str) -> Result<TokenizerKind> {
    TokenizerKind::from_str(name).ok_or_else(|| anyhow!("unknown tokenizer {name}"))
}
