use anyhow::Result;
use serde::Deserialize;
use std::env;

pub const DEFAULT_MODEL: &str = "meta-llama/Llama-3.3-70B-Instruct-Turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.together.xyz";
pub const DEFAULT_EMBEDDING_MODEL: &str = "BAAI/bge-large-en-v1.5";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Credential for the completion endpoint. Usually entered interactively;
    /// the environment value only seeds the session.
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Replace the real model with deterministic stub vectors (offline mode).
    pub offline_stub: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub top_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: String::new(),
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                max_tokens: 500,
                temperature: 0.7,
                stop: vec!["Human:".to_string(), "Assistant:".to_string()],
            },
            embedding: EmbeddingConfig {
                model: DEFAULT_EMBEDDING_MODEL.to_string(),
                offline_stub: false,
            },
            chunking: ChunkingConfig {
                chunk_size: 1024,
                top_k: 5,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        Ok(Self {
            llm: LlmConfig {
                api_key: env::var("DATACHAT_API_KEY").unwrap_or_default(),
                base_url: env::var("DATACHAT_BASE_URL").unwrap_or(defaults.llm.base_url),
                model: env::var("DATACHAT_MODEL").unwrap_or(defaults.llm.model),
                max_tokens: env::var("DATACHAT_MAX_TOKENS")
                    .unwrap_or_else(|_| "500".to_string())
                    .parse()?,
                temperature: env::var("DATACHAT_TEMPERATURE")
                    .unwrap_or_else(|_| "0.7".to_string())
                    .parse()?,
                stop: env::var("DATACHAT_STOP")
                    .unwrap_or_else(|_| "Human:,Assistant:".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            embedding: EmbeddingConfig {
                model: env::var("DATACHAT_EMBED_MODEL").unwrap_or(defaults.embedding.model),
                offline_stub: env::var("DATACHAT_EMBED_STUB")
                    .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
            },
            chunking: ChunkingConfig {
                chunk_size: env::var("DATACHAT_CHUNK_SIZE")
                    .unwrap_or_else(|_| "1024".to_string())
                    .parse()?,
                top_k: env::var("DATACHAT_TOP_K")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.llm.stop, vec!["Human:", "Assistant:"]);
        assert_eq!(config.embedding.model, DEFAULT_EMBEDDING_MODEL);
        assert!(config.chunking.top_k > 0);
    }
}
