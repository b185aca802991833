//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::config::LlmConfig;
use crate::error::{AppError, Result};
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig};

/// Creates an LLM client for the given provider.
///
/// For OpenAI the API key is resolved in order:
/// 1. Provided `api_key` parameter
/// 2. `OPENAI_API_KEY` environment variable
///
/// Model, endpoint, temperature and timeout come from `llm`.
pub fn create_client(
    provider: LlmProvider,
    api_key: Option<String>,
    llm: &LlmConfig,
) -> Result<Box<dyn LlmClient>> {
    match provider {
        LlmProvider::OpenAi => {
            let key = api_key
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    AppError::config("No API key configured. Set OPENAI_API_KEY or use --llm mock.")
                })?;
            let config = OpenAiConfig::from_llm_config(key, llm)?;
            Ok(Box::new(OpenAiClient::new(config)?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_client() {
        let client = create_client(LlmProvider::Mock, None, &LlmConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_openai_with_provided_key() {
        let result = create_client(
            LlmProvider::OpenAi,
            Some("test-key".to_string()),
            &LlmConfig::default(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_create_openai_with_blank_key_fails() {
        // An explicit blank key wins over the environment and is rejected.
        let result = create_client(
            LlmProvider::OpenAi,
            Some("   ".to_string()),
            &LlmConfig::default(),
        );
        let err = result.err().unwrap();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn test_create_openai_with_bad_base_url_fails() {
        let llm = LlmConfig {
            base_url: "::not a url::".to_string(),
            ..LlmConfig::default()
        };
        let result = create_client(LlmProvider::OpenAi, Some("test-key".to_string()), &llm);
        assert_eq!(result.err().unwrap().category(), "Configuration Error");
    }
}
