//! GeminiProvider -- concrete [`TextProvider`] implementation for Gemini.
//!
//! Sends requests to `models/{model}:streamGenerateContent?alt=sse` with the
//! API key in the `x-goog-api-key` header. The key never appears in Debug
//! output, Display output, or tracing logs.

use std::time::Duration;

use secrecy::SecretString;

use relaychat_core::llm::provider::{FragmentStream, TextProvider};
use relaychat_types::chat::Role;
use relaychat_types::provider::{GenerateRequest, ProviderError};

use super::streaming::create_gemini_stream;
use super::types::{GeminiContent, GeminiPart, GeminiRequest};

/// Gemini streaming text provider.
///
/// Constructed from explicit configuration -- no environment reads happen
/// here, which is what lets tests construct providers against a local mock
/// server via [`GeminiProvider::with_base_url`].
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    ///
    /// `api_key` may be absent; every stream then fails immediately with
    /// [`ProviderError::MissingCredentials`], which reaches the caller as a
    /// structured pre-stream error.
    pub fn new(api_key: Option<SecretString>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // 5 min cap for long generations
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }

    /// Convert a generic [`GenerateRequest`] into the Gemini wire format.
    ///
    /// The projected history becomes the leading `contents` entries and the
    /// in-flight prompt is appended as the final user turn -- it is never
    /// part of the history itself.
    fn to_gemini_request(request: &GenerateRequest) -> GeminiRequest {
        let mut contents: Vec<GeminiContent> = request
            .history
            .iter()
            .map(|turn| GeminiContent {
                role: turn.role.to_string(),
                parts: vec![GeminiPart {
                    text: turn.text.clone(),
                }],
            })
            .collect();

        contents.push(GeminiContent {
            role: Role::User.to_string(),
            parts: vec![GeminiPart {
                text: request.prompt.clone(),
            }],
        });

        GeminiRequest { contents }
    }
}

impl TextProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn stream(&self, request: GenerateRequest) -> FragmentStream {
        let Some(api_key) = self.api_key.clone() else {
            return Box::pin(futures_util::stream::once(async {
                Err::<String, _>(ProviderError::MissingCredentials)
            }));
        };

        let body = Self::to_gemini_request(&request);
        let url = self.url(&request.model);
        create_gemini_stream(self.client.clone(), url, api_key, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use relaychat_types::provider::ProviderTurn;

    #[test]
    fn test_url_includes_model_and_sse_flag() {
        let provider = GeminiProvider::new(None);
        let url = provider.url("gemini-2.5-flash");
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_request_appends_prompt_as_final_user_turn() {
        let request = GenerateRequest {
            model: "gemini-2.5-flash".to_string(),
            history: vec![
                ProviderTurn {
                    role: Role::User,
                    text: "hi".to_string(),
                },
                ProviderTurn {
                    role: Role::Model,
                    text: "Hello!".to_string(),
                },
            ],
            prompt: "and then?".to_string(),
        };

        let wire = GeminiProvider::to_gemini_request(&request);
        let json = serde_json::to_value(&wire).unwrap();
        let contents = json["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "and then?");
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_any_request() {
        let provider = GeminiProvider::new(None);
        let request = GenerateRequest {
            model: "gemini-2.5-flash".to_string(),
            history: Vec::new(),
            prompt: "hi".to_string(),
        };

        let mut stream = provider.stream(request);
        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(ProviderError::MissingCredentials)));
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let provider = GeminiProvider::new(Some(SecretString::from("sk-secret")));
        let debug = format!("{:?}", provider.api_key);
        assert!(!debug.contains("sk-secret"));
    }
}
