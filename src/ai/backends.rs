use crate::error::SummaryError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Capability that turns a rendered prompt into generated text
///
/// Implementations apply their own deadlines; callers of `generate` do not.
pub trait Summarizer: Send + Sync {
    fn generate<'a>(
        &'a self,
        model: &'a str,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, SummaryError>> + Send + 'a>>;
}

fn build_client(timeout: Duration) -> Result<Client, SummaryError> {
    Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()
        .map_err(|e| SummaryError::BackendError(format!("Failed to create HTTP client: {}", e)))
}

/// Ollama backend for local LLM inference
///
/// Talks to a local Ollama server through its `/api/generate` endpoint.
pub struct OllamaBackend {
    client: Client,
    endpoint: String,
}

/// Request format for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

/// Options for Ollama inference
#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response format from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// # Arguments
    /// * `endpoint` - Ollama server URL (e.g., "http://localhost:11434")
    /// * `timeout` - Deadline for a single generation request
    ///
    /// # Example
    /// ```
    /// use logsift::ai::backends::OllamaBackend;
    /// use std::time::Duration;
    ///
    /// let backend = OllamaBackend::new(
    ///     "http://localhost:11434".to_string(),
    ///     Duration::from_secs(120),
    /// ).unwrap();
    /// ```
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, SummaryError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
        })
    }

    /// Format the Ollama API endpoint URL
    fn api_url(&self) -> String {
        format!("{}/api/generate", self.endpoint.trim_end_matches('/'))
    }
}

impl Summarizer for OllamaBackend {
    fn generate<'a>(
        &'a self,
        model: &'a str,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, SummaryError>> + Send + 'a>> {
        Box::pin(async move {
            let request = OllamaRequest {
                model,
                prompt,
                stream: false, // We want the complete response, not streaming
                options: OllamaOptions { temperature: 0.2 },
            };

            let response = self
                .client
                .post(self.api_url())
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(SummaryError::BackendError(format!(
                    "Ollama API returned error {}: {}",
                    status, error_text
                )));
            }

            let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
                SummaryError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
            })?;

            if let Some(error) = ollama_response.error {
                return Err(SummaryError::BackendError(format!(
                    "Ollama error: {}",
                    error
                )));
            }

            let text = ollama_response.response.trim();
            if text.is_empty() {
                return Err(SummaryError::InvalidResponse(
                    "Ollama returned an empty response".to_string(),
                ));
            }
            Ok(text.to_string())
        })
    }
}

/// OpenAI-compatible backend
///
/// Works against OpenAI itself or any server exposing `/chat/completions`.
pub struct OpenAIBackend {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Request format for OpenAI Chat Completions API
#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    temperature: f32,
}

/// Message format for OpenAI API
#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response format from OpenAI API
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    error: Option<OpenAIError>,
}

/// Choice in OpenAI response
#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

/// Message in OpenAI response
#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: String,
}

/// Error format from OpenAI API
#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

const OPENAI_SYSTEM_PROMPT: &str =
    "You are a site reliability engineer reviewing application log statistics. \
     Answer in plain prose suitable for an executive audience.";

impl OpenAIBackend {
    /// Create a new OpenAI backend
    ///
    /// # Arguments
    /// * `api_key` - API key sent as a bearer token
    /// * `base_url` - API root, e.g. "https://api.openai.com/v1"
    /// * `timeout` - Deadline for a single generation request
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, SummaryError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            base_url,
        })
    }

    /// Format the OpenAI API endpoint URL
    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl Summarizer for OpenAIBackend {
    fn generate<'a>(
        &'a self,
        model: &'a str,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, SummaryError>> + Send + 'a>> {
        Box::pin(async move {
            let request = OpenAIRequest {
                model,
                messages: vec![
                    OpenAIMessage {
                        role: "system",
                        content: OPENAI_SYSTEM_PROMPT,
                    },
                    OpenAIMessage {
                        role: "user",
                        content: prompt,
                    },
                ],
                temperature: 0.2,
            };

            let response = self
                .client
                .post(self.api_url())
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(SummaryError::BackendError(format!(
                    "OpenAI API returned error {}: {}",
                    status, error_text
                )));
            }

            let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
                SummaryError::InvalidResponse(format!("Failed to parse OpenAI response: {}", e))
            })?;

            if let Some(error) = openai_response.error {
                return Err(SummaryError::BackendError(format!(
                    "OpenAI API error ({}): {}",
                    error.error_type, error.message
                )));
            }

            let content = openai_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| {
                    SummaryError::InvalidResponse("No choices in OpenAI response".to_string())
                })?
                .message
                .content;
            Ok(content.trim().to_string())
        })
    }
}

/// Scripted summarizer for tests and offline runs
///
/// Responses are returned in order and cycle after the last one. Every call
/// is recorded so tests can inspect the prompts that were sent.
#[derive(Clone)]
pub struct MockBackend {
    responses: Vec<Result<String, SummaryError>>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockBackend {
    /// Create a mock backend with a single response
    pub fn with_response(response: Result<String, SummaryError>) -> Self {
        Self::with_responses(vec![response])
    }

    /// Create a mock backend with multiple responses
    pub fn with_responses(responses: Vec<Result<String, SummaryError>>) -> Self {
        Self {
            responses,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock backend that always succeeds
    pub fn success() -> Self {
        Self::with_response(Ok("Mock executive summary".to_string()))
    }

    /// Create a mock backend that always fails
    pub fn error(error_message: String) -> Self {
        Self::with_response(Err(SummaryError::BackendError(error_message)))
    }

    /// Create a mock backend that simulates timeout errors
    pub fn timeout() -> Self {
        Self::with_response(Err(SummaryError::Timeout))
    }

    /// Add a delay to all responses
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times generate() has been called
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// The (model, prompt) pair of the most recent call
    pub fn last_call(&self) -> Option<(String, String)> {
        self.calls
            .lock()
            .ok()
            .and_then(|calls| calls.last().cloned())
    }
}

impl Summarizer for MockBackend {
    fn generate<'a>(
        &'a self,
        model: &'a str,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, SummaryError>> + Send + 'a>> {
        Box::pin(async move {
            let call_index = {
                let mut calls = self
                    .calls
                    .lock()
                    .map_err(|_| SummaryError::BackendError("mock state poisoned".to_string()))?;
                calls.push((model.to_string(), prompt.to_string()));
                calls.len() - 1
            };

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if self.responses.is_empty() {
                return Err(SummaryError::BackendError(
                    "mock has no scripted responses".to_string(),
                ));
            }
            self.responses[call_index % self.responses.len()].clone()
        })
    }
}
