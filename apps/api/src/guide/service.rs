//! Guide Request Service: prompt → model call → JSON extraction → repair, with retry.
//!
//! Flow per attempt: `VisionModel::generate` → `extract_json_span` →
//! `parse_with_repair` → `GuideDocument::from_model_json`.
//!
//! Every failure inside an attempt (provider error, missing JSON span, invalid
//! JSON after repair) is retried identically: 3 attempts total with a linear
//! backoff of `attempt × 1000ms`. Input validation and the credential check
//! happen once, before the loop, and are never retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::guide::json_repair::{extract_json_span, parse_with_repair};
use crate::guide::model::GuideDocument;
use crate::guide::prompts::build_guide_prompt;
use crate::llm_client::{InlineImage, LlmError, VisionModel};
use crate::models::submission::{parse_data_url, SubmissionError};

#[derive(Debug, Error)]
pub enum GuideError {
    #[error("GEMINI_API_KEY is not configured")]
    Configuration,

    #[error("{0}")]
    InvalidInput(#[from] SubmissionError),

    #[error("{0}")]
    Upstream(#[source] LlmError),

    #[error("{0}")]
    Parse(#[source] ReplyError),
}

/// Why a model reply could not be turned into a guide.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("Invalid response format from AI")]
    MissingJson,

    #[error("Failed to parse AI response: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Failure of a single attempt, before retry classification.
#[derive(Debug)]
enum AttemptError {
    Upstream(LlmError),
    Reply(ReplyError),
}

impl AttemptError {
    fn into_guide_error(self) -> GuideError {
        match self {
            AttemptError::Upstream(e) => GuideError::Upstream(e),
            AttemptError::Reply(e) => GuideError::Parse(e),
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::Upstream(e) => write!(f, "{e}"),
            AttemptError::Reply(e) => write!(f, "{e}"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Retry policy
// ────────────────────────────────────────────────────────────────────────────

/// Passive wait between attempts. Swapped out in tests so no real time passes.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Default delay backed by the tokio timer.
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait before attempt `n + 1` is `n × base_delay`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

/// Turns a primary image plus docent notes into a `GuideDocument`.
///
/// `model` is `None` when no provider credential was configured; every request
/// then fails fast with `GuideError::Configuration`.
#[derive(Clone)]
pub struct GuideService {
    model: Option<Arc<dyn VisionModel>>,
    delay: Arc<dyn Delay>,
    policy: RetryPolicy,
}

impl GuideService {
    pub fn new(model: Option<Arc<dyn VisionModel>>) -> Self {
        Self {
            model,
            delay: Arc::new(TokioDelay),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    pub async fn request_guide(
        &self,
        primary_image_data_url: &str,
        free_text: &str,
    ) -> Result<GuideDocument, GuideError> {
        let model = self.model.as_ref().ok_or(GuideError::Configuration)?;

        let data_url = parse_data_url(primary_image_data_url)?;
        let image = InlineImage {
            media_type: data_url.media_type.to_string(),
            base64_data: data_url.payload.to_string(),
        };
        let prompt = build_guide_prompt(free_text);

        let mut last_error: Option<AttemptError> = None;

        for attempt in 1..=self.policy.max_attempts {
            match attempt_once(model.as_ref(), &prompt, &image).await {
                Ok(guide) => {
                    info!("Guide generated on attempt {attempt}");
                    return Ok(guide);
                }
                Err(e) => {
                    warn!(
                        "Guide attempt {}/{} failed: {}",
                        attempt, self.policy.max_attempts, e
                    );
                    last_error = Some(e);
                }
            }

            if attempt < self.policy.max_attempts {
                self.delay.wait(self.policy.delay_after(attempt)).await;
            }
        }

        Err(last_error
            .map(AttemptError::into_guide_error)
            .unwrap_or(GuideError::Upstream(LlmError::EmptyContent)))
    }
}

/// One model call plus reply parsing.
async fn attempt_once(
    model: &dyn VisionModel,
    prompt: &str,
    image: &InlineImage,
) -> Result<GuideDocument, AttemptError> {
    let text = model
        .generate(prompt, image)
        .await
        .map_err(AttemptError::Upstream)?;
    parse_guide_reply(&text).map_err(AttemptError::Reply)
}

/// Extracts, repairs if needed, and converts the model's raw text reply.
pub fn parse_guide_reply(text: &str) -> Result<GuideDocument, ReplyError> {
    let span = extract_json_span(text).ok_or(ReplyError::MissingJson)?;
    let value = parse_with_repair(span)?;
    Ok(GuideDocument::from_model_json(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const IMAGE: &str = "data:image/png;base64,AAAA";

    const GOOD_REPLY: &str = r#"Here you go: {"overview":"A harbor at dawn.","talkingPoints":["one","two","three"],"presentationFlow":"Opening Hook (30 sec): Ask a question."}"#;

    /// Replies from a script; records every prompt it receives.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        calls: Mutex<Vec<(String, InlineImage)>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl VisionModel for ScriptedModel {
        async fn generate(&self, prompt: &str, image: &InlineImage) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), image.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    #[derive(Default)]
    struct RecordingDelay {
        waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn wait(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn api_error() -> LlmError {
        LlmError::Api {
            status: 503,
            message: "overloaded".into(),
        }
    }

    fn service(model: Arc<ScriptedModel>, delay: Arc<RecordingDelay>) -> GuideService {
        let model: Arc<dyn VisionModel> = model;
        GuideService::new(Some(model)).with_delay(delay)
    }

    #[tokio::test]
    async fn test_missing_credential_fails_without_calling_model() {
        let service = GuideService::new(None);
        let err = service.request_guide(IMAGE, "").await.unwrap_err();
        assert!(matches!(err, GuideError::Configuration));
        assert!(!service.is_configured());
    }

    #[tokio::test]
    async fn test_malformed_data_url_is_invalid_input_and_not_retried() {
        let model = ScriptedModel::new(vec![]);
        let delay = Arc::new(RecordingDelay::default());
        let err = service(model.clone(), delay.clone())
            .request_guide("not-a-data-url", "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GuideError::InvalidInput(SubmissionError::InvalidDataUrl)
        ));
        assert_eq!(model.call_count(), 0);
        assert!(delay.waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let model = ScriptedModel::new(vec![Ok(GOOD_REPLY.to_string())]);
        let delay = Arc::new(RecordingDelay::default());
        let guide = service(model.clone(), delay.clone())
            .request_guide(IMAGE, "Monet")
            .await
            .unwrap();

        assert_eq!(guide.overview.as_deref(), Some("A harbor at dawn."));
        assert_eq!(model.call_count(), 1);
        assert!(delay.waits.lock().unwrap().is_empty());

        let calls = model.calls.lock().unwrap();
        assert!(calls[0].0.contains("Monet"));
        assert_eq!(calls[0].1.media_type, "image/png");
        assert_eq!(calls[0].1.base64_data, "AAAA");
    }

    #[tokio::test]
    async fn test_fails_twice_then_succeeds_with_linear_backoff() {
        let model = ScriptedModel::new(vec![
            Err(api_error()),
            Ok("no json at all".to_string()),
            Ok(GOOD_REPLY.to_string()),
        ]);
        let delay = Arc::new(RecordingDelay::default());
        let guide = service(model.clone(), delay.clone())
            .request_guide(IMAGE, "")
            .await
            .unwrap();

        assert_eq!(guide.talking_points.map(|t| t.len()), Some(3));
        assert_eq!(model.call_count(), 3);
        assert_eq!(
            *delay.waits.lock().unwrap(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[tokio::test]
    async fn test_always_failing_provider_stops_after_three_attempts() {
        let model = ScriptedModel::new(vec![Err(api_error()), Err(api_error()), Err(api_error())]);
        let delay = Arc::new(RecordingDelay::default());
        let err = service(model.clone(), delay.clone())
            .request_guide(IMAGE, "")
            .await
            .unwrap_err();

        assert!(matches!(err, GuideError::Upstream(LlmError::Api { status: 503, .. })));
        assert_eq!(model.call_count(), 3);
        assert_eq!(delay.waits.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_last_error_decides_kind() {
        let model = ScriptedModel::new(vec![
            Err(api_error()),
            Err(api_error()),
            Ok("{\"overview\": unquoted}".to_string()),
        ]);
        let delay = Arc::new(RecordingDelay::default());
        let err = service(model, delay)
            .request_guide(IMAGE, "")
            .await
            .unwrap_err();
        assert!(matches!(err, GuideError::Parse(ReplyError::InvalidJson(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_delay_waits_on_tokio_clock() {
        let model: Arc<dyn VisionModel> =
            ScriptedModel::new(vec![Err(api_error()), Ok(GOOD_REPLY.to_string())]);
        let start = tokio::time::Instant::now();
        GuideService::new(Some(model))
            .request_guide(IMAGE, "")
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_reply_repairs_raw_newlines() {
        let reply = "```json\n{\"overview\":\"Line one\nLine two\"}\n```";
        let guide = parse_guide_reply(reply).unwrap();
        assert_eq!(guide.overview.as_deref(), Some("Line one\nLine two"));
    }

    #[test]
    fn test_parse_reply_drops_stray_control_chars() {
        let guide = parse_guide_reply("{\"overview\":\"Harbor\u{000B} at dawn\"}").unwrap();
        assert_eq!(guide.overview.as_deref(), Some("Harbor at dawn"));
    }

    #[test]
    fn test_parse_reply_without_braces_is_missing_json() {
        assert!(matches!(
            parse_guide_reply("I cannot help with that."),
            Err(ReplyError::MissingJson)
        ));
    }

    #[test]
    fn test_retry_policy_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
    }
}
