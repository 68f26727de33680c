//! Inference service client: lesson context + question prompt in, ordered answer
//! tokens out.

use std::time::Duration;

use ask_llm::{Client as LlmClient, Conversation, Model, Role};
use derive_new::new;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
	/// Transient: the answer source retries the same call, without bound
	#[error("inference call timed out")]
	Timeout,
	/// Anything else is fatal for the question being resolved
	#[error("inference call failed: {0}")]
	Failed(String),
}

/// Contract the answer source consumes; implemented by [`AskLlmClient`] in
/// production and by scripted stubs in tests.
#[allow(async_fn_in_trait)]
pub trait InferenceClient {
	async fn complete(&self, context: &str, prompt: &str) -> Result<Vec<String>, InferenceError>;
}

const ANSWER_INSTRUCTIONS: &str = concat!(
	"You are an English expert, you will receive some data about an activity and you will have to ",
	"respond to different questions about these activities. You will need to ALWAYS respond as JSON ",
	"an array of strings. And NEVER respond anything besides a JSON array of strings. The response ",
	"MUST NOT be a JSON object. If multiple values are part of the response, they MUST be elements ",
	"of the JSON array. If you need to complete a sentence, only return the missing part of the ",
	"sentence that is marked as ____ but keep the result in a JSON array.",
);

/// `ask_llm`-backed inference client with a bounded per-call timeout.
#[derive(new)]
pub struct AskLlmClient {
	timeout: Duration,
}

impl InferenceClient for AskLlmClient {
	async fn complete(&self, context: &str, prompt: &str) -> Result<Vec<String>, InferenceError> {
		let client = LlmClient::new().model(Model::Medium).max_tokens(256).force_json();

		let mut conv = Conversation::new();
		conv.add(Role::User, ANSWER_INSTRUCTIONS.to_string());
		conv.add(Role::User, format!("The data is the following :\n{context}"));
		conv.add(Role::User, prompt.to_string());

		let response = tokio::time::timeout(self.timeout, client.conversation(&conv))
			.await
			.map_err(|_| InferenceError::Timeout)?
			.map_err(|e| InferenceError::Failed(e.to_string()))?;

		tracing::debug!("inference raw response: {}", response.text);
		Ok(parse_answer_tokens(&response.text))
	}
}

/// Parse the service response as a JSON array of strings; a malformed response is
/// downgraded to a single-token answer rather than lost.
pub fn parse_answer_tokens(raw: &str) -> Vec<String> {
	let trimmed = raw.trim();
	match serde_json::from_str::<Vec<String>>(trimmed) {
		Ok(tokens) => tokens,
		Err(_) => vec![trimmed.to_string()],
	}
}
