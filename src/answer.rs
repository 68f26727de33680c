//! Answer acquisition protocol: skip, then per-activity cache, then inference.

use color_eyre::Result;

use crate::{
	llm::{InferenceClient, InferenceError},
	question::Question,
};

/// Sentinel answer for questions resolved without inference (picture questions)
pub const SKIP_TOKEN: &str = "SKIP";

/// Resolves candidate answer tokens for a question. The cache lives on the
/// question record itself; this only decides which source to consult.
pub struct AnswerSource<C> {
	client: C,
}

impl<C: InferenceClient> AnswerSource<C> {
	pub fn new(client: C) -> Self {
		Self { client }
	}

	/// Precedence is fixed: skip-completion questions never reach inference, a
	/// rebound question with a recorded answer is served from cache (and marked
	/// so), everything else goes to the inference client. Timeouts retry the
	/// same call without bound; other inference failures are fatal.
	pub async fn resolve(&self, context: &str, question: &mut Question) -> Result<Vec<String>> {
		if question.skip_completion {
			// A replayed skip question must still count toward the exhaustion
			// guard, or an activity containing one would retake forever
			if !question.first_use {
				question.cache_used = true;
			}
			tracing::debug!("skipping inference for {:?}", question.kind.label());
			return Ok(vec![SKIP_TOKEN.to_string()]);
		}

		if !question.first_use && !question.answer.is_empty() {
			question.cache_used = true;
			tracing::debug!("serving cached answer for {:?}", question.prompt);
			return Ok(question.answer.clone());
		}

		loop {
			match self.client.complete(context, &question.prompt).await {
				Ok(tokens) => {
					tracing::debug!("inference answered {:?} with {tokens:?}", question.prompt);
					return Ok(tokens);
				}
				Err(InferenceError::Timeout) => {
					tracing::warn!("inference timed out for {:?}, retrying", question.prompt);
				}
				Err(e) => return Err(e.into()),
			}
		}
	}
}
