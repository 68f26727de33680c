//! The quiz resolution loop: answer every question, read the score, retake
//! until mastery or until the answer cache proves insufficient.

use std::time::Duration;

use color_eyre::{
	Result,
	eyre::eyre,
};
use derive_new::new;

use crate::{
	Activity,
	answer::AnswerSource,
	config::MASTERY_SCORE,
	driver::PageDriver,
	llm::InferenceClient,
	markup,
	question::{ClassifierMiss, Question, classify},
	selectors::{nav, quiz},
};

const ELEMENT_WAIT: Duration = Duration::from_secs(10);

/// Why a quiz run ended.
#[derive(Debug, PartialEq, Eq)]
pub enum QuizOutcome {
	/// Mastery score reached
	Mastered(u32),
	/// Every cached answer was replayed without reaching mastery; retaking
	/// again could only repeat the same submissions
	CacheExhausted,
}

#[derive(new)]
pub struct QuizSession<'a, D, C> {
	driver: &'a D,
	source: &'a AnswerSource<C>,
	#[new(value = "ELEMENT_WAIT")]
	wait: Duration,
}

impl<D: PageDriver, C: InferenceClient> QuizSession<'_, D, C> {
	/// Drive the activity's quiz to completion. The cache-exhaustion guard is
	/// checked before every pass: it can never fire on the first one (no
	/// questions recorded yet), and once it does, another retake is pointless.
	pub async fn run(&self, activity: &mut Activity) -> Result<QuizOutcome> {
		self.open_quiz_tab().await?;
		let context = activity.context_markdown();

		loop {
			if activity.all_answers_reused() {
				tracing::warn!(url = %activity.url, "all cached answers replayed without reaching mastery, giving up");
				return Ok(QuizOutcome::CacheExhausted);
			}

			self.run_pass(activity, &context).await?;
			let score = self.read_score().await?;
			if score >= MASTERY_SCORE {
				tracing::info!(url = %activity.url, score, "quiz mastered");
				return Ok(QuizOutcome::Mastered(score));
			}

			tracing::info!(score, "score below mastery, retaking the quiz");
			let retake = self.driver.locate(&quiz::retake()).await?;
			self.driver.click(&retake).await?;
		}
	}

	async fn open_quiz_tab(&self) -> Result<()> {
		self.driver.wait_for(&nav::container(), self.wait).await?;
		let tab = self.driver.wait_for(&nav::quiz_tab(), self.wait).await?;
		self.driver.click(&tab).await?;
		Ok(())
	}

	/// One full pass over the quiz: questions until the results page shows up.
	async fn run_pass(&self, activity: &mut Activity, context: &str) -> Result<()> {
		loop {
			match self.driver.locate(&quiz::retake()).await {
				Ok(_) => return Ok(()),
				Err(e) if e.is_not_found() => {}
				Err(e) => return Err(e.into()),
			}
			self.handle_question(activity, context).await?;
			self.advance().await?;
		}
	}

	async fn handle_question(&self, activity: &mut Activity, context: &str) -> Result<()> {
		let element = self.driver.wait_for(&quiz::question(), self.wait).await?;
		let class_attr = self.driver.attribute(&element, "class").await?.unwrap_or_default();
		let Some(kind) = classify(&class_attr) else {
			return Err(ClassifierMiss(class_attr).into());
		};
		tracing::info!("handling a {}", kind.label());

		// The prompt must be rendered before any mutation: it is the cache key
		let mut fresh = Question::new(kind, element.clone());
		let prompt = fresh.render_prompt(self.driver).await?;

		let idx = match activity.find_question(&prompt) {
			Some(i) => {
				activity.questions[i].rebind(element);
				i
			}
			None => {
				activity.questions.push(fresh);
				activity.questions.len() - 1
			}
		};

		let tokens = self.source.resolve(context, &mut activity.questions[idx]).await?;
		let question = &activity.questions[idx];
		question.apply(self.driver, &tokens).await?;
		let recorded = question.submit_and_check(self.driver, tokens).await?;
		activity.questions[idx].answer = recorded;
		Ok(())
	}

	/// Click the next control when present; on the last question the results
	/// page replaces it.
	async fn advance(&self) -> Result<()> {
		match self.driver.locate(&quiz::next()).await {
			Ok(next) => {
				self.driver.click(&next).await?;
				Ok(())
			}
			Err(e) if e.is_not_found() => Ok(()),
			Err(e) => Err(e.into()),
		}
	}

	async fn read_score(&self) -> Result<u32> {
		let el = self.driver.wait_for(&quiz::score_value(), self.wait).await?;
		let text = self.driver.text(&el).await?;
		markup::parse_score(&text).ok_or_else(|| eyre!("unparsable quiz score {text:?}"))
	}
}
