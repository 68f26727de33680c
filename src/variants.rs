//! Per-variant behavior: prompt rendering, ground-truth extraction and applying a
//! candidate answer to the live quiz UI.
//!
//! The apply contract is lenient on purpose: a candidate token that matches no UI
//! option falls back to an arbitrary remaining option (logged as a correctness
//! risk), and pool-based variants drain whatever is still unselected so the
//! submit control always becomes available. A missing submit control, on the
//! other hand, is fatal for the activity.

use color_eyre::{Result, eyre::eyre};
use rand::Rng;

use crate::{
	answer::SKIP_TOKEN,
	driver::{DriverError, ElementId, Locator, PageDriver},
	markup,
	question::{Question, QuestionKind},
	selectors::quiz,
};

/// Fixed filler typed into gap inputs the inference service under-supplied
pub const GAP_FILLER: &str = "abcdef";

const SENTENCE_OPTION_CLASS: &str = "ScrambledSentenceOption";
const FILL_BUTTON_CLASS: &str = "Question__fill-button";

impl Question {
	/// Render the question as natural-language text. This is both what the
	/// inference service sees and the answer-cache key, so it must be captured
	/// before any UI mutation.
	pub async fn render_prompt<D: PageDriver>(&mut self, driver: &D) -> Result<String> {
		let prompt = match self.kind {
			QuestionKind::MultiChoiceText { .. } | QuestionKind::MultiChoiceImage => driver.text(&self.element).await?,
			QuestionKind::ScrambledLetters => {
				let letters = driver.text(&self.element).await?;
				format!("{letters} are the letters you can use, you NEED to use every letters")
			}
			QuestionKind::ScrambledSentence => {
				let html = driver.outer_html(&self.element).await?;
				markup::render_block_prompt(&html, SENTENCE_OPTION_CLASS)
			}
			QuestionKind::MatchText | QuestionKind::FillGapsBlock => {
				let html = driver.outer_html(&self.element).await?;
				markup::render_block_prompt(&html, FILL_BUTTON_CLASS)
			}
			QuestionKind::FillGapsText => {
				let html = driver.outer_html(&self.element).await?;
				markup::render_text_gaps_prompt(&html)
			}
			QuestionKind::ShortText => {
				let stem = driver.locate_within(&self.element, &quiz::short_answer_stem()).await?;
				driver.text(&stem).await?
			}
		};
		self.prompt = prompt.clone();
		Ok(prompt)
	}

	/// Scan the element for the highlighted "correct answer" the site sometimes
	/// reveals after submission. `None` when it is not shown.
	pub async fn extract_ground_truth<D: PageDriver>(&self, driver: &D) -> Result<Option<Vec<String>>> {
		match self.kind {
			QuestionKind::MultiChoiceText { .. } => match driver.locate_within(&self.element, &quiz::correct_option()).await {
				Ok(el) => Ok(Some(vec![driver.text(&el).await?])),
				Err(e) if e.is_not_found() => Ok(None),
				Err(e) => Err(e.into()),
			},
			QuestionKind::MultiChoiceImage => match driver.locate_within(&self.element, &quiz::correct_option_image()).await {
				Ok(el) => {
					let src = driver.attribute(&el, "src").await?.unwrap_or_default();
					Ok(Some(vec![strip_origin(&src)]))
				}
				Err(e) if e.is_not_found() => Ok(None),
				Err(e) => Err(e.into()),
			},
			QuestionKind::ScrambledLetters => match driver.locate_within(&self.element, &quiz::correct_letters_block()).await {
				Ok(el) => {
					let word = driver.text(&el).await?;
					Ok(Some(word.chars().map(|c| c.to_string()).collect()))
				}
				Err(e) if e.is_not_found() => Ok(None),
				Err(e) => Err(e.into()),
			},
			QuestionKind::ScrambledSentence => {
				let html = driver.outer_html(&self.element).await?;
				Ok(sentence_ground_truth(&html))
			}
			QuestionKind::MatchText | QuestionKind::FillGapsBlock => {
				let html = driver.outer_html(&self.element).await?;
				Ok(markup::green_answer(&html).map(|answer| markup::split_ground_truth(&answer)))
			}
			QuestionKind::FillGapsText | QuestionKind::ShortText => {
				let html = driver.outer_html(&self.element).await?;
				Ok(markup::green_answer(&html).map(|answer| vec![answer]))
			}
		}
	}

	/// Select/type each candidate token in order, falling back per token and
	/// draining required slots as the variant demands.
	pub async fn apply<D: PageDriver>(&self, driver: &D, tokens: &[String]) -> Result<()> {
		match self.kind {
			QuestionKind::MultiChoiceText { multiple } => {
				let take = if multiple { tokens.len() } else { tokens.len().min(1) };
				for token in &tokens[..take] {
					self.select_or_fallback(driver, &quiz::option_with_text(token), &quiz::any_option(), token).await?;
				}
				Ok(())
			}
			QuestionKind::MultiChoiceImage => {
				if tokens.first().map(String::as_str) == Some(SKIP_TOKEN) {
					tracing::debug!("inference skipped for picture question, selecting an arbitrary option");
					if !click_arbitrary(driver, &quiz::any_option()).await? {
						return Err(eyre!("no options left to select on picture question"));
					}
					return Ok(());
				}
				let token = tokens.first().map(String::as_str).unwrap_or_default();
				self.select_or_fallback(driver, &quiz::option_with_image(token), &quiz::any_option(), token).await
			}
			QuestionKind::ScrambledLetters => {
				let letters = explode_single_token(tokens, |t| t.chars().map(|c| c.to_string()).collect());
				for letter in &letters {
					if !self.select_pool_or_fallback(driver, &quiz::unselected_letter(letter), &quiz::any_unselected_letter(), letter).await? {
						break;
					}
				}
				drain_pool(driver, &quiz::any_unselected_letter()).await
			}
			QuestionKind::ScrambledSentence => {
				let pieces = explode_single_token(tokens, |t| t.split_whitespace().map(|w| w.to_string()).collect());
				for piece in &pieces {
					if !self.select_pool_or_fallback(driver, &quiz::unselected_piece(piece), &quiz::any_unselected_piece(), piece).await? {
						break;
					}
				}
				drain_pool(driver, &quiz::any_unselected_piece()).await
			}
			QuestionKind::MatchText | QuestionKind::FillGapsBlock => {
				for token in tokens {
					if !self
						.select_pool_or_fallback(driver, &quiz::unselected_fill_button(token), &quiz::any_unselected_fill_button(), token)
						.await?
					{
						break;
					}
				}
				drain_pool(driver, &quiz::any_unselected_fill_button()).await
			}
			QuestionKind::FillGapsText => {
				for token in tokens {
					let Some(input) = first_empty_gap(driver, &self.element).await? else {
						tracing::warn!("inference over-supplied tokens, ignoring {token:?}");
						break;
					};
					driver.type_text(&input, token).await?;
				}
				// Under-supplied gaps get the fixed filler so the form stays submittable
				while let Some(input) = first_empty_gap(driver, &self.element).await? {
					tracing::debug!("filling a remaining gap with {GAP_FILLER:?}");
					driver.type_text(&input, GAP_FILLER).await?;
				}
				Ok(())
			}
			QuestionKind::ShortText => {
				let Some(token) = tokens.first() else {
					return Err(eyre!("no candidate token for short answer question"));
				};
				let input = driver.locate_within(&self.element, &quiz::short_answer_input()).await?;
				driver.type_text(&input, token).await?;
				Ok(())
			}
		}
	}

	/// Click the submit control, compare the revealed ground truth (if any) with
	/// what was submitted, and return whichever the caller should cache. One
	/// submission attempt per question instance; the comparison is observability,
	/// not a retry trigger.
	pub async fn submit_and_check<D: PageDriver>(&self, driver: &D, tokens: Vec<String>) -> Result<Vec<String>> {
		let submit = driver
			.locate_within(&self.element, &quiz::submit())
			.await
			.map_err(|e| eyre!("submit control missing on question: {e}"))?;
		driver.click(&submit).await?;

		let truth = self.extract_ground_truth(driver).await?;
		match &truth {
			Some(correct) if correct != &tokens => {
				tracing::warn!("wrong answer, the correct answer is {correct:?}");
			}
			_ => tracing::info!("correct answer, caching {tokens:?}"),
		}

		Ok(truth.unwrap_or(tokens))
	}

	async fn select_or_fallback<D: PageDriver>(&self, driver: &D, wanted: &Locator, pool: &Locator, token: &str) -> Result<()> {
		match driver.locate(wanted).await {
			Ok(el) => {
				driver.click(&el).await?;
				tracing::debug!("selected the {token:?} choice");
				Ok(())
			}
			Err(e) if e.is_not_found() => {
				tracing::warn!("candidate {token:?} matches no option, selecting an arbitrary one (correctness risk)");
				if !click_arbitrary(driver, pool).await? {
					return Err(eyre!("no options left to fall back on"));
				}
				Ok(())
			}
			Err(e) => Err(e.into()),
		}
	}

	/// Pool flavor of the fallback: returns false once the pool is exhausted,
	/// which stops token consumption.
	async fn select_pool_or_fallback<D: PageDriver>(&self, driver: &D, wanted: &Locator, pool: &Locator, token: &str) -> Result<bool> {
		match driver.locate(wanted).await {
			Ok(el) => {
				driver.click(&el).await?;
				tracing::debug!("selected the {token:?} piece");
				Ok(true)
			}
			Err(e) if e.is_not_found() => {
				tracing::warn!("candidate {token:?} matches no remaining piece, selecting an arbitrary one (correctness risk)");
				Ok(click_arbitrary(driver, pool).await?)
			}
			Err(e) => Err(e.into()),
		}
	}
}

/// A single multi-character token is split into its constituent pieces first
fn explode_single_token(tokens: &[String], split: impl Fn(&str) -> Vec<String>) -> Vec<String> {
	if tokens.len() == 1 {
		let exploded = split(&tokens[0]);
		if exploded.len() > 1 {
			return exploded;
		}
	}
	tokens.to_vec()
}

fn strip_origin(src: &str) -> String {
	let Some(rest) = src.strip_prefix("https://").or_else(|| src.strip_prefix("http://")) else {
		return src.to_string();
	};
	match rest.find('/') {
		Some(i) => rest[i..].to_string(),
		None => src.to_string(),
	}
}

/// Reconstruct the ordered piece sequence from the green answer by greedily
/// consuming pool-option prefixes. `None` when the site revealed nothing or the
/// pieces cannot be lined up.
fn sentence_ground_truth(html: &str) -> Option<Vec<String>> {
	let answer = markup::green_answer(html)?;
	let choices = markup::extract_button_texts(html, SENTENCE_OPTION_CLASS);
	if choices.is_empty() {
		return None;
	}

	let mut rest = answer.as_str();
	let mut result = Vec::new();
	while result.len() < choices.len() {
		let matched = choices.iter().find(|choice| rest.starts_with(choice.as_str()))?;
		rest = rest[matched.len()..].trim_start();
		result.push(matched.clone());
	}
	Some(result)
}

async fn click_arbitrary<D: PageDriver>(driver: &D, pool: &Locator) -> Result<bool, DriverError> {
	let options = driver.locate_all(pool).await?;
	if options.is_empty() {
		return Ok(false);
	}
	let pick = rand::thread_rng().gen_range(0..options.len());
	driver.click(&options[pick]).await?;
	Ok(true)
}

/// Keep picking arbitrary remaining pool items until none are left
async fn drain_pool<D: PageDriver>(driver: &D, pool: &Locator) -> Result<()> {
	while click_arbitrary(driver, pool).await? {}
	Ok(())
}

// Emptiness must be judged on the live value property: typing never touches
// the value attribute, which would report every input as forever empty.
async fn first_empty_gap<D: PageDriver>(driver: &D, scope: &ElementId) -> Result<Option<ElementId>, DriverError> {
	let inputs = driver.locate_all_within(scope, &quiz::gap_inputs()).await?;
	for input in inputs {
		if driver.input_value(&input).await?.is_empty() {
			return Ok(Some(input));
		}
	}
	Ok(None)
}
