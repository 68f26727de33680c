use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod answer;
pub mod cache;
pub mod config;
pub mod driver;
pub mod learning;
pub mod llm;
pub mod login;
pub mod markup;
pub mod question;
pub mod selectors;
pub mod session;
pub mod variants;

#[cfg(test)]
pub(crate) mod fake;

use crate::question::Question;

/// One lesson+quiz unit, identified by its portal URL.
///
/// `data` is filled once by the learning-tab retrieval step; `questions` accumulates
/// while the quiz is resolved and doubles as the per-activity answer cache (prompt
/// text is the cache key). An activity is owned by the run solving it, never shared.
#[derive(Clone, Debug)]
pub struct Activity {
	pub url: String,
	/// Completion date, when known from the dashboard listing
	pub completed: Option<NaiveDate>,
	/// Lesson-content blocks, consumed read-only as inference context
	pub data: Vec<LessonBlock>,
	/// Answered questions, keyed by prompt text (linear scan, small N)
	pub questions: Vec<Question>,
	/// None = not yet attempted, Some(false) = failed, Some(true) = solved
	pub valid: Option<bool>,
}

impl Activity {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			completed: None,
			data: Vec::new(),
			questions: Vec::new(),
			valid: None,
		}
	}

	/// Find a previously recorded question by exact prompt-text equality.
	pub fn find_question(&self, prompt: &str) -> Option<usize> {
		self.questions.iter().position(|q| q.prompt == prompt)
	}

	/// True once every cached question has been served from cache at least once.
	/// This is the retake loop-termination guard: it never fires on a fresh
	/// activity (empty question list).
	pub fn all_answers_reused(&self) -> bool {
		!self.questions.is_empty() && self.questions.iter().all(|q| q.cache_used)
	}

	/// Render the lesson content as markdown, the shape the inference service is
	/// prompted with.
	pub fn context_markdown(&self) -> String {
		let mut lines: Vec<String> = Vec::new();

		for block in &self.data {
			match block {
				LessonBlock::Title { title, description } => {
					lines.push(format!("# {title}"));
					lines.push(format!("{description}  "));
				}
				LessonBlock::Vocabulary { title, definitions, lines: extra, .. } => {
					lines.push(String::new());
					lines.push(format!("## {title}"));
					for def in definitions {
						lines.push(format!("- {} : {}  ", def.key, def.value));
					}
					for line in extra {
						lines.push(format!("{line}  "));
					}
				}
				LessonBlock::Summary { text } => {
					lines.push(String::new());
					lines.push("## Summary".to_string());
					lines.push(format!("{text} . "));
				}
			}
		}

		lines.join("\n")
	}
}

/// A key phrase and its definition inside a vocabulary block
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Definition {
	pub key: String,
	pub value: String,
}

/// How a vocabulary section lays out its sets on the page
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum VocabLayout {
	ColsImages,
	RowsImages,
	Rows,
}

/// One structured block of lesson content, immutable once extracted.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum LessonBlock {
	Title {
		title: String,
		description: String,
	},
	Summary {
		text: String,
	},
	Vocabulary {
		layout: VocabLayout,
		title: String,
		definitions: Vec<Definition>,
		lines: Vec<String>,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn context_markdown_renders_all_block_kinds() {
		let mut activity = Activity::new("https://portal.example.com/app/x/1");
		activity.data.push(LessonBlock::Title {
			title: "Small talk".into(),
			description: "Learn to chat.".into(),
		});
		activity.data.push(LessonBlock::Vocabulary {
			layout: VocabLayout::Rows,
			title: "Key phrases".into(),
			definitions: vec![Definition {
				key: "break the ice".into(),
				value: "start a conversation".into(),
			}],
			lines: vec!["How are you?".into()],
		});
		activity.data.push(LessonBlock::Summary { text: "That was it".into() });

		let md = activity.context_markdown();
		assert!(md.starts_with("# Small talk"));
		assert!(md.contains("## Key phrases"));
		assert!(md.contains("- break the ice : start a conversation"));
		assert!(md.contains("## Summary"));
		assert!(md.contains("That was it ."));
	}

	#[test]
	fn all_answers_reused_skips_fresh_activity() {
		let activity = Activity::new("https://portal.example.com/app/x/1");
		assert!(!activity.all_answers_reused());
	}
}
