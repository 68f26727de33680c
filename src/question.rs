//! Question variants and the class-set classifier.

use crate::driver::ElementId;

/// The closed set of question variants the portal's quiz UI can render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionKind {
	/// Single- or multi-select options with visible text (true-or-false is the
	/// 2-option single-select special case)
	MultiChoiceText { multiple: bool },
	/// Options are pictures; answered blind, flagged skip-completion
	MultiChoiceImage,
	ScrambledLetters,
	ScrambledSentence,
	MatchText,
	/// Free-text inputs embedded in the stem
	FillGapsText,
	/// Button pool feeding answer slots in the stem
	FillGapsBlock,
	ShortText,
}

impl QuestionKind {
	pub fn label(&self) -> &'static str {
		match self {
			QuestionKind::MultiChoiceText { multiple: false } => "Multiple choice text question",
			QuestionKind::MultiChoiceText { multiple: true } => "Multiple choice text question (multiple)",
			QuestionKind::MultiChoiceImage => "Multiple choice image question",
			QuestionKind::ScrambledLetters => "Scrambled letters question",
			QuestionKind::ScrambledSentence => "Scrambled sentences question",
			QuestionKind::MatchText => "Match text block question",
			QuestionKind::FillGapsText => "Fill in gaps text question",
			QuestionKind::FillGapsBlock => "Fill in gaps block question",
			QuestionKind::ShortText => "Short answer text question",
		}
	}

	/// Picture questions cannot be verified from text context, so inference is
	/// skipped entirely for them.
	pub fn skip_completion(&self) -> bool {
		matches!(self, QuestionKind::MultiChoiceImage)
	}
}

const TYPE_MULTI_CHOICE: &str = "Question_type_multiple-choice";
const TYPE_TRUE_OR_FALSE: &str = "Question_type_true-or-false";
const TYPE_SCRAMBLED_LETTERS: &str = "Question_type_scrambled-letters";
const TYPE_SCRAMBLED_SENTENCE: &str = "Question_type_scrambled-sentence";
const TYPE_MATCH_TEXT: &str = "Question_type_match-text";
const TYPE_FILL_GAPS: &str = "Question_type_fill-in-the-gaps";
const TYPE_SHORT_ANSWER: &str = "Question_type_short-answer";

const OUTPUT_TEXT: &str = "Question_output_text";
const OUTPUT_TEXT_MULTIPLE: &str = "Question_output_text-multiple";
const OUTPUT_TEXT_BLOCKS: &str = "Question_output_text-blocks";
const OUTPUT_PICTURE: &str = "Question_output_picture";

struct Rule {
	required: &'static [&'static str],
	kind: QuestionKind,
}

/// type class × output-shape class → variant. First full-subset match wins; the
/// combinations are mutually exclusive by construction, so adding a new site
/// markup variant is a new row, not a rewrite.
const CLASSIFIER: &[Rule] = &[
	Rule { required: &[TYPE_MULTI_CHOICE, OUTPUT_TEXT], kind: QuestionKind::MultiChoiceText { multiple: false } },
	Rule { required: &[TYPE_MULTI_CHOICE, OUTPUT_TEXT_MULTIPLE], kind: QuestionKind::MultiChoiceText { multiple: true } },
	Rule { required: &[TYPE_TRUE_OR_FALSE, OUTPUT_TEXT], kind: QuestionKind::MultiChoiceText { multiple: false } },
	Rule { required: &[TYPE_SCRAMBLED_LETTERS, OUTPUT_TEXT], kind: QuestionKind::ScrambledLetters },
	Rule { required: &[TYPE_SCRAMBLED_SENTENCE, OUTPUT_TEXT_BLOCKS], kind: QuestionKind::ScrambledSentence },
	Rule { required: &[TYPE_MATCH_TEXT, OUTPUT_TEXT_BLOCKS], kind: QuestionKind::MatchText },
	Rule { required: &[TYPE_FILL_GAPS, OUTPUT_TEXT], kind: QuestionKind::FillGapsText },
	Rule { required: &[TYPE_FILL_GAPS, OUTPUT_TEXT_BLOCKS], kind: QuestionKind::FillGapsBlock },
	Rule { required: &[TYPE_SHORT_ANSWER, OUTPUT_TEXT], kind: QuestionKind::ShortText },
	Rule { required: &[TYPE_MULTI_CHOICE, OUTPUT_PICTURE], kind: QuestionKind::MultiChoiceImage },
];

/// Map a question element's class attribute to its variant.
/// Returns `None` for any class set outside the known table; the session treats
/// that as fatal rather than guessing at an unknown control.
pub fn classify(class_attr: &str) -> Option<QuestionKind> {
	let classes: Vec<&str> = class_attr.split_whitespace().collect();
	CLASSIFIER
		.iter()
		.find(|rule| rule.required.iter().all(|c| classes.contains(c)))
		.map(|rule| rule.kind)
}

/// Fatal classification failure: the site's markup contract has changed.
#[derive(Debug, thiserror::Error)]
#[error("no question variant matches class set [{0}]")]
pub struct ClassifierMiss(pub String);

/// One quiz question, bound to its live UI element.
///
/// Instantiated fresh each time a question element appears; when the same prompt
/// text recurs after a retake the prior record is rebound to the new element
/// instead of being duplicated. That record is the per-activity answer cache.
#[derive(Clone, Debug)]
pub struct Question {
	pub kind: QuestionKind,
	pub element: ElementId,
	/// Rendered prompt text, captured before any UI mutation; the cache key
	pub prompt: String,
	/// Last submitted (or revealed ground-truth) answer tokens
	pub answer: Vec<String>,
	pub cache_used: bool,
	pub first_use: bool,
	pub skip_completion: bool,
}

impl Question {
	pub fn new(kind: QuestionKind, element: ElementId) -> Self {
		Self {
			kind,
			element,
			prompt: String::new(),
			answer: Vec::new(),
			cache_used: false,
			first_use: true,
			skip_completion: kind.skip_completion(),
		}
	}

	/// Point an already-recorded question at the freshly rendered element.
	pub fn rebind(&mut self, element: ElementId) {
		self.element = element;
		self.first_use = false;
	}
}
