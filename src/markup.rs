//! Pure markup helpers for prompt rendering and ground-truth extraction.
//!
//! The quiz UI reveals state (gaps, option pools, the green "correct answer"
//! node) inside the question element's outer markup; these helpers normalize it
//! to plain text. Rendering is deterministic, so the same logical question always
//! produces the same prompt string, which is the answer-cache key.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder token substituted for interactive controls in rendered prompts
pub const GAP_MARKER: &str = "____";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static INPUT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<input\b[^>]*>").expect("valid regex"));
static BUTTON_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"(?s)<button\b[^>]*class="([^"]*)"[^>]*>(.*?)</button>"#).expect("valid regex"));
static GREEN_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"(?s)<p\b[^>]*style="[^"]*color:\s*green[^"]*"[^>]*>(.*?)</p>"#).expect("valid regex"));
static FRENCH_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?s)<(?:span|p|div)\b[^>]*class="[^"]*language_fr[^"]*"[^>]*>.*?</(?:span|p|div)>"#).expect("valid regex")
});
static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").expect("valid regex"));

/// Drop all tags, decode the handful of entities the portal emits and collapse
/// whitespace.
pub fn strip_tags(html: &str) -> String {
	let text = TAG_RE.replace_all(html, " ");
	let text = text
		.replace("&nbsp;", " ")
		.replace("&amp;", "&")
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'");
	WS_RE.replace_all(&text, " ").trim().to_string()
}

/// Text of the green "correct answer" node, if the site revealed one.
/// The French translation hint nested inside it is dropped first.
pub fn green_answer(html: &str) -> Option<String> {
	let caps = GREEN_RE.captures(html)?;
	let inner = FRENCH_RE.replace_all(&caps[1], " ");
	let text = strip_tags(&inner);
	if text.is_empty() { None } else { Some(text) }
}

/// Ground-truth answers are comma-joined when they span several tokens
pub fn split_ground_truth(answer: &str) -> Vec<String> {
	answer.split(", ").map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

/// Render a free-text fill-in-the-gaps question: every input becomes a gap marker.
pub fn render_text_gaps_prompt(html: &str) -> String {
	let html = INPUT_RE.replace_all(html, format!(" {GAP_MARKER} "));
	strip_tags(&html)
}

/// Render a pool-based question (fill-gap buttons, match-text, scrambled
/// sentence): answer slots become gap markers, pool buttons are pulled out of the
/// stem and appended as labeled option lines.
pub fn render_block_prompt(html: &str, option_class: &str) -> String {
	let options = extract_button_texts(html, option_class);

	let html = BUTTON_RE.replace_all(html, |caps: &regex::Captures| {
		if caps[1].contains("Stem__answer") {
			format!(" {GAP_MARKER} ")
		} else {
			// Pool buttons and controls are not part of the stem text
			" ".to_string()
		}
	});

	let mut prompt = strip_tags(&html);
	if !options.is_empty() {
		prompt.push_str("\nOptions :");
		for option in &options {
			prompt.push_str(&format!("\n- {option}"));
		}
	}
	prompt
}

/// Visible texts of every button carrying `class_token`, in document order.
pub fn extract_button_texts(html: &str, class_token: &str) -> Vec<String> {
	BUTTON_RE
		.captures_iter(html)
		.filter(|caps| caps[1].contains(class_token))
		.map(|caps| strip_tags(&caps[2]))
		.filter(|text| !text.is_empty())
		.collect()
}

/// Parse the quiz score percentage out of the results element's text.
pub fn parse_score(text: &str) -> Option<u32> {
	SCORE_RE.captures(text).and_then(|caps| caps[1].parse().ok())
}
