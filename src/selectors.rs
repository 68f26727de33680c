//! The fixed site-specific locator contract.
//!
//! Literal selector values are not design freedom: they mirror the portal's
//! markup and change only when the site does.

use crate::driver::Locator;

/// Strip double quotes so a candidate token can be inlined into an xpath literal.
pub fn escape(value: &str) -> String {
	value.replace('"', "")
}

pub mod login {
	use super::*;

	pub fn username_input() -> Locator {
		Locator::css(r#"input[name="username"]"#)
	}

	pub fn password_input() -> Locator {
		Locator::css(r#"input[name="password"]"#)
	}

	pub fn submit_button() -> Locator {
		Locator::xpath("/html/body/div/div/div/div/div[2]/form/div/div[2]/button")
	}
}

pub mod dashboard {
	use super::*;

	pub fn logo() -> Locator {
		Locator::css(".header__logo")
	}
}

pub mod nav {
	use super::*;

	pub fn container() -> Locator {
		Locator::css(".tabs")
	}

	pub fn learning_tab() -> Locator {
		Locator::css("#learn")
	}

	pub fn quiz_tab() -> Locator {
		Locator::css("#practice")
	}
}

pub mod activity {
	use super::*;

	pub fn sidebar_tabs() -> Locator {
		Locator::css(".HowtoNavigationSidebar__list > .HowtoNavigationSidebar__item")
	}

	pub fn completed_date() -> Locator {
		Locator::css(".ActivityHeader__completed-date")
	}
}

pub mod quiz {
	use super::*;

	pub fn question() -> Locator {
		Locator::css(".Question")
	}

	pub fn submit() -> Locator {
		Locator::css(".Question__submit")
	}

	pub fn next() -> Locator {
		Locator::css(".Question__next")
	}

	pub fn retake() -> Locator {
		Locator::css(".QuizResults__retake")
	}

	pub fn score_value() -> Locator {
		Locator::css(".QuizResults__value")
	}

	// -- multiple choice (text and picture output) --

	pub fn correct_option() -> Locator {
		Locator::css(".Question__option.Question__option_correct_yes")
	}

	pub fn correct_option_image() -> Locator {
		Locator::css(".Question__option.Question__option_correct_yes img")
	}

	pub fn option_with_text(value: &str) -> Locator {
		Locator::xpath(format!(
			r#"//button[contains(@class,"Question__option")]//*[contains(text(), "{}")]/.."#,
			escape(value)
		))
	}

	pub fn option_with_image(src: &str) -> Locator {
		Locator::xpath(format!(
			r#"//button[contains(@class,"Question__option")]//*[contains(@src, "{}")]/.."#,
			escape(src)
		))
	}

	pub fn any_option() -> Locator {
		Locator::xpath(r#"//button[contains(@class,"Question__option")]"#)
	}

	// -- scrambled letters --

	pub fn unselected_letter(value: &str) -> Locator {
		let value = escape(value);
		Locator::xpath(format!(
			concat!(
				r#"//*[contains(@class,"Question_type_scrambled-letters__unselected-box")]"#,
				r#"//button[contains(@class,"ScrambledLettersOption") and (contains(text(), "{}") or contains(text(), "{}"))]"#,
			),
			value.to_uppercase(),
			value.to_lowercase()
		))
	}

	pub fn any_unselected_letter() -> Locator {
		Locator::xpath(concat!(
			r#"//*[contains(@class,"Question_type_scrambled-letters__unselected-box")]"#,
			r#"//button[contains(@class,"ScrambledLettersOption")]"#,
		))
	}

	pub fn correct_letters_block() -> Locator {
		Locator::css(".Question_type_scrambled-letters__correct-answer-block > div")
	}

	// -- scrambled sentence --

	pub fn unselected_piece(value: &str) -> Locator {
		Locator::xpath(format!(
			concat!(
				r#"//*[contains(@class,"Question_type_scrambled-sentence__unselected-box")]"#,
				r#"//button[contains(@class,"ScrambledSentenceOption") and contains(text(), "{}")]"#,
			),
			escape(value)
		))
	}

	pub fn any_unselected_piece() -> Locator {
		Locator::xpath(concat!(
			r#"//*[contains(@class,"Question_type_scrambled-sentence__unselected-box")]"#,
			r#"//button[contains(@class,"ScrambledSentenceOption")]"#,
		))
	}

	// -- fill-in-the-gaps (button pool) and match-text --

	pub fn unselected_fill_button(value: &str) -> Locator {
		Locator::xpath(format!(
			concat!(
				r#"//button[contains(@class, "Question__fill-button")"#,
				r#" and not(contains(@class, "Question__fill-button_selected_yes")) and contains(text(), "{}")]"#,
			),
			escape(value)
		))
	}

	pub fn any_unselected_fill_button() -> Locator {
		Locator::xpath(concat!(
			r#"//*[contains(@class,"Question__fill-button")"#,
			r#" and not(contains(@class, "Question__fill-button_selected_yes"))]"#,
		))
	}

	// -- fill-in-the-gaps (free text) and short answer --

	pub fn gap_inputs() -> Locator {
		Locator::css("input.Stem__answer_non-arabic")
	}

	pub fn short_answer_input() -> Locator {
		Locator::css("textarea.Stem__answer_non-arabic")
	}

	pub fn short_answer_stem() -> Locator {
		Locator::css(".Stem__answer-block-text")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn escape_strips_double_quotes() {
		assert_eq!(escape(r#"say "hello""#), "say hello");
	}

	#[test]
	fn dynamic_locators_inline_the_needle() {
		let loc = quiz::option_with_text("Lyon");
		assert!(loc.query.contains(r#"contains(text(), "Lyon")"#));

		let loc = quiz::unselected_letter("a");
		assert!(loc.query.contains(r#"contains(text(), "A")"#));
		assert!(loc.query.contains(r#"contains(text(), "a")"#));
	}
}
