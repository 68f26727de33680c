//! Learning-tab retrieval: walk the lesson's sidebar sections and extract the
//! content blocks that later serve as inference context.

use std::time::Duration;

use chrono::NaiveDate;
use color_eyre::{Result, eyre::eyre};

use crate::{
	Activity, LessonBlock,
	driver::{CdpDriver, PageDriver},
	selectors::{activity as sel, nav},
};

const ELEMENT_WAIT: Duration = Duration::from_secs(10);
const SECTION_SETTLE: Duration = Duration::from_millis(500);

/// Extracted in-page: the portal renders lesson sections client-side, so one
/// script pass over `.section` nodes is both faster and more robust than
/// element-by-element scraping. Emits the serde shape of [`LessonBlock`].
const EXTRACT_SECTIONS_JS: &str = r#"
	(function() {
		const blocks = [];
		const clean = (node) => node ? node.textContent.trim() : '';

		for (const section of document.querySelectorAll('.section')) {
			const summary = section.querySelector('.Summary');
			if (summary) {
				blocks.push({ Summary: { text: clean(summary) } });
				continue;
			}

			const vocab = section.querySelector('.VocabularySet');
			if (vocab) {
				let layout = 'Rows';
				if (vocab.className.includes('VocabularySet_layout_cols-images')) layout = 'ColsImages';
				else if (vocab.className.includes('VocabularySet_layout_rows-images')) layout = 'RowsImages';

				const definitions = [];
				for (const item of vocab.querySelectorAll('.VocabularySet__item')) {
					const key = item.querySelector('.VocabularySet__key');
					const value = item.querySelector('.VocabularySet__value');
					if (key && value) definitions.push({ key: clean(key), value: clean(value) });
				}

				const lines = [];
				for (const line of vocab.querySelectorAll('.VocabularySet__line')) {
					const text = clean(line);
					if (text) lines.push(text);
				}

				blocks.push({ Vocabulary: {
					layout: layout,
					title: clean(section.querySelector('.section__title')),
					definitions: definitions,
					lines: lines,
				}});
				continue;
			}

			const title = section.querySelector('.section__title');
			if (title) {
				blocks.push({ Title: {
					title: clean(title),
					description: clean(section.querySelector('.section__description')),
				}});
			}
		}

		return JSON.stringify(blocks);
	})()
"#;

/// Navigate to the activity, open its learning tab and fill `activity.data`
/// with every section's content blocks.
pub async fn retrieve_lesson(driver: &CdpDriver, activity: &mut Activity) -> Result<()> {
	driver.goto(&activity.url).await?;
	driver.wait_for(&nav::container(), ELEMENT_WAIT).await?;
	let learn = driver.wait_for(&nav::learning_tab(), ELEMENT_WAIT).await?;
	driver.click(&learn).await?;
	tokio::time::sleep(SECTION_SETTLE).await;

	activity.completed = read_completed_date(driver).await;
	if let Some(date) = activity.completed {
		tracing::debug!(%date, "activity was already completed once");
	}

	let tabs = driver.locate_all(&sel::sidebar_tabs()).await?;
	if tabs.is_empty() {
		// Short lessons render every section on one page, without a sidebar
		activity.data.extend(extract_blocks(driver).await?);
	} else {
		tracing::debug!("lesson has {} sidebar sections", tabs.len());
		for tab in &tabs {
			driver.click(tab).await?;
			tokio::time::sleep(SECTION_SETTLE).await;
			activity.data.extend(extract_blocks(driver).await?);
		}
	}

	tracing::info!(url = %activity.url, blocks = activity.data.len(), "lesson content retrieved");
	Ok(())
}

async fn extract_blocks(driver: &CdpDriver) -> Result<Vec<LessonBlock>> {
	let result = driver
		.page()
		.evaluate(EXTRACT_SECTIONS_JS)
		.await
		.map_err(|e| eyre!("failed to extract lesson sections: {e}"))?;
	let json_str = result.value().and_then(|v| v.as_str()).unwrap_or("[]");
	serde_json::from_str(json_str).map_err(|e| eyre!("malformed lesson section payload: {e}"))
}

async fn read_completed_date(driver: &CdpDriver) -> Option<NaiveDate> {
	let header = driver.locate(&sel::completed_date()).await.ok()?;
	let text = driver.text(&header).await.ok()?;
	parse_completed_date(&text)
}

/// The header shows completion as `Completed on 12/31/2025`; absent or
/// unparsable text means the activity has not been completed yet.
fn parse_completed_date(text: &str) -> Option<NaiveDate> {
	let date = text.rsplit(' ').next()?;
	NaiveDate::parse_from_str(date, "%m/%d/%Y").ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Definition, VocabLayout};

	#[test]
	fn extraction_payload_deserializes_into_blocks() {
		let payload = r#"[
			{"Title": {"title": "Small talk", "description": "Learn to chat."}},
			{"Vocabulary": {"layout": "ColsImages", "title": "Key phrases",
				"definitions": [{"key": "break the ice", "value": "start a conversation"}],
				"lines": ["How are you?"]}},
			{"Summary": {"text": "That was it"}}
		]"#;

		let blocks: Vec<LessonBlock> = serde_json::from_str(payload).unwrap();
		assert_eq!(blocks.len(), 3);
		assert!(matches!(&blocks[0], LessonBlock::Title { title, .. } if title == "Small talk"));
		assert!(matches!(&blocks[1], LessonBlock::Vocabulary { layout: VocabLayout::ColsImages, definitions, .. }
			if definitions == &[Definition { key: "break the ice".into(), value: "start a conversation".into() }]));
		assert!(matches!(&blocks[2], LessonBlock::Summary { text } if text == "That was it"));
	}

	#[test]
	fn completed_date_parses_out_of_the_header_text() {
		assert_eq!(parse_completed_date("Completed on 12/31/2025"), NaiveDate::from_ymd_opt(2025, 12, 31));
		assert_eq!(parse_completed_date("In progress"), None);
		assert_eq!(parse_completed_date(""), None);
	}
}
