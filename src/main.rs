use chromiumoxide::browser::{Browser, BrowserConfig};
use clap::Parser;
use color_eyre::{Result, eyre::eyre};
use fluent_headless::{
	Activity,
	answer::AnswerSource,
	cache::UrlCache,
	config::{AppConfig, DEFAULT_CACHE_FILE, DEFAULT_INFERENCE_TIMEOUT_SECS},
	driver::CdpDriver,
	learning,
	llm::{AskLlmClient, InferenceClient},
	login,
	question::ClassifierMiss,
	session::{QuizOutcome, QuizSession},
};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fluent_headless")]
#[command(about = "Automated lesson-quiz resolution for the GoFluent portal", long_about = None)]
struct Args {
	/// Activity URLs to resolve
	#[arg(required = true)]
	urls: Vec<String>,

	/// Run with visible browser window (non-headless mode)
	#[arg(long)]
	visible: bool,

	/// Portal username; falls back to GOFLUENT_USERNAME from the environment or .env
	#[arg(short, long)]
	username: Option<String>,

	/// Portal password; falls back to GOFLUENT_PASSWORD from the environment or .env
	#[arg(short, long)]
	password: Option<String>,

	/// Path of the solved-URL cache file
	#[arg(long, default_value = DEFAULT_CACHE_FILE)]
	cache_file: String,

	/// Forget previously solved URLs before running
	#[arg(long)]
	reset_cache: bool,

	/// Per-call inference timeout in seconds
	#[arg(long, default_value_t = DEFAULT_INFERENCE_TIMEOUT_SECS)]
	inference_timeout: u64,
}

const PORTAL_PREFIX: &str = "https://portal.gofluent.com/";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();
	dotenv::dotenv().ok();

	let args = Args::parse();
	let config = AppConfig {
		username: credential(args.username, "GOFLUENT_USERNAME")?,
		password: credential(args.password, "GOFLUENT_PASSWORD")?,
		visible: args.visible,
		inference_timeout: std::time::Duration::from_secs(args.inference_timeout),
		cache_file: args.cache_file,
	};

	let mut cache = UrlCache::load(&config.cache_file)?;
	if args.reset_cache {
		cache.clear()?;
	}

	let browser_config = if config.visible {
		BrowserConfig::builder().with_head().build().map_err(|e| eyre!("failed to build browser config: {e}"))?
	} else {
		BrowserConfig::builder().build().map_err(|e| eyre!("failed to build browser config: {e}"))?
	};
	let (mut browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| eyre!("failed to launch browser: {e}"))?;
	let handle = tokio::spawn(async move {
		// Consume browser events to keep the CDP connection alive
		while handler.next().await.is_some() {}
	});

	let page = browser.new_page("about:blank").await.map_err(|e| eyre!("failed to open a page: {e}"))?;
	let driver = CdpDriver::new(page);
	let source = AnswerSource::new(AskLlmClient::new(config.inference_timeout));

	tokio::select! {
		result = run_activities(&driver, &source, &config, &mut cache, &args.urls) => result?,
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("interrupted, shutting the browser down");
		}
	}

	drop(driver);
	browser.close().await.map_err(|e| eyre!("failed to close browser: {e}"))?;
	handle.abort();
	Ok(())
}

fn credential(cli_value: Option<String>, env_var: &str) -> Result<String> {
	cli_value
		.or_else(|| std::env::var(env_var).ok())
		.filter(|v| !v.is_empty())
		.ok_or_else(|| eyre!("missing credential: pass it as a flag or set {env_var}"))
}

/// One activity failing (or turning out unsolvable) never aborts the rest of
/// the batch; only classifier misses are worth shouting about since they mean
/// the site changed its markup.
async fn run_activities<C: InferenceClient>(
	driver: &CdpDriver,
	source: &AnswerSource<C>,
	config: &AppConfig,
	cache: &mut UrlCache,
	urls: &[String],
) -> Result<()> {
	let mut solved = 0u32;
	let mut failed = 0u32;

	for url in urls {
		if !url.starts_with(PORTAL_PREFIX) {
			tracing::warn!(%url, "not a portal activity URL, skipping");
			continue;
		}
		if cache.contains(url) {
			tracing::info!(%url, "already solved on a previous run, skipping");
			continue;
		}

		let mut activity = Activity::new(url.clone());
		let result = resolve_activity(driver, source, config, &mut activity).await;
		settle_validity(&mut activity, &result);

		match result {
			Ok(()) if activity.valid == Some(true) => {
				cache.add(url)?;
				solved += 1;
			}
			Ok(()) => failed += 1,
			Err(e) => {
				if e.downcast_ref::<ClassifierMiss>().is_some() {
					tracing::error!(%url, "question markup no longer matches any known variant: {e}");
				} else {
					tracing::error!(%url, "activity failed: {e:#}");
				}
				failed += 1;
			}
		}
	}

	tracing::info!(solved, failed, "run finished");
	Ok(())
}

/// An activity that errored out partway is invalid too, not just one whose
/// quiz ran to a cache-exhausted end.
fn settle_validity(activity: &mut Activity, result: &Result<()>) {
	if result.is_err() {
		activity.valid = Some(false);
	}
}

async fn resolve_activity<C: InferenceClient>(driver: &CdpDriver, source: &AnswerSource<C>, config: &AppConfig, activity: &mut Activity) -> Result<()> {
	login::ensure_logged_in(driver, config).await?;
	learning::retrieve_lesson(driver, activity).await?;

	match QuizSession::new(driver, source).run(activity).await? {
		QuizOutcome::Mastered(score) => {
			activity.valid = Some(true);
			tracing::info!(url = %activity.url, score, "activity solved");
		}
		QuizOutcome::CacheExhausted => {
			activity.valid = Some(false);
			tracing::warn!(url = %activity.url, "quiz never reached the mastery score, leaving the activity unsolved");
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn errored_activities_are_marked_invalid() {
		let mut activity = Activity::new("https://portal.gofluent.com/app/x/1");
		settle_validity(&mut activity, &Err(eyre!("submit control missing")));
		assert_eq!(activity.valid, Some(false));
	}

	#[test]
	fn settled_outcomes_are_left_alone() {
		let mut activity = Activity::new("https://portal.gofluent.com/app/x/1");
		activity.valid = Some(true);
		settle_validity(&mut activity, &Ok(()));
		assert_eq!(activity.valid, Some(true));
	}
}
