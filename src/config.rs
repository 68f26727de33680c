use std::time::Duration;

/// Runtime configuration, built in `main` from CLI args and `.env` values.
#[derive(Clone, Debug)]
pub struct AppConfig {
	pub username: String,
	pub password: String,
	/// Run with visible browser window (non-headless mode)
	pub visible: bool,
	/// Per-call timeout for the inference service; timeouts are retried without bound
	pub inference_timeout: Duration,
	/// Path of the attempted-activities dedup cache file
	pub cache_file: String,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			username: String::new(),
			password: String::new(),
			visible: false,
			inference_timeout: Duration::from_secs(DEFAULT_INFERENCE_TIMEOUT_SECS),
			cache_file: DEFAULT_CACHE_FILE.to_string(),
		}
	}
}

pub const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_CACHE_FILE: &str = "cache.txt";

/// The fixed mastery threshold: anything below triggers a retake.
pub const MASTERY_SCORE: u32 = 100;
