//! Portal login. The session cookie is checked first so repeated activities in
//! one browser session skip the credential form.

use std::time::Duration;

use chromiumoxide::Page;
use color_eyre::{Result, eyre::eyre};

use crate::{
	config::AppConfig,
	driver::{CdpDriver, PageDriver},
	selectors::{dashboard, login as sel},
};

pub const LOGIN_URL: &str = "https://portal.gofluent.com/app/login";
const SESSION_COOKIE: &str = "JSESSIONID";
const ELEMENT_WAIT: Duration = Duration::from_secs(15);

/// Make sure the browser holds an authenticated portal session, logging in
/// with the configured credentials when it does not.
pub async fn ensure_logged_in(driver: &CdpDriver, config: &AppConfig) -> Result<()> {
	if has_session_cookie(driver.page()).await? {
		tracing::debug!("session cookie present, skipping login");
		return Ok(());
	}

	tracing::info!("logging in as {}", config.username);
	driver.goto(LOGIN_URL).await?;

	let username = driver.wait_for(&sel::username_input(), ELEMENT_WAIT).await?;
	driver.type_text(&username, &config.username).await?;
	let password = driver.locate(&sel::password_input()).await?;
	driver.type_text(&password, &config.password).await?;
	let submit = driver.locate(&sel::submit_button()).await?;
	driver.click(&submit).await?;

	// The dashboard logo is the post-login landmark
	driver
		.wait_for(&dashboard::logo(), ELEMENT_WAIT)
		.await
		.map_err(|e| eyre!("login failed, the dashboard never appeared: {e}"))?;

	if !has_session_cookie(driver.page()).await? {
		return Err(eyre!("login failed: no session cookie after submitting credentials"));
	}

	tracing::info!("login complete");
	Ok(())
}

async fn has_session_cookie(page: &Page) -> Result<bool> {
	let cookies = page.get_cookies().await.map_err(|e| eyre!("failed to read cookies: {e}"))?;
	Ok(cookies.iter().any(|c| c.name == SESSION_COOKIE))
}
