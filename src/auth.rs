//! Login to the site.
//!
//! The login form is protected by a CSRF token rendered into every page as
//! `<input name="_csrf_token">`. Login posts `email`, `password`, the token
//! and `remember_me` to `/login_check`; the session cookie lands in the
//! fetcher's cookie jar.

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{DafilmsError, Result};
use crate::http_client::{PageFetcher, RequestKind};
use crate::stream::PageDocument;

/// Text only rendered for signed-in users.
const LOGOUT_MARKERS: &[&str] = &["Odhlásit", "logout"];
/// Text rendered on the anonymous page.
const LOGIN_MARKERS: &[&str] = &["Přihlásit", "login"];

/// Extract the CSRF token value from a page.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let document = PageDocument::parse(html);
    let inputs = document.select("input[name=_csrf_token]").ok()?;
    inputs
        .first()
        .and_then(|input| input.attr("value"))
        .map(str::to_string)
}

/// How a login response reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginVerdict {
    LoggedIn,
    Rejected,
    /// Neither marker present: check a protected page.
    Unclear,
}

/// Classify the page returned by `/login_check`.
pub fn classify_login_response(body: &str) -> LoginVerdict {
    if LOGOUT_MARKERS.iter().any(|m| body.contains(m)) {
        LoginVerdict::LoggedIn
    } else if LOGIN_MARKERS.iter().any(|m| body.contains(m)) {
        LoginVerdict::Rejected
    } else {
        LoginVerdict::Unclear
    }
}

/// Login state for one run.
#[derive(Debug, Default)]
pub struct Session {
    logged_in: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Log in with explicit credentials.
    pub async fn login(
        &mut self,
        fetcher: &dyn PageFetcher,
        settings: &Settings,
        username: &str,
        password: &str,
    ) -> Result<()> {
        let token = self.fetch_csrf_token(fetcher, settings).await?;

        let fields = [
            ("email", username),
            ("password", password),
            ("_csrf_token", token.as_str()),
            ("remember_me", "on"),
        ];
        let response = fetcher
            .post_form(&settings.url("/login_check"), &fields)
            .await?;

        if !response.is_success() {
            warn!(status = %response.status, "Login post rejected");
            return Err(DafilmsError::LoginFailed(format!("HTTP {}", response.status)));
        }

        let verdict = match classify_login_response(&response.body) {
            LoginVerdict::Unclear => {
                debug!("Login response inconclusive, probing catalog");
                let check = fetcher.get(&settings.url("/film"), RequestKind::Document).await?;
                if check.is_success() {
                    LoginVerdict::LoggedIn
                } else {
                    LoginVerdict::Rejected
                }
            }
            verdict => verdict,
        };

        if verdict == LoginVerdict::LoggedIn {
            info!("Logged in");
            self.logged_in = true;
            Ok(())
        } else {
            self.logged_in = false;
            Err(DafilmsError::LoginFailed("credentials rejected".into()))
        }
    }

    /// Log in with configured credentials unless already logged in.
    pub async fn ensure_logged_in(&mut self, fetcher: &dyn PageFetcher, settings: &Settings) -> Result<()> {
        if self.logged_in {
            return Ok(());
        }
        let (username, password) = settings.credentials().ok_or(DafilmsError::LoginRequired)?;
        self.login(fetcher, settings, username, password).await
    }

    /// The token is on the home page; the catalog page is the fallback.
    async fn fetch_csrf_token(&self, fetcher: &dyn PageFetcher, settings: &Settings) -> Result<String> {
        for path in ["/", "/film"] {
            let page = fetcher.get_ok(&settings.url(path), RequestKind::Document).await?;
            if let Some(token) = extract_csrf_token(&page.body) {
                return Ok(token);
            }
            debug!(path, "No CSRF token on page");
        }
        Err(DafilmsError::LoginFailed("CSRF token not found".into()))
    }
}
