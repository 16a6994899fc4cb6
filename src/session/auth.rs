// Auth token access
//
// Only presence or absence of the token is consulted here; expiry, scopes,
// and the login flow itself belong to the portal. The wizard asks one
// question: is there a token right now?

use anyhow::Result;
use log::debug;
use std::path::PathBuf;
use url::Url;

use crate::forms::catalog::Service;
use crate::utils::logging::mask_sensitive;

pub trait TokenProvider: Send + Sync {
    /// The current token, trimmed; None when absent or blank.
    fn token(&self) -> Option<String>;

    fn has_token(&self) -> bool {
        self.token().is_some()
    }
}

/// Fixed token value; used by tests and by the TUI after a simulated login.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn token(&self) -> Option<String> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

/// Reads the token from a file under the data folder on every call, so a
/// login completed by another process is picked up without restarting.
#[derive(Debug)]
pub struct StoredTokenProvider {
    path: PathBuf,
}

impl StoredTokenProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn at_default_location() -> Result<Self> {
        let dir = crate::utils::path_resolver::resolve_data_folder()?;
        Ok(Self::new(dir.join("auth_token")))
    }

    /// Persist a token (the TUI's simulated login writes through this).
    pub fn store_token(&self, token: &str) -> Result<()> {
        std::fs::write(&self.path, token.trim())
            .map_err(|e| anyhow::anyhow!("Failed to write token file {:?}: {}", self.path, e))
    }

    pub fn clear_token(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to remove token file {:?}: {}",
                self.path,
                e
            )),
        }
    }
}

impl TokenProvider for StoredTokenProvider {
    fn token(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            return None;
        }
        debug!(
            "[PHASE: session] [STEP: token] Token present ({})",
            mask_sensitive(token)
        );
        Some(token.to_string())
    }
}

/// Build the portal login URL carrying the origin service and the step to
/// resume at after login.
pub fn login_redirect_url(
    portal_login_url: &str,
    service: Service,
    target_step: usize,
) -> Result<String> {
    let url = Url::parse_with_params(
        portal_login_url,
        &[
            ("redirect", service.slug()),
            ("step", target_step.to_string().as_str()),
        ],
    )
    .map_err(|e| anyhow::anyhow!("Invalid portal login URL '{}': {}", portal_login_url, e))?;
    Ok(url.into())
}
