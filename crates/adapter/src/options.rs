use std::fmt::{self, Debug};

use anyhow::Context;
use fromenv::FromEnv;

use crate::error::{Error, Result};

/// Options used to log in to the remote API.
///
/// This struct is used to load connection options from environment variables.
/// Every value defaults to empty so that missing settings are reported by
/// [`ConnectOptions::validate`] rather than by the loader.
#[derive(Clone, Default, FromEnv)]
pub struct ConnectOptions {
    /// Login endpoint, e.g. `https://login.salesforce.com`.
    #[env(from = "SF_LOGIN_URL", default = "")]
    pub login_url: String,

    /// Remote API version, e.g. `59.0`.
    #[env(from = "SF_API_VERSION", default = "")]
    pub api_version: String,

    /// Login user name.
    #[env(from = "SF_USERNAME", default = "")]
    pub username: String,

    /// Login password, including any security token.
    #[env(from = "SF_PASSWORD", default = "")]
    pub password: String,

    /// OAuth2 client id.
    #[env(from = "SF_CLIENT_ID", default = "")]
    pub client_id: String,

    /// OAuth2 client secret.
    #[env(from = "SF_CLIENT_SECRET", default = "")]
    pub client_secret: String,

    /// OAuth2 redirect URI.
    #[env(from = "SF_REDIRECT_URI", default = "")]
    pub redirect_uri: String,
}

impl ConnectOptions {
    /// Loads connection options from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment cannot be read.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_env().finalize().context("issue loading connection options")
    }

    /// Whether the login uses the OAuth2 flow.
    #[must_use]
    pub fn uses_oauth2(&self) -> bool {
        !self.client_id.is_empty() || !self.client_secret.is_empty()
    }

    /// Checks the settings required to log in are present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the missing settings.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("login URL", &self.login_url),
            ("API version", &self.api_version),
            ("username", &self.username),
            ("password", &self.password),
        ];
        let missing: Vec<&str> =
            required.iter().filter(|(_, value)| value.is_empty()).map(|(name, _)| *name).collect();

        if !missing.is_empty() {
            return Err(Error::Configuration(format!(
                "a login URL, API version, username and password are required to connect; missing {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

impl Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("login_url", &self.login_url)
            .field("api_version", &self.api_version)
            .field("username", &self.username)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}
