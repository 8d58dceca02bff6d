use anyhow::Result;
use log::{debug, info};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::{oauth, token_store, tokens_file};
use crate::config::Config;

const GMAIL_SCOPE: &str = "https://mail.google.com/";

/// Lifetime assumed when the provider omits `expires_in`.
const DEFAULT_TTL_SECS: i64 = 3500;

#[derive(Clone)]
pub struct TokenManager {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub user_email: String,
}

impl TokenManager {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client_id = cfg.client_id.clone();
        let client_secret = token_store::load_client_secret(&client_id)?
            .or_else(|| std::env::var("OAUTH_CLIENT_SECRET").ok());

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: cfg.redirect_uri(),
            user_email: cfg.user_email()?,
        })
    }

    /// Returns a valid access token; refreshes/PKCE if needed.
    pub fn get_access_token(&self) -> Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

        if let Some(at) = tokens_file::load_tokens()?.and_then(|tf| tf.valid_at(now)) {
            debug!("using cached access token");
            return Ok(at);
        }

        let t = match token_store::load_refresh_token(&self.user_email)? {
            Some(rt) => {
                info!("access token expired, refreshing");
                oauth::refresh_access_token(&self.client_id, self.client_secret.as_deref(), &rt)?
            }
            None => {
                info!("no refresh token for {}, starting browser sign-in", self.user_email);
                oauth::perform_pkce_flow(
                    &self.client_id,
                    self.client_secret.as_deref(),
                    &self.redirect_uri,
                    GMAIL_SCOPE,
                    &self.user_email,
                )?
            }
        };

        let exp = t
            .expires_in
            .map(|s| now + s as i64)
            .unwrap_or(now + DEFAULT_TTL_SECS);
        tokens_file::save_tokens(Some(&t.access_token), Some(exp))?;
        Ok(t.access_token)
    }
}
