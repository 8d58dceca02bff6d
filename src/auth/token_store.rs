use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

const SERVICE: &str = "gmail_snooze";

fn save(key: &str, secret: &str) -> Result<()> {
    Entry::new(SERVICE, key)?
        .set_password(secret)
        .map_err(|e| anyhow!(e.to_string()))
}

fn load(key: &str) -> Result<Option<String>> {
    match Entry::new(SERVICE, key)?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

/// Save a refresh token into the OS keyring for the given username (email)
pub fn save_refresh_token(username: &str, refresh_token: &str) -> Result<()> {
    save(username, refresh_token)
}

pub fn load_refresh_token(username: &str) -> Result<Option<String>> {
    load(username)
}

/// Client secrets are keyed by client_id
pub fn save_client_secret(client_id: &str, client_secret: &str) -> Result<()> {
    save(client_id, client_secret)
}

pub fn load_client_secret(client_id: &str) -> Result<Option<String>> {
    load(client_id)
}
