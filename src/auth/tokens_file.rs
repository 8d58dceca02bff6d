use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::config::config_dir;

/// Non-secret access token cache stored next to config.toml
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokensFile {
    pub access_token: Option<String>,
    pub expires_at_epoch: Option<i64>, // epoch seconds
}

impl TokensFile {
    /// The cached token, if it is still valid at `now`.
    pub fn valid_at(self, now: i64) -> Option<String> {
        match (self.access_token, self.expires_at_epoch) {
            (Some(at), Some(exp)) if now < exp => Some(at),
            _ => None,
        }
    }
}

fn tokens_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("tokens.json"))
}

pub fn save_tokens(access_token: Option<&str>, expires_at_epoch: Option<i64>) -> Result<()> {
    let tf = TokensFile {
        access_token: access_token.map(|s| s.to_string()),
        expires_at_epoch,
    };
    fs::write(tokens_path()?, serde_json::to_string_pretty(&tf)?)?;
    Ok(())
}

pub fn load_tokens() -> Result<Option<TokensFile>> {
    let p = tokens_path()?;
    if !p.exists() {
        return Ok(None);
    }
    let tf: TokensFile = serde_json::from_str(&fs::read_to_string(&p)?)?;
    Ok(Some(tf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_token_expires() {
        let tf = || TokensFile {
            access_token: Some("tok".to_string()),
            expires_at_epoch: Some(100),
        };
        assert_eq!(Some("tok".to_string()), tf().valid_at(99));
        assert_eq!(None, tf().valid_at(100));
        assert_eq!(None, TokensFile::default().valid_at(0));
    }

    #[test]
    fn parses_cache_json() {
        let tf: TokensFile =
            serde_json::from_str(r#"{"access_token":"tok","expires_at_epoch":42}"#).unwrap();
        assert_eq!(Some(42), tf.expires_at_epoch);
    }
}
