//! # Configuration Module
//!
//! Endpoint and credential configuration from the environment
//!
//! ## Key Components
//! - [`Config`] - Resolved configuration for the external collaborators
//! - [`Config::from_env`] - Read SOLAROPS_* environment variables

use std::path::PathBuf;

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    /// Spreadsheet gateway (lead/expense store + Google Ads relay).
    pub sheets_url: String,
    /// Meta Graph API credentials.
    pub fb_access_token: String,
    pub fb_ad_account: String,
    pub fb_page: String,
    /// Where the persistent geocode cache lives.
    pub cache_dir: PathBuf,
}

fn env_or_default(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

impl Config {
    pub fn from_env(sheets_override: Option<String>) -> Self {
        let cache_dir = std::env::var("SOLAROPS_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("/"))
                    .join(".solarops")
            });

        Self {
            sheets_url: sheets_override
                .unwrap_or_else(|| env_or_default("SOLAROPS_SHEETS_URL")),
            fb_access_token: env_or_default("SOLAROPS_FB_ACCESS_TOKEN"),
            fb_ad_account: env_or_default("SOLAROPS_FB_AD_ACCOUNT"),
            fb_page: env_or_default("SOLAROPS_FB_PAGE"),
            cache_dir,
        }
    }

    /// The sheet is the system of record for leads; commands that read it
    /// cannot run without the URL.
    pub fn require_sheets(&self) -> Result<()> {
        if self.sheets_url.is_empty() {
            anyhow::bail!(
                "No spreadsheet gateway configured. Set SOLAROPS_SHEETS_URL or pass --sheets-url."
            );
        }
        Ok(())
    }

    /// Ad credentials are optional: without them spend fetches degrade to
    /// zeros. Commands that are meaningless without Meta data call this.
    pub fn require_facebook(&self) -> Result<()> {
        if self.fb_access_token.is_empty() || self.fb_ad_account.is_empty() {
            anyhow::bail!(
                "Meta Ads access is not configured. Set SOLAROPS_FB_ACCESS_TOKEN and SOLAROPS_FB_AD_ACCOUNT."
            );
        }
        Ok(())
    }

    pub fn has_facebook(&self) -> bool {
        !self.fb_access_token.is_empty() && !self.fb_ad_account.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let cfg = Config::from_env(Some("https://example.test/gateway".to_string()));
        assert_eq!(cfg.sheets_url, "https://example.test/gateway");
        assert!(cfg.require_sheets().is_ok());
    }

    #[test]
    fn test_missing_sheets_url_is_an_error() {
        let cfg = Config {
            sheets_url: String::new(),
            fb_access_token: String::new(),
            fb_ad_account: String::new(),
            fb_page: String::new(),
            cache_dir: PathBuf::from("/tmp"),
        };
        assert!(cfg.require_sheets().is_err());
        assert!(cfg.require_facebook().is_err());
        assert!(!cfg.has_facebook());
    }
}
