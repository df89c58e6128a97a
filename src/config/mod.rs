use anyhow::{bail, Context};

use crate::gsc::client::DEFAULT_API_BASE;
use crate::models::Account;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub gsc: GscConfig,
    pub accounts: Vec<Account>,
    pub default_range_days: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct GscConfig {
    pub api_base: String,
    pub request_timeout_secs: u64,
}

impl GscConfig {
    const fn default_timeout_secs() -> u64 {
        30
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let api_base =
            std::env::var("GSC_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(GscConfig::default_timeout_secs);

        let default_range_days = std::env::var("DEFAULT_RANGE_DAYS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(28);

        let accounts = load_accounts()?;

        Ok(Config {
            server: ServerConfig { host, port },
            gsc: GscConfig {
                api_base,
                request_timeout_secs,
            },
            accounts,
            default_range_days,
        })
    }
}

/// Accounts come from `SEARCHDECK_ACCOUNTS` (inline `email=token` pairs,
/// comma separated) or `SEARCHDECK_ACCOUNTS_FILE` (a JSON array of
/// `{email, token}` objects). Neither being set is fine; accounts can be
/// connected at runtime through the API.
fn load_accounts() -> anyhow::Result<Vec<Account>> {
    if let Ok(raw) = std::env::var("SEARCHDECK_ACCOUNTS") {
        return parse_accounts(&raw);
    }

    if let Ok(path) = std::env::var("SEARCHDECK_ACCOUNTS_FILE") {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read accounts file {path}"))?;
        let accounts: Vec<Account> = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse accounts file {path}"))?;
        return Ok(accounts);
    }

    Ok(Vec::new())
}

fn parse_accounts(raw: &str) -> anyhow::Result<Vec<Account>> {
    let mut accounts = Vec::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((email, token)) = pair.split_once('=') else {
            bail!("malformed SEARCHDECK_ACCOUNTS entry '{pair}', expected email=token");
        };
        if email.is_empty() || token.is_empty() {
            bail!("malformed SEARCHDECK_ACCOUNTS entry '{pair}', expected email=token");
        }
        accounts.push(Account {
            email: email.to_string(),
            token: token.to_string(),
        });
    }
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_account_pairs() {
        let accounts = parse_accounts("a@example.com=tok1, b@example.com=tok2").unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].email, "a@example.com");
        assert_eq!(accounts[0].token, "tok1");
        assert_eq!(accounts[1].email, "b@example.com");
    }

    #[test]
    fn rejects_malformed_account_pairs() {
        assert!(parse_accounts("a@example.com").is_err());
        assert!(parse_accounts("=tok").is_err());
        assert!(parse_accounts("a@example.com=").is_err());
    }

    #[test]
    fn empty_accounts_is_not_an_error() {
        assert!(parse_accounts("").unwrap().is_empty());
    }
}
