use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Typed process configuration.
///
/// Loaded once at startup and passed around behind an `Arc`; business logic
/// never reads the environment directly.
#[derive(Clone, Debug)]
pub struct Config {
    /// Bot credential.
    pub telegram_bot_token: String,
    /// The private group applicants are admitted to.
    pub group_chat_id: i64,
    /// Administrators who receive and decide applications.
    pub admin_ids: Vec<i64>,
    /// Application record store location.
    pub store_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let group_chat_id = env_str("GROUP_CHAT_ID")
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                Error::Config("GROUP_CHAT_ID environment variable is required".to_string())
            })?;

        let admin_ids = parse_csv_i64(env_str("ADMIN_IDS"));
        if admin_ids.is_empty() {
            return Err(Error::Config(
                "ADMIN_IDS environment variable is required".to_string(),
            ));
        }

        let store_file = PathBuf::from(
            env_str("APPLICATION_STORE_FILE")
                .unwrap_or("/tmp/gatebot-applications.json".to_string()),
        );

        Ok(Self {
            telegram_bot_token,
            group_chat_id,
            admin_ids,
            store_file,
        })
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_admin_list_tolerates_spaces_and_blanks() {
        let parsed = parse_csv_i64(Some(" 7, 9 ,,13,notanid".to_string()));
        assert_eq!(parsed, vec![7, 9, 13]);
    }

    #[test]
    fn csv_admin_list_empty_when_unset() {
        assert!(parse_csv_i64(None).is_empty());
    }
}
