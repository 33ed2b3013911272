use std::path::PathBuf;
use std::str::FromStr;

use shuttle_runtime::SecretStore;

const DEFAULT_LEASE_SECONDS: i64 = 120;
const DEFAULT_SESSION_CACHE_CAPACITY: usize = 1000;
const DEFAULT_DOC_DIR: &str = "docs";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing secret: {0}")]
    Missing(&'static str),
    #[error("Invalid secret {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub turso: TursoConfig,
    pub dialogue: DialogueConfig,
    pub session: SessionConfig,
    pub doc: DocConfig,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig(pub String);

#[derive(Clone, Debug)]
pub struct TursoConfig {
    pub url: String,
    pub token: String,
}

#[derive(Clone, Debug)]
pub struct DialogueConfig {
    /// Seconds a reserved question stays protected from pickup by another moderator.
    pub lease_secs: i64,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Identity that is bootstrapped with the developer role on first contact.
    pub owner_username: String,
    pub cache_capacity: usize,
}

#[derive(Clone, Debug)]
pub struct DocConfig {
    pub dir: PathBuf,
}

pub fn build_config(secret_store: &SecretStore) -> Result<AppConfig, ConfigError> {
    build_config_from(|key| secret_store.get(key))
}

/// Builds the config from any key lookup so tests need no secret store.
pub fn build_config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig, ConfigError> {
    info!("Building AppConfig...");

    let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

    let config = AppConfig {
        telegram: TelegramConfig(required("TELEGRAM_BOT_TOKEN")?),
        turso: TursoConfig {
            url: required("TURSO_URL")?,
            token: required("TURSO_TOKEN")?,
        },
        dialogue: DialogueConfig {
            lease_secs: parse_or(&lookup, "LEASE_SECONDS", DEFAULT_LEASE_SECONDS)?,
        },
        session: SessionConfig {
            owner_username: required("OWNER_USERNAME")?.trim_start_matches('@').to_string(),
            cache_capacity: parse_or(&lookup, "SESSION_CACHE_CAPACITY", DEFAULT_SESSION_CACHE_CAPACITY)?,
        },
        doc: DocConfig {
            dir: PathBuf::from(lookup("DOC_DIR").unwrap_or_else(|| DEFAULT_DOC_DIR.to_string())),
        },
    };

    info!("AppConfig built");
    Ok(config)
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn secrets(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ("TURSO_URL", "libsql://example.turso.io"),
        ("TURSO_TOKEN", "token"),
        ("OWNER_USERNAME", "@owner"),
    ];

    #[test]
    fn test_defaults_apply() {
        let map = secrets(&REQUIRED);
        let config = build_config_from(|key| map.get(key).cloned()).unwrap();

        assert_eq!(config.dialogue.lease_secs, 120);
        assert_eq!(config.session.owner_username, "owner");
        assert_eq!(config.doc.dir, PathBuf::from("docs"));
    }

    #[test]
    fn test_missing_token_fails() {
        let map = secrets(&REQUIRED[1..]);
        let err = build_config_from(|key| map.get(key).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TELEGRAM_BOT_TOKEN")));
    }

    #[test]
    fn test_invalid_lease_fails() {
        let mut map = secrets(&REQUIRED);
        map.insert("LEASE_SECONDS".to_string(), "soon".to_string());
        let err = build_config_from(|key| map.get(key).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "LEASE_SECONDS", .. }));
    }
}
