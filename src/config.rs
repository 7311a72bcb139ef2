use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    pub openai_api_key: String,
    pub table: String,
    pub bucket: String,
    pub transcription_language: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| value(key).ok_or(ConfigError::Missing(key));

        let bind_addr = value("BIND_ADDR").unwrap_or_else(|| {
            let port = value("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{}", port)
        });

        Ok(Self {
            supabase_url: required("SUPABASE_URL")?,
            supabase_key: required("SUPABASE_KEY")?,
            openai_api_key: required("OPENAI_API_KEY")?,
            table: value("SUPABASE_TABLE").unwrap_or_else(|| "checklists".to_string()),
            bucket: value("SUPABASE_BUCKET").unwrap_or_else(|| "checklist-files".to_string()),
            transcription_language: value("TRANSCRIPTION_LANGUAGE")
                .unwrap_or_else(|| "it".to_string()),
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_KEY", "anon"),
            ("OPENAI_API_KEY", "sk-test"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(config.table, "checklists");
        assert_eq!(config.bucket, "checklist-files");
        assert_eq!(config.transcription_language, "it");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_key_fails_fast() {
        let err = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_KEY", "   "),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("SUPABASE_KEY"));

        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SUPABASE_URL"));
    }
}
