use anyhow::Result;
use druid_codec::CodecType;
use druid_settings::loader::DEFAULT_ENV_PREFIX;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Settings file; optional when absent from the environment
    pub settings_path: Option<PathBuf>,
    pub format: CodecType,
    pub env_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Config {
            settings_path: lookup("DRUID_PROPS_CONFIG").map(PathBuf::from),
            format: lookup("DRUID_PROPS_FORMAT")
                .unwrap_or_else(|| "properties".to_string())
                .parse()?,
            env_prefix: lookup("DRUID_PROPS_ENV_PREFIX")
                .unwrap_or_else(|| DEFAULT_ENV_PREFIX.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.settings_path, None);
        assert_eq!(config.format, CodecType::Properties);
        assert_eq!(config.env_prefix, "DRUID");
    }

    #[test]
    fn test_overrides() {
        let vars = HashMap::from([
            ("DRUID_PROPS_CONFIG", "conf/druid.yaml"),
            ("DRUID_PROPS_FORMAT", "json"),
            ("DRUID_PROPS_ENV_PREFIX", "POOL"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.settings_path, Some(PathBuf::from("conf/druid.yaml")));
        assert_eq!(config.format, CodecType::Json);
        assert_eq!(config.env_prefix, "POOL");
    }

    #[test]
    fn test_bad_format() {
        let result = Config::from_lookup(|key| {
            (key == "DRUID_PROPS_FORMAT").then(|| "xml".to_string())
        });
        assert!(result.is_err());
    }
}
