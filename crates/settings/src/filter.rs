use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Error, Result};

/// Filter plugins the pool knows by alias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterAlias {
    Stat,
    MergeStat,
    Wall,
    Slf4j,
    Log4j,
    Log4j2,
    CommonsLog,
    Encoding,
    Config,
}

impl FilterAlias {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterAlias::Stat => "stat",
            FilterAlias::MergeStat => "mergeStat",
            FilterAlias::Wall => "wall",
            FilterAlias::Slf4j => "slf4j",
            FilterAlias::Log4j => "log4j",
            FilterAlias::Log4j2 => "log4j2",
            FilterAlias::CommonsLog => "commonlogging",
            FilterAlias::Encoding => "encoding",
            FilterAlias::Config => "config",
        }
    }

    /// True for the aliases backed by the statistics collector
    pub fn is_stat(&self) -> bool {
        matches!(self, FilterAlias::Stat | FilterAlias::MergeStat)
    }

    /// True for the aliases backed by a logging filter
    pub fn is_log(&self) -> bool {
        matches!(
            self,
            FilterAlias::Slf4j | FilterAlias::Log4j | FilterAlias::Log4j2 | FilterAlias::CommonsLog
        )
    }
}

impl FromStr for FilterAlias {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stat" => Ok(FilterAlias::Stat),
            "mergeStat" => Ok(FilterAlias::MergeStat),
            "wall" => Ok(FilterAlias::Wall),
            "slf4j" => Ok(FilterAlias::Slf4j),
            "log4j" => Ok(FilterAlias::Log4j),
            "log4j2" => Ok(FilterAlias::Log4j2),
            "commonlogging" | "commonLogging" => Ok(FilterAlias::CommonsLog),
            "encoding" => Ok(FilterAlias::Encoding),
            "config" => Ok(FilterAlias::Config),
            other => Err(Error::UnknownFilter(other.to_string())),
        }
    }
}

impl std::fmt::Display for FilterAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a comma-joined alias list, e.g. "mergeStat,wall,slf4j"
pub fn parse_filter_list(list: &str) -> Result<Vec<FilterAlias>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(FilterAlias::from_str)
        .collect()
}

/// SQL-injection guard (`wall`) settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallFilterSettings {
    pub db_type: Option<String>,
    pub log_violation: bool,
    pub throw_exception: bool,
    pub multi_statement_allow: bool,
    pub none_base_statement_allow: bool,
}

impl Default for WallFilterSettings {
    fn default() -> Self {
        Self {
            db_type: None,
            log_violation: false,
            throw_exception: true,
            multi_statement_allow: false,
            none_base_statement_allow: false,
        }
    }
}

/// Statistics collector (`stat` / `mergeStat`) settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatFilterSettings {
    pub db_type: Option<String>,
    pub merge_sql: bool,
    pub slow_sql_millis: i64,
    pub log_slow_sql: bool,
}

impl Default for StatFilterSettings {
    fn default() -> Self {
        Self {
            db_type: None,
            merge_sql: false,
            slow_sql_millis: 3000,
            log_slow_sql: false,
        }
    }
}

/// Logging filter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFilterSettings {
    pub data_source_log_enabled: bool,
    pub connection_log_enabled: bool,
    pub statement_log_enabled: bool,
    pub statement_executable_sql_log_enable: bool,
    pub result_set_log_enabled: bool,
    pub statement_log_error_enabled: bool,
}

impl Default for LogFilterSettings {
    fn default() -> Self {
        Self {
            data_source_log_enabled: true,
            connection_log_enabled: true,
            statement_log_enabled: true,
            statement_executable_sql_log_enable: false,
            result_set_log_enabled: true,
            statement_log_error_enabled: true,
        }
    }
}
