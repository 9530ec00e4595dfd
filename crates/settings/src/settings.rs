use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

use crate::dynamic::DynamicDataSourceSetting;
use crate::filter::{self, FilterAlias, LogFilterSettings, StatFilterSettings, WallFilterSettings};
use crate::properties::{self, PropertyMap};
use crate::Result;

/// Druid data source settings.
///
/// Durations are milliseconds. `None` means "leave it to the pool's own default"
/// and is never forwarded to the pool.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether a pool should be created from these settings at all
    pub enabled: bool,

    // Connection identity, handed to the pool directly
    pub driver_class_name: Option<String>,
    /// Distinguishes data sources in monitoring output when several exist
    pub name: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Extra driver parameters. Binds from a table or from `k=v;k=v` text
    #[serde(deserialize_with = "deserialize_connection_properties")]
    pub connection_properties: BTreeMap<String, String>,

    // Pool sizing
    /// Physical connections opened on init or first borrow
    pub initial_size: Option<i32>,
    pub min_idle: Option<i32>,
    pub max_active: Option<i32>,

    // Timing
    /// Max wait for a connection. Setting it turns on the fair lock unless `use_unfair_lock` is set
    pub max_wait: Option<i64>,
    /// Interval of the destroy thread, also the idle threshold for `test_while_idle`
    pub time_between_eviction_runs_millis: Option<i64>,
    pub min_evictable_idle_time_millis: Option<i64>,
    pub max_evictable_idle_time_millis: Option<i64>,
    pub remove_abandoned: bool,
    pub remove_abandoned_timeout_millis: Option<i64>,
    pub phy_timeout_millis: Option<i64>,
    pub time_between_log_stats_millis: Option<i64>,

    // Validation
    /// Liveness query. Without it none of the `test_*` flags have any effect
    pub validation_query: Option<String>,
    pub test_while_idle: bool,
    pub test_on_borrow: bool,
    pub test_on_return: bool,

    // Statement cache
    pub pool_prepared_statements: bool,
    pub max_pool_prepared_statement_per_connection_size: Option<i32>,

    // Filters
    /// Comma-joined filter aliases, see [`FilterAlias`]
    pub filters: Option<String>,
    /// Filters are supplied by the caller as proxies; `filters` is not forwarded
    pub proxy_filter: bool,
    pub wall_filter: WallFilterSettings,
    pub stat_filter: StatFilterSettings,
    pub log_filter: LogFilterSettings,

    // Monitoring and operations
    pub use_global_data_source_stat: bool,
    pub stat_sql_max_size: Option<i32>,
    pub clear_filters_enable: bool,
    pub not_full_timeout_retry_count: Option<i32>,
    pub max_wait_thread_count: Option<i32>,
    pub fail_fast: bool,
    pub reset_stat_enable: bool,
    pub keep_alive: bool,
    pub init_variants: bool,
    pub init_global_variants: bool,
    pub use_unfair_lock: bool,
    pub kill_when_socket_read_timeout: bool,

    // Dynamic routing
    pub dynamic: bool,
    pub slaves: Vec<DynamicDataSourceSetting>,
}

/// Connection properties every new `Settings` starts with.
pub fn default_connection_properties() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("druid.stat.mergeSql".to_string(), "true".to_string()),
        ("druid.stat.slowSqlMillis".to_string(), "5000".to_string()),
    ])
}

/// Parse `k1=v1;k2=v2`. Segments without `=` are skipped.
pub fn parse_connection_properties(text: &str) -> BTreeMap<String, String> {
    text.split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

fn deserialize_connection_properties<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        // Untagged buffering keeps numbers and booleans typed
        Table(BTreeMap<String, serde_json::Value>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => parse_connection_properties(&text),
        Raw::Table(table) => table
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect(),
    })
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: false,
            driver_class_name: None,
            name: None,
            url: None,
            username: None,
            password: None,
            connection_properties: default_connection_properties(),
            initial_size: Some(15),
            min_idle: Some(5),
            max_active: Some(50),
            max_wait: Some(60_000),
            time_between_eviction_runs_millis: Some(60_000),
            min_evictable_idle_time_millis: Some(300_000),
            max_evictable_idle_time_millis: None,
            remove_abandoned: true,
            remove_abandoned_timeout_millis: Some(180_000),
            phy_timeout_millis: None,
            time_between_log_stats_millis: None,
            validation_query: Some("SELECT 1".to_string()),
            test_while_idle: true,
            test_on_borrow: false,
            test_on_return: false,
            pool_prepared_statements: true,
            max_pool_prepared_statement_per_connection_size: Some(20),
            filters: Some("mergeStat,wall,slf4j".to_string()),
            proxy_filter: false,
            wall_filter: WallFilterSettings::default(),
            stat_filter: StatFilterSettings::default(),
            log_filter: LogFilterSettings::default(),
            use_global_data_source_stat: false,
            stat_sql_max_size: None,
            clear_filters_enable: false,
            not_full_timeout_retry_count: None,
            max_wait_thread_count: None,
            fail_fast: false,
            reset_stat_enable: false,
            keep_alive: false,
            init_variants: false,
            init_global_variants: false,
            use_unfair_lock: false,
            kill_when_socket_read_timeout: false,
            dynamic: false,
            slaves: Vec::new(),
        }
    }
}

impl Settings {
    /// Project into the `druid.*` property bag
    pub fn to_properties(&self) -> PropertyMap {
        properties::project(self)
    }

    /// Parse `filters` into aliases. Absent filters give an empty list.
    pub fn filter_aliases(&self) -> Result<Vec<FilterAlias>> {
        match self.filters.as_deref() {
            Some(list) => filter::parse_filter_list(list),
            None => Ok(Vec::new()),
        }
    }

    /// Format: key1=value1;key2=value2
    pub fn connection_properties_string(&self) -> String {
        self.connection_properties
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("enabled", &self.enabled)
            .field("driver_class_name", &self.driver_class_name)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("connection_properties", &self.connection_properties)
            .field("initial_size", &self.initial_size)
            .field("min_idle", &self.min_idle)
            .field("max_active", &self.max_active)
            .field("max_wait", &self.max_wait)
            .field(
                "time_between_eviction_runs_millis",
                &self.time_between_eviction_runs_millis,
            )
            .field(
                "min_evictable_idle_time_millis",
                &self.min_evictable_idle_time_millis,
            )
            .field(
                "max_evictable_idle_time_millis",
                &self.max_evictable_idle_time_millis,
            )
            .field("remove_abandoned", &self.remove_abandoned)
            .field(
                "remove_abandoned_timeout_millis",
                &self.remove_abandoned_timeout_millis,
            )
            .field("phy_timeout_millis", &self.phy_timeout_millis)
            .field(
                "time_between_log_stats_millis",
                &self.time_between_log_stats_millis,
            )
            .field("validation_query", &self.validation_query)
            .field("test_while_idle", &self.test_while_idle)
            .field("test_on_borrow", &self.test_on_borrow)
            .field("test_on_return", &self.test_on_return)
            .field("pool_prepared_statements", &self.pool_prepared_statements)
            .field(
                "max_pool_prepared_statement_per_connection_size",
                &self.max_pool_prepared_statement_per_connection_size,
            )
            .field("filters", &self.filters)
            .field("proxy_filter", &self.proxy_filter)
            .field("wall_filter", &self.wall_filter)
            .field("stat_filter", &self.stat_filter)
            .field("log_filter", &self.log_filter)
            .field(
                "use_global_data_source_stat",
                &self.use_global_data_source_stat,
            )
            .field("stat_sql_max_size", &self.stat_sql_max_size)
            .field("clear_filters_enable", &self.clear_filters_enable)
            .field(
                "not_full_timeout_retry_count",
                &self.not_full_timeout_retry_count,
            )
            .field("max_wait_thread_count", &self.max_wait_thread_count)
            .field("fail_fast", &self.fail_fast)
            .field("reset_stat_enable", &self.reset_stat_enable)
            .field("keep_alive", &self.keep_alive)
            .field("init_variants", &self.init_variants)
            .field("init_global_variants", &self.init_global_variants)
            .field("use_unfair_lock", &self.use_unfair_lock)
            .field(
                "kill_when_socket_read_timeout",
                &self.kill_when_socket_read_timeout,
            )
            .field("dynamic", &self.dynamic)
            .field("slaves", &self.slaves)
            .finish()
    }
}
