use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::settings::Settings;

/// Namespace every projected key lives under
pub const PROPERTY_PREFIX: &str = "druid.";

/// Sparse `druid.*` property bag, ordered by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap(BTreeMap<String, String>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert `druid.<name>` when the value is present
    fn put<V: ToString>(&mut self, name: &str, value: Option<V>) {
        if let Some(value) = value {
            self.0
                .insert(format!("{}{}", PROPERTY_PREFIX, name), value.to_string());
        }
    }
}

impl FromIterator<(String, String)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PropertyMap {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl std::fmt::Display for PropertyMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.0 {
            writeln!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

/// Project settings into the property bag handed to the pool initializer.
///
/// Only the pool-tuning subset is forwarded. Identity, connection properties,
/// nested filter settings and dynamic routing are consumed elsewhere.
pub fn project(settings: &Settings) -> PropertyMap {
    let mut props = PropertyMap::new();

    props.put("testWhileIdle", Some(settings.test_while_idle));
    props.put("testOnBorrow", Some(settings.test_on_borrow));
    props.put("validationQuery", settings.validation_query.as_deref());
    props.put(
        "useGlobalDataSourceStat",
        Some(settings.use_global_data_source_stat),
    );
    // Proxied filters replace the alias list
    if !settings.proxy_filter {
        props.put("filters", settings.filters.as_deref());
    }
    props.put(
        "timeBetweenLogStatsMillis",
        settings.time_between_log_stats_millis,
    );
    // Legacy key name kept by the pool
    props.put("stat.sql.MaxSize", settings.stat_sql_max_size);
    props.put("clearFiltersEnable", Some(settings.clear_filters_enable));
    props.put("resetStatEnable", Some(settings.reset_stat_enable));
    props.put(
        "notFullTimeoutRetryCount",
        settings.not_full_timeout_retry_count,
    );
    props.put("maxWaitThreadCount", settings.max_wait_thread_count);
    props.put("failFast", Some(settings.fail_fast));
    props.put("phyTimeoutMillis", settings.phy_timeout_millis);
    props.put(
        "minEvictableIdleTimeMillis",
        settings.min_evictable_idle_time_millis,
    );
    props.put(
        "maxEvictableIdleTimeMillis",
        settings.max_evictable_idle_time_millis,
    );
    props.put("keepAlive", Some(settings.keep_alive));
    props.put(
        "poolPreparedStatements",
        Some(settings.pool_prepared_statements),
    );
    props.put("initVariants", Some(settings.init_variants));
    props.put("initGlobalVariants", Some(settings.init_global_variants));
    props.put("useUnfairLock", Some(settings.use_unfair_lock));
    props.put("initialSize", settings.initial_size);
    props.put(
        "killWhenSocketReadTimeout",
        Some(settings.kill_when_socket_read_timeout),
    );

    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DynamicDataSourceSetting;

    #[test]
    fn test_default_projection() {
        let props = project(&Settings::default());

        assert_eq!(props.get("druid.testWhileIdle"), Some("true"));
        assert_eq!(props.get("druid.testOnBorrow"), Some("false"));
        assert_eq!(props.get("druid.validationQuery"), Some("SELECT 1"));
        assert_eq!(props.get("druid.filters"), Some("mergeStat,wall,slf4j"));
        assert_eq!(props.get("druid.poolPreparedStatements"), Some("true"));
        assert_eq!(props.get("druid.initialSize"), Some("15"));
        assert_eq!(props.get("druid.minEvictableIdleTimeMillis"), Some("300000"));

        assert!(!props.contains_key("druid.maxEvictableIdleTimeMillis"));
        assert!(!props.contains_key("druid.phyTimeoutMillis"));
        assert!(!props.contains_key("druid.timeBetweenLogStatsMillis"));
        assert!(!props.contains_key("druid.stat.sql.MaxSize"));
        assert!(!props.contains_key("druid.notFullTimeoutRetryCount"));
        assert!(!props.contains_key("druid.maxWaitThreadCount"));

        // Twelve flags plus four defaulted values
        assert_eq!(props.len(), 16);
    }

    #[test]
    fn test_proxy_filter_suppresses_filters() {
        let mut settings = Settings::default();
        settings.proxy_filter = true;
        settings.filters = Some("stat".to_string());

        let props = project(&settings);
        assert!(!props.contains_key("druid.filters"));
        // Nothing else depends on the proxy flag
        assert_eq!(props.len(), 15);
        assert_eq!(props.get("druid.testWhileIdle"), Some("true"));
    }

    #[test]
    fn test_absent_filters_suppressed() {
        let mut settings = Settings::default();
        settings.filters = None;
        assert!(!project(&settings).contains_key("druid.filters"));
    }

    #[test]
    fn test_stat_sql_max_size_key() {
        let mut settings = Settings::default();
        settings.stat_sql_max_size = Some(1000);

        let props = project(&settings);
        assert_eq!(props.get("druid.stat.sql.MaxSize"), Some("1000"));
        assert!(!props.contains_key("druid.statSqlMaxSize"));
    }

    #[test]
    fn test_optional_values_forwarded_when_set() {
        let mut settings = Settings::default();
        settings.max_evictable_idle_time_millis = Some(900_000);
        settings.phy_timeout_millis = Some(-1);
        settings.time_between_log_stats_millis = Some(300_000);
        settings.not_full_timeout_retry_count = Some(2);
        settings.max_wait_thread_count = Some(0);
        settings.initial_size = Some(-3);
        settings.keep_alive = true;

        let props = project(&settings);
        assert_eq!(props.get("druid.maxEvictableIdleTimeMillis"), Some("900000"));
        assert_eq!(props.get("druid.phyTimeoutMillis"), Some("-1"));
        assert_eq!(props.get("druid.timeBetweenLogStatsMillis"), Some("300000"));
        assert_eq!(props.get("druid.notFullTimeoutRetryCount"), Some("2"));
        assert_eq!(props.get("druid.maxWaitThreadCount"), Some("0"));
        // Out-of-range values pass through untouched
        assert_eq!(props.get("druid.initialSize"), Some("-3"));
        assert_eq!(props.get("druid.keepAlive"), Some("true"));
    }

    #[test]
    fn test_unprojected_fields_never_appear() {
        let settings = Settings {
            driver_class_name: Some("com.mysql.cj.jdbc.Driver".to_string()),
            name: Some("primary".to_string()),
            url: Some("jdbc:mysql://localhost/app".to_string()),
            username: Some("app".to_string()),
            password: Some("secret".to_string()),
            max_active: Some(80),
            min_idle: Some(10),
            max_wait: Some(1000),
            dynamic: true,
            slaves: vec![DynamicDataSourceSetting {
                name: Some("replica".to_string()),
                ..Default::default()
            }],
            ..Settings::default()
        };

        let props = project(&settings);
        for key in [
            "druid.url",
            "druid.username",
            "druid.password",
            "druid.driverClassName",
            "druid.name",
            "druid.maxActive",
            "druid.minIdle",
            "druid.maxWait",
            "druid.dynamic",
            "druid.slaves",
            "druid.proxyFilter",
            "druid.connectionProperties",
        ] {
            assert!(!props.contains_key(key), "{} should not be projected", key);
        }
        assert!(props.iter().all(|(_, v)| v != "secret"));
        assert!(props.iter().all(|(k, _)| k.starts_with(PROPERTY_PREFIX)));
    }

    #[test]
    fn test_projection_is_stable() {
        let mut settings = Settings::default();
        settings.stat_sql_max_size = Some(500);

        let first = project(&settings);
        let second = settings.to_properties();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_display() {
        let props: PropertyMap = [
            ("druid.b".to_string(), "2".to_string()),
            ("druid.a".to_string(), "1".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(props.to_string(), "druid.a=1\ndruid.b=2\n");
    }
}
