//! Druid connection-pool settings
//!
//! This crate handles:
//! - Typed pool settings with Druid's defaults
//! - Binding settings from files and environment variables
//! - Projecting settings into the `druid.*` property bag the pool reads

pub mod dynamic;
pub mod error;
pub mod filter;
pub mod loader;
pub mod properties;
pub mod settings;

pub use dynamic::DynamicDataSourceSetting;
pub use error::{Error, Result};
pub use filter::{FilterAlias, LogFilterSettings, StatFilterSettings, WallFilterSettings};
pub use loader::SettingsLoader;
pub use properties::{project, PropertyMap, PROPERTY_PREFIX};
pub use settings::Settings;
