//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, CatalogConfig, GeminiConfig, LogFormat, LoggingConfig, PromptsConfig,
    RetryConfig, UsageConfig,
};
