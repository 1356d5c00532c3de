//! 应用配置
//!
//! 分层合并（优先级由低到高）：
//! 1. 代码内默认值
//! 2. `filings.yaml`（可选）
//! 3. 环境变量（`FILINGS_` 前缀，`__` 表示嵌套，如 `FILINGS_LOG__LEVEL=debug`）
//!
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handlers::analysis::AnalysisOptions;
use crate::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const CONFIG_FILE: &str = "filings.yaml";
pub const ENV_PREFIX: &str = "FILINGS_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid log level: {0}. must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("invalid default_page_size: {0}. must be between 1 and 100")]
    InvalidPageSize(u32),

    #[error("invalid max_section_chars: must be at least 1")]
    InvalidSectionLimit,

    #[error("failed to extract configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// 日志级别（trace, debug, info, warn, error）
    pub level: String,
    /// 输出格式（json, pretty）
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    /// 展示层未指定时使用的单页条数
    pub default_page_size: u32,
    pub analysis: AnalysisOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
            analysis: AnalysisOptions::default(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// 从工作目录的 `filings.yaml` 与环境变量加载配置
    pub fn load() -> Result<AppConfig, ConfigError> {
        Self::extract(Self::base().merge(Yaml::file(CONFIG_FILE)).merge(Self::env()))
    }

    /// 从指定文件与环境变量加载配置
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
        Self::extract(
            Self::base()
                .merge(Yaml::file(path.as_ref()))
                .merge(Self::env()),
        )
    }

    /// 从 YAML 字符串加载配置（不读取环境变量）
    pub fn from_yaml_str(yaml: &str) -> Result<AppConfig, ConfigError> {
        Self::extract(Self::base().merge(Yaml::string(yaml)))
    }

    pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        if !matches!(
            config.log.level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::InvalidLogLevel(config.log.level.clone()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&config.default_page_size) {
            return Err(ConfigError::InvalidPageSize(config.default_page_size));
        }
        if config.analysis.max_section_chars == 0 {
            return Err(ConfigError::InvalidSectionLimit);
        }
        Ok(())
    }

    fn base() -> Figment {
        Figment::new().merge(Serialized::defaults(AppConfig::default()))
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX).split("__")
    }

    fn extract(figment: Figment) -> Result<AppConfig, ConfigError> {
        let config: AppConfig = figment.extract().map_err(Box::new)?;
        Self::validate(&config)?;
        Ok(config)
    }
}
