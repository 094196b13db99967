//! 配置管理模块
//!
//! 提供 TOML 配置文件的读取、保存和校验。所有字段都有默认值，
//! 配置文件可以只写需要修改的部分。
//!
//! ```toml
//! [log]
//! level = "debug"
//! log_dir = "logs"
//!
//! [engine]
//! debug = true
//! lookahead = 20
//! allow_headerless = false
//! ```

use crate::error::{InjectError, Result};
use crate::sqllog::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// 向前查找窗口允许的最大行数
pub const MAX_LOOKAHEAD: usize = 100;

/// 主配置结构体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 日志配置
    pub log: LogSection,
    /// 引擎配置
    pub engine: EngineConfig,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
    /// 日志输出目录，不配置时只输出到控制台
    pub log_dir: Option<String>,
}

impl Default for LogSection {
    fn default() -> Self {
        Self { level: "warn".to_string(), log_dir: None }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        match self.log.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(InjectError::config_error(format!(
                    "无效的日志级别: {}",
                    self.log.level
                )));
            }
        }

        if self.engine.lookahead == 0 || self.engine.lookahead > MAX_LOOKAHEAD
        {
            return Err(InjectError::config_error(format!(
                "lookahead 必须在 1..={MAX_LOOKAHEAD} 之间: {}",
                self.engine.lookahead
            )));
        }

        Ok(())
    }

    /// 转换为日志初始化配置；引擎开启 debug 时级别至少为 trace
    #[cfg(feature = "logging")]
    pub fn log_config(&self) -> crate::logging::LogConfig {
        let level = if self.engine.debug {
            tracing::Level::TRACE
        } else {
            crate::logging::parse_level(&self.log.level)
                .unwrap_or(tracing::Level::WARN)
        };
        crate::logging::LogConfig { level, log_dir: self.log.log_dir.clone() }
    }
}

impl FromStr for Config {
    type Err = InjectError;

    /// 从字符串加载配置并校验
    fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
