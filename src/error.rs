//! 错误类型定义
//!
//! 引擎本身（扫描、分词、类型推断、注入）对任意输入都是全函数，不会返回错误；
//! 这里的错误只覆盖外围能力：配置文件读写、日志初始化以及 JSON 输出。

/// 库的结果类型
pub type Result<T> = std::result::Result<T, InjectError>;

/// 参数注入工具的错误类型
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件解析错误
    #[error("配置解析错误: {0}")]
    Toml(#[from] toml::de::Error),

    /// 配置序列化错误
    #[error("配置序列化错误: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// JSON 序列化错误（仅在启用 json feature 时可用）
    #[cfg(feature = "json")]
    #[error("JSON序列化错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 日志错误（仅在启用 logging feature 时可用）
    #[cfg(feature = "logging")]
    #[error("日志错误: {0}")]
    Log(#[from] crate::logging::LogError),
}

impl InjectError {
    /// 创建一个配置错误
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        {
            crate::logging::ensure_logger_initialized();
            tracing::error!("配置错误: {}", message);
        }
        Self::Config(message)
    }

    /// 检查是否为 IO 错误
    pub fn is_io_error(&self) -> bool {
        matches!(self, InjectError::Io(_))
    }

    /// 检查是否为配置错误（包括解析失败和校验失败）
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            InjectError::Config(_)
                | InjectError::Toml(_)
                | InjectError::TomlSer(_)
        )
    }
}
