//! 引擎各阶段共享的数据类型

use serde::{Deserialize, Serialize};

/// 默认的向前查找窗口（行数）
pub const DEFAULT_LOOKAHEAD: usize = 10;

/// 从日志文本中定位到的一条 SQL 记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// 拼接后的 SQL，已去除首尾空白和末尾分号，保证非空
    pub sql: String,
    /// 原始参数字面量，例如 `('Alice', 25, True)`
    pub parameters: Option<String>,
    /// SQL 起始行的下标（从 0 开始，仅用于诊断）
    pub source_line: usize,
}

/// 解码后的单个参数值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum ParameterValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    /// 字典形式参数中的一项
    Named { name: String, value: Box<ParameterValue> },
}

impl ParameterValue {
    /// 构造命名参数
    pub fn named<S: Into<String>>(name: S, value: ParameterValue) -> Self {
        Self::Named { name: name.into(), value: Box::new(value) }
    }

    /// 命名参数的名称，非命名参数返回 `None`
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// 去掉 `Named` 包装后的实际值
    pub fn inner(&self) -> &ParameterValue {
        match self {
            Self::Named { value, .. } => value.inner(),
            other => other,
        }
    }
}

/// SQL 中使用的占位符风格
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum PlaceholderType {
    /// `?`（qmark）
    Question,
    /// `:name`
    Named,
    /// `%(name)s`
    Pyformat,
    /// `%s`
    Format,
    /// 没有占位符
    None,
}

/// 参数字面量的外层形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterShape {
    /// `(...)`
    Tuple,
    /// `[...]`
    List,
    /// `{...}`
    Dict,
    /// 没有括号包裹的单个值
    Scalar,
    /// 空白文本
    Empty,
}

/// 引擎的最终输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedSql {
    /// 注入前的 SQL
    pub original_sql: String,
    /// 注入字面量后的 SQL
    pub injected_sql: String,
    /// 解码后的参数
    pub parameters: Vec<ParameterValue>,
    /// 检测到的占位符风格
    pub placeholder_type: PlaceholderType,
}

/// 引擎配置
///
/// 以显式参数的形式传入入口函数，引擎内部不持有任何全局可变状态。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 打开后输出详细的 trace 事件，不影响结果
    pub debug: bool,
    /// 找 SQL 起始行和参数行时向前查找的最大行数
    pub lookahead: usize,
    /// 整段文本没有日志头时，是否把它当作裸 SQL 块处理
    pub allow_headerless: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            lookahead: DEFAULT_LOOKAHEAD,
            allow_headerless: true,
        }
    }
}
