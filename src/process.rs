//! 顶层处理流程：扫描 → 分词与类型推断 → 注入
//!
//! 每次调用都是独立的纯函数，不持有任何跨调用的状态，可以在多个线程中并发调用。

use crate::error::Result;
use crate::sqllog::{
    EngineConfig, LogEntry, ParsedSql, detect_placeholder_type, inject,
    scan_with, tokenize,
};
use std::io::Read;
use std::path::Path;

/// 处理一段日志文本，返回第一条 SQL 注入参数后的结果
///
/// 找不到可识别的日志条目时返回 `None`。
///
/// # Examples
///
/// ```
/// use sqllog_inject::process;
///
/// let text = "INFO sqlalchemy.engine.Engine: INSERT INTO users (name) VALUES (?)\n('Alice',)";
/// let parsed = process(text).unwrap();
/// assert_eq!(parsed.injected_sql, "INSERT INTO users (name) VALUES ('Alice')");
/// ```
pub fn process(text: &str) -> Option<ParsedSql> {
    process_with(text, &EngineConfig::default())
}

/// 使用指定配置处理日志文本，返回第一条结果
pub fn process_with(text: &str, config: &EngineConfig) -> Option<ParsedSql> {
    let entry = scan_with(text, config).into_iter().next()?;
    Some(process_entry(&entry, config))
}

/// 处理日志文本中的所有条目
pub fn process_all(text: &str, config: &EngineConfig) -> Vec<ParsedSql> {
    scan_with(text, config)
        .iter()
        .map(|entry| process_entry(entry, config))
        .collect()
}

/// 对单个日志条目做分词、类型推断和注入
pub fn process_entry(entry: &LogEntry, config: &EngineConfig) -> ParsedSql {
    let parameters =
        entry.parameters.as_deref().map(tokenize).unwrap_or_default();
    let placeholder_type = detect_placeholder_type(&entry.sql);
    let injected_sql = inject(&entry.sql, placeholder_type, &parameters);

    #[cfg(feature = "logging")]
    if config.debug {
        tracing::trace!(
            line = entry.source_line,
            placeholder = ?placeholder_type,
            parameters = parameters.len(),
            "参数注入完成"
        );
    }
    #[cfg(not(feature = "logging"))]
    let _ = config;

    ParsedSql {
        original_sql: entry.sql.clone(),
        injected_sql,
        parameters,
        placeholder_type,
    }
}

/// 持有配置的引擎，便于调用方反复使用同一份配置
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// 使用默认配置创建引擎
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定配置创建引擎
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// 当前配置
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 扫描日志条目
    pub fn scan(&self, text: &str) -> Vec<LogEntry> {
        scan_with(text, &self.config)
    }

    /// 处理第一条 SQL
    pub fn process(&self, text: &str) -> Option<ParsedSql> {
        process_with(text, &self.config)
    }

    /// 处理所有 SQL
    pub fn process_all(&self, text: &str) -> Vec<ParsedSql> {
        process_all(text, &self.config)
    }
}

/// 读取输入文本：给定路径时读文件，路径为空或为 `-` 时读标准输入
///
/// # Errors
/// 文件不存在或读取失败时返回 `InjectError::Io`。
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            let bytes = std::fs::read(p)?;
            // 终端里复制出来的日志偶尔带有非法字节，按有损方式解码
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// 输出格式选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// 以 JSON 数组输出完整结果
    pub json: bool,
    /// 文本模式下同时输出注入前的 SQL
    pub show_original: bool,
}

/// 把处理结果渲染为输出文本
///
/// # Errors
/// 请求 JSON 输出但未启用 `json` feature，或序列化失败时返回错误。
pub fn render(results: &[ParsedSql], options: RenderOptions) -> Result<String> {
    if options.json {
        return render_json(results);
    }

    let blocks: Vec<String> = results
        .iter()
        .map(|parsed| {
            if options.show_original {
                format!(
                    "-- original\n{};\n-- injected\n{};",
                    parsed.original_sql, parsed.injected_sql
                )
            } else {
                format!("{};", parsed.injected_sql)
            }
        })
        .collect();

    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    Ok(out)
}

#[cfg(feature = "json")]
fn render_json(results: &[ParsedSql]) -> Result<String> {
    let mut out = serde_json::to_string_pretty(results)?;
    out.push('\n');
    Ok(out)
}

#[cfg(not(feature = "json"))]
fn render_json(_results: &[ParsedSql]) -> Result<String> {
    Err(crate::error::InjectError::config_error(
        "JSON 输出需要启用 json 功能",
    ))
}
