//! SQL 日志解析与参数注入模块
//!
//! 四个阶段依次组合：扫描日志条目 → 参数分词 → 类型推断 → 字面量注入

pub mod coerce;
pub mod injector;
pub mod scanner;
pub mod tokenizer;
pub mod types;
pub mod utils;

// 重新导出核心类型和函数
pub use coerce::coerce;
pub use injector::{detect_placeholder_type, format_literal, inject};
pub use scanner::{scan, scan_with};
pub use tokenizer::{tokenize, tokenize_dict, tokenize_tuple};
pub use types::{
    EngineConfig, LogEntry, ParameterShape, ParameterValue, ParsedSql,
    PlaceholderType,
};
