//! # sqllog-inject
//!
//! 从 SQLAlchemy 引擎日志中还原 SQL 语句，并把日志里记录的绑定参数
//! 以 SQL 字面量的形式注入回占位符，得到可以直接复制执行的语句。
//!
//! ## 处理流程
//!
//! 1. 扫描：找出 `sqlalchemy.engine` 日志头，拼接多行 SQL，定位参数行
//! 2. 分词：把 Python repr 形式的参数拆成独立的值
//! 3. 类型推断：识别 None、布尔、数字、字符串以及常见的构造器写法
//! 4. 注入：按 `?`、`:name`、`%(name)s`、`%s` 四种风格替换占位符
//!
//! ## 示例
//!
//! ```
//! use sqllog_inject::process;
//!
//! let log = "\
//! 2024-01-15 10:30:00,123 INFO sqlalchemy.engine.Engine SELECT * FROM users WHERE id = ?
//! 2024-01-15 10:30:00,124 INFO sqlalchemy.engine.Engine [generated in 0.00012s] (42,)";
//!
//! let parsed = process(log).unwrap();
//! assert_eq!(parsed.injected_sql, "SELECT * FROM users WHERE id = 42");
//! ```

pub mod config;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod process;
pub mod sqllog;

// 重新导出常用类型和函数
pub use config::Config;
pub use error::{InjectError, Result};
pub use process::{
    Engine, RenderOptions, process, process_all, process_entry, process_with,
    read_input, render,
};
pub use sqllog::{
    EngineConfig, LogEntry, ParameterShape, ParameterValue, ParsedSql,
    PlaceholderType, coerce, detect_placeholder_type, format_literal, inject,
    scan, scan_with, tokenize, tokenize_dict, tokenize_tuple,
};
