//! 日志条目扫描器 - 多行 SQL 与参数块的拼接
//!
//! 输入是从终端或剪贴板复制出来的一段任意文本，其中夹杂着
//! `sqlalchemy.engine` 日志器输出的语句和参数，也可能混有其他日志。
//!
//! ## 日志格式
//!
//! ```text
//! 2024-01-15 10:30:00,123 INFO sqlalchemy.engine.Engine SELECT users.id, users.name
//! FROM users
//! WHERE users.id = ?
//! 2024-01-15 10:30:00,124 INFO sqlalchemy.engine.Engine [generated in 0.00015s] (1,)
//! ```
//!
//! - **日志头**：包含 `sqlalchemy.engine` 且不带计时标记的行
//! - **计时标记**：`[generated in …]`、`[cached since …]`、`[raw sql]` 等，
//!   参数字面量紧跟其后
//! - **SQL 起始行**：以 `SELECT`/`INSERT`/`UPDATE` 等语句关键字开头，
//!   可以就在日志头那一行，也可以在随后的几行里
//! - **续行**：以子句关键字开头、包含占位符、括号或逗号列表的行
//!
//! ## 扫描流程
//!
//! ```text
//! 日志头 → 找 SQL 起始行 → 拼接续行 → 向前查找参数行 → LogEntry
//!                ↓                               ↓
//!          窗口内找不到则跳过            括号未闭合时继续拼接下一行
//! ```
//!
//! 外层游标会越过本条目用掉的所有行，避免同一段内容被重复匹配。
//! 整段文本没有日志头时，可以按“裸 SQL 块”处理（见 [`EngineConfig`]）。

use crate::sqllog::types::{EngineConfig, LogEntry};
use crate::sqllog::utils::{
    bracket_depth, closing_bracket, leading_word, starts_with_log_timestamp,
    strip_quoted,
};
use lazy_static::lazy_static;
use regex::Regex;

/// 引擎日志器名称标记
pub const ENGINE_MARKER: &str = "sqlalchemy.engine";

/// 语句起始关键字
const SQL_START_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "CREATE", "ALTER", "DROP",
    "BEGIN", "COMMIT", "ROLLBACK", "WITH",
];

/// 续行关键字
const CONTINUATION_KEYWORDS: &[&str] = &[
    "FROM", "WHERE", "JOIN", "LEFT", "RIGHT", "INNER", "OUTER", "CROSS",
    "FULL", "GROUP", "ORDER", "HAVING", "LIMIT", "OFFSET", "SET", "VALUES",
    "ON", "AND", "OR", "UNION", "EXCEPT", "INTERSECT", "RETURNING", "INTO",
    "SELECT", "CASE", "WHEN", "THEN", "ELSE", "END", "USING", "FETCH",
];

/// 日志级别关键字，用于识别其他日志器输出的记录
const LEVEL_WORDS: &[&str] = &[
    "TRACE", "DEBUG", "INFO", "WARN", "WARNING", "ERROR", "CRITICAL", "FATAL",
];

lazy_static! {
    static ref TIMING_RE: Regex = Regex::new(
        r"\[(?:generated in|cached since|no key|raw sql|insertmanyvalues|dialect )[^\]]*\]"
    )
    .unwrap();
    static ref LOGGER_RE: Regex =
        Regex::new(r"sqlalchemy\.engine(?:\.[A-Za-z_][A-Za-z0-9_]*)*").unwrap();
    static ref PLACEHOLDER_RE: Regex = Regex::new(
        r"\?|(?:^|[^:\w\\]):[A-Za-z_]\w*|%\([A-Za-z_]\w*\)s|%s"
    )
    .unwrap();
    static ref INTO_TABLE_RE: Regex =
        Regex::new(r#"(?i)\bINTO\s+[\w."`\[\]]+$"#).unwrap();
}

/// 结尾处还缺内容的关键字，后面的括号行属于 SQL 本身
const OPEN_ENDED_KEYWORDS: &[&str] = &["VALUES", "IN"];

/// 扫描文本，返回所有定位到的 SQL 条目（使用默认配置）
pub fn scan(text: &str) -> Vec<LogEntry> {
    scan_with(text, &EngineConfig::default())
}

/// 扫描文本，返回所有定位到的 SQL 条目
///
/// 不会失败：找不到日志头或 SQL 时返回空序列。
pub fn scan_with(text: &str, config: &EngineConfig) -> Vec<LogEntry> {
    let lines: Vec<&str> = text.lines().collect();
    let scanner = Scanner { lines: &lines, lookahead: config.lookahead.max(1) };

    let has_header = lines.iter().any(|line| is_header(line));
    let entries = if has_header {
        scanner.scan_headers(config)
    } else if config.allow_headerless {
        scanner.scan_bare(config)
    } else {
        Vec::new()
    };

    #[cfg(feature = "logging")]
    tracing::debug!(
        lines = lines.len(),
        entries = entries.len(),
        headerless = !has_header,
        "日志扫描完成"
    );

    entries
}

/// 是否为日志头：带引擎日志器标记且不是计时行
pub fn is_header(line: &str) -> bool {
    line.contains(ENGINE_MARKER) && !is_timing_line(line)
}

/// 是否带有驱动的计时标记（`[generated in 0.0001s]` 等）
pub fn is_timing_line(line: &str) -> bool {
    line.contains("generated in") || TIMING_RE.is_match(line)
}

/// 是否像 SQL 语句的开头
pub fn looks_like_sql_start(text: &str) -> bool {
    let word = leading_word(text);
    !word.is_empty()
        && SQL_START_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

/// 是否像多行 SQL 的续行
pub fn looks_like_continuation(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }

    let word = leading_word(text);
    if !word.is_empty()
        && CONTINUATION_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
    {
        return true;
    }

    PLACEHOLDER_RE.is_match(text)
        || text.contains(['(', ')'])
        || text.starts_with(',')
        || text.ends_with(',')
}

/// 是否为其他日志器输出的记录（以时间戳或日志级别开头）
pub fn is_foreign_record(line: &str) -> bool {
    if line.contains(ENGINE_MARKER) {
        return false;
    }
    if starts_with_log_timestamp(line) {
        return true;
    }
    let word = leading_word(line);
    !word.is_empty() && LEVEL_WORDS.iter().any(|l| *l == word)
}

/// 若该行是参数行，返回参数字面量的起始文本
///
/// 参数字面量必须以 `(`、`[`、`{` 开头，可以跟在计时标记后面。
/// 没有计时标记的行还要求末尾是配对的闭括号或括号尚未闭合（多行参数块），
/// 并且括号里不像 SQL（例如 `(SELECT ...)` 子查询或带占位符的列表）。
pub fn parameter_start(line: &str) -> Option<&str> {
    let (rest, after_marker) = match TIMING_RE.find(line) {
        Some(m) => (line[m.end()..].trim(), true),
        None => (line.trim(), false),
    };

    let open = rest.chars().next()?;
    let close = closing_bracket(open)?;
    if after_marker {
        return Some(rest);
    }

    let complete = rest.ends_with(close) && bracket_depth(rest) == 0;
    if !complete && bracket_depth(rest) <= 0 {
        return None;
    }

    let inner = rest[open.len_utf8()..].trim_start();
    let word = leading_word(inner);
    let sql_like = looks_like_sql_start(inner)
        || CONTINUATION_KEYWORDS.iter().any(|k| *k == word)
        || inner[word.len()..].starts_with(':') && !word.is_empty()
        || PLACEHOLDER_RE.is_match(&strip_quoted(rest));
    if sql_like {
        return None;
    }
    Some(rest)
}

/// 没有日志头时，只有带占位符或后面跟着参数字面量的语句才算数
fn is_bound_statement(entry: &LogEntry) -> bool {
    entry.parameters.is_some()
        || PLACEHOLDER_RE.is_match(&strip_quoted(&entry.sql))
}

/// 已拼接的 SQL 是否明显没有结束
///
/// 以逗号、`VALUES`、`IN` 结尾，或者 `INTO <表名>` 后还没有列清单时，
/// 下一行的括号内容是 SQL 的一部分而不是参数。
pub fn expects_more_sql(sql: &str) -> bool {
    let sql = sql.trim_end();
    if sql.ends_with(',') || INTO_TABLE_RE.is_match(sql) {
        return true;
    }
    let last = sql
        .rsplit(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .next()
        .unwrap_or("");
    OPEN_ENDED_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(last))
}

/// 规范化 SQL：去掉首尾空白和末尾的分号
fn normalize_sql(sql: &str) -> String {
    sql.trim()
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .to_string()
}

/// 从日志头所在行取出日志器名称之后的文本
///
/// 兼容 `INFO sqlalchemy.engine.Engine: SELECT ...` 和
/// `sqlalchemy.engine.Engine - INFO - SELECT ...` 等格式。
fn header_remainder(line: &str) -> &str {
    let Some(m) = LOGGER_RE.find(line) else {
        return "";
    };
    let mut rest = &line[m.end()..];
    for _ in 0..2 {
        rest = rest.trim_start_matches(|c: char| {
            c.is_whitespace() || matches!(c, ':' | '-' | '|' | ']')
        });
        let word = leading_word(rest);
        if !word.is_empty() && LEVEL_WORDS.iter().any(|l| *l == word) {
            rest = &rest[word.len()..];
        }
    }
    rest.trim()
}

/// 一次扫描的上下文
struct Scanner<'a> {
    lines: &'a [&'a str],
    lookahead: usize,
}

impl Scanner<'_> {
    /// 以日志头为锚点逐条扫描
    fn scan_headers(&self, config: &EngineConfig) -> Vec<LogEntry> {
        let mut entries = Vec::new();
        let mut cursor = 0usize;

        while cursor < self.lines.len() {
            if !is_header(self.lines[cursor]) {
                cursor += 1;
                continue;
            }
            match self.read_entry(cursor, config) {
                Some((entry, next)) => {
                    entries.push(entry);
                    cursor = next.max(cursor + 1);
                }
                None => cursor += 1,
            }
        }
        entries
    }

    /// 没有日志头时按裸 SQL 块扫描
    fn scan_bare(&self, config: &EngineConfig) -> Vec<LogEntry> {
        let mut entries = Vec::new();
        let mut cursor = 0usize;

        while cursor < self.lines.len() {
            let line = self.lines[cursor].trim();
            if !looks_like_sql_start(line) {
                cursor += 1;
                continue;
            }
            match self.read_statement(cursor, line, config) {
                Some((entry, next)) if is_bound_statement(&entry) => {
                    entries.push(entry);
                    cursor = next.max(cursor + 1);
                }
                _ => cursor += 1,
            }
        }
        entries
    }

    /// 从日志头开始读取一条记录，返回记录和下一个待扫描的行号
    fn read_entry(
        &self,
        header: usize,
        config: &EngineConfig,
    ) -> Option<(LogEntry, usize)> {
        let remainder = header_remainder(self.lines[header]);
        if looks_like_sql_start(remainder) {
            return self.read_statement(header, remainder, config);
        }

        let end = self.window_end(header + 1);
        for idx in header + 1..end {
            let line = self.lines[idx];
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if is_header(line) || is_timing_line(line) {
                break;
            }
            if looks_like_sql_start(trimmed) {
                return self.read_statement(idx, trimmed, config);
            }
        }

        #[cfg(feature = "logging")]
        if config.debug {
            tracing::trace!(line = header, "日志头后未找到 SQL 起始行，跳过");
        }
        None
    }

    /// 从 SQL 起始行开始拼接语句并查找参数
    fn read_statement(
        &self,
        start: usize,
        first: &str,
        config: &EngineConfig,
    ) -> Option<(LogEntry, usize)> {
        let mut sql = first.trim().to_string();
        let mut cursor = start + 1;

        while cursor < self.lines.len() {
            let line = self.lines[cursor];
            let trimmed = line.trim();
            if trimmed.is_empty() {
                cursor += 1;
                continue;
            }
            if is_header(line)
                || is_timing_line(line)
                || is_foreign_record(line)
                || !looks_like_continuation(trimmed)
            {
                break;
            }
            if parameter_start(line).is_some() && !expects_more_sql(&sql) {
                break;
            }
            sql.push(' ');
            sql.push_str(trimmed);
            cursor += 1;
        }

        let sql = normalize_sql(&sql);
        if sql.is_empty() {
            return None;
        }

        let (parameters, next) = self.find_parameters(cursor);

        #[cfg(feature = "logging")]
        if config.debug {
            tracing::trace!(
                line = start,
                sql = %sql,
                parameters = ?parameters,
                "定位到 SQL 条目"
            );
        }
        #[cfg(not(feature = "logging"))]
        let _ = config;

        Some((LogEntry { sql, parameters, source_line: start }, next))
    }

    /// 在 SQL 之后的窗口内查找参数行
    ///
    /// 找到时返回参数文本和参数块之后的行号；找不到时游标停在 SQL 之后。
    fn find_parameters(&self, from: usize) -> (Option<String>, usize) {
        let end = self.window_end(from);

        for idx in from..end {
            let line = self.lines[idx];
            if line.trim().is_empty() {
                continue;
            }
            if is_header(line) {
                break;
            }
            if let Some(start) = parameter_start(line) {
                return self.collect_parameter_block(idx, start);
            }
            if is_timing_line(line) {
                // 计时行后面没有参数字面量
                break;
            }
        }
        (None, from)
    }

    /// 参数括号未闭合时继续拼接后续行
    fn collect_parameter_block(
        &self,
        first: usize,
        start: &str,
    ) -> (Option<String>, usize) {
        let mut block = start.to_string();
        let mut next = first + 1;
        let end = self.window_end(next);

        while bracket_depth(&block) > 0 && next < end {
            let line = self.lines[next];
            if is_header(line) || is_timing_line(line) {
                break;
            }
            block.push('\n');
            block.push_str(line.trim());
            next += 1;
        }
        (Some(block), next)
    }

    fn window_end(&self, from: usize) -> usize {
        self.lines.len().min(from + self.lookahead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_header() {
        assert!(is_header("INFO sqlalchemy.engine.Engine: SELECT 1"));
        assert!(is_header(
            "2024-01-15 10:30:00,123 INFO sqlalchemy.engine.Engine BEGIN (implicit)"
        ));
        assert!(!is_header(
            "INFO sqlalchemy.engine.Engine [generated in 0.00015s] (1,)"
        ));
        assert!(!is_header("INFO myapp: SELECT 1"));
    }

    #[test]
    fn test_timing_markers() {
        assert!(is_timing_line("[generated in 0.0001s] (1, 2)"));
        assert!(is_timing_line("[cached since 12.5s ago] ('a',)"));
        assert!(is_timing_line("[raw sql] ()"));
        assert!(is_timing_line("[no key 0.00010s] {}"));
        assert!(!is_timing_line("(1, 2)"));
    }

    #[test]
    fn test_looks_like_sql_start() {
        assert!(looks_like_sql_start("SELECT * FROM t"));
        assert!(looks_like_sql_start("  insert into t values (?)"));
        assert!(looks_like_sql_start("BEGIN (implicit)"));
        assert!(!looks_like_sql_start("FROM t"));
        assert!(!looks_like_sql_start("SELECTION of rows"));
        assert!(!looks_like_sql_start("PRAGMA main.table_info(\"t\")"));
    }

    #[test]
    fn test_looks_like_continuation() {
        assert!(looks_like_continuation("FROM users"));
        assert!(looks_like_continuation("left outer join orders"));
        assert!(looks_like_continuation("users.id = ?"));
        assert!(looks_like_continuation("users.id = :user_id"));
        assert!(looks_like_continuation("users.name, users.email,"));
        assert!(looks_like_continuation(", users.name"));
        assert!(!looks_like_continuation("users.id = 1"));
        assert!(!looks_like_continuation("just some words"));
    }

    #[test]
    fn test_is_foreign_record() {
        assert!(is_foreign_record("2024-01-15 10:30:00,123 INFO app: hi"));
        assert!(is_foreign_record("WARNING app: careful (x)"));
        assert!(!is_foreign_record("WHERE users.id = ?"));
        assert!(!is_foreign_record(
            "2024-01-15 10:30:00,123 INFO sqlalchemy.engine.Engine COMMIT"
        ));
    }

    #[test]
    fn test_parameter_start() {
        assert_eq!(parameter_start("('Alice',)"), Some("('Alice',)"));
        assert_eq!(
            parameter_start(
                "INFO sqlalchemy.engine.Engine [generated in 0.0001s] (1, 2)"
            ),
            Some("(1, 2)")
        );
        assert_eq!(parameter_start("{'id': 1}"), Some("{'id': 1}"));
        assert_eq!(parameter_start("[1, 2"), Some("[1, 2"));
        assert_eq!(parameter_start("(SELECT id FROM t)"), None);
        assert_eq!(parameter_start("(?, ?)"), None);
        assert_eq!(parameter_start("('what?', ':b')"), Some("('what?', ':b')"));
        assert_eq!(parameter_start("[SQL: SELECT 1]"), None);
        assert_eq!(parameter_start("(1) AND x = 2"), None);
        assert_eq!(parameter_start("[generated in 0.1s]"), None);
    }

    #[test]
    fn test_header_remainder() {
        assert_eq!(
            header_remainder("INFO sqlalchemy.engine.Engine: INSERT INTO t"),
            "INSERT INTO t"
        );
        assert_eq!(
            header_remainder(
                "2024-01-15 10:30:00,123 - sqlalchemy.engine.Engine - INFO - SELECT 1"
            ),
            "SELECT 1"
        );
        assert_eq!(
            header_remainder("INFO:sqlalchemy.engine.base.Engine:SELECT 1"),
            "SELECT 1"
        );
        assert_eq!(header_remainder("no marker"), "");
    }

    #[test]
    fn test_normalize_sql() {
        assert_eq!(normalize_sql("  SELECT 1 ;; "), "SELECT 1");
        assert_eq!(normalize_sql(";"), "");
    }

    #[test]
    fn test_scan_single_line() {
        let entries = scan(
            "INFO sqlalchemy.engine.Engine: INSERT INTO users (name) VALUES (?)\n('Alice',)",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sql, "INSERT INTO users (name) VALUES (?)");
        assert_eq!(entries[0].parameters.as_deref(), Some("('Alice',)"));
        assert_eq!(entries[0].source_line, 0);
    }

    #[test]
    fn test_scan_multiline_with_timing() {
        let text = "\
2024-01-15 10:30:00,123 INFO sqlalchemy.engine.Engine SELECT users.id, users.name
FROM users
WHERE users.id = ? AND users.name = ?
2024-01-15 10:30:00,124 INFO sqlalchemy.engine.Engine [generated in 0.00015s] (5, 'bob')
";
        let entries = scan(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].sql,
            "SELECT users.id, users.name FROM users WHERE users.id = ? AND users.name = ?"
        );
        assert_eq!(entries[0].parameters.as_deref(), Some("(5, 'bob')"));
    }

    #[test]
    fn test_scan_sql_on_following_line() {
        let text = "\
INFO sqlalchemy.engine.Engine

SELECT * FROM t WHERE id = ?;
(3,)";
        let entries = scan(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sql, "SELECT * FROM t WHERE id = ?");
        assert_eq!(entries[0].source_line, 2);
        assert_eq!(entries[0].parameters.as_deref(), Some("(3,)"));
    }

    #[test]
    fn test_header_without_sql_is_skipped() {
        let text = "\
INFO sqlalchemy.engine.Engine Col ('id', 'name')
INFO sqlalchemy.engine.Engine Row (1, 'a')";
        assert!(scan(text).is_empty());
    }

    #[test]
    fn test_noise_between_sql_and_parameters() {
        let text = "\
INFO sqlalchemy.engine.Engine UPDATE users SET name=? WHERE users.id = ?
DEBUG urllib3: Starting new HTTPS connection (1): example.com
INFO sqlalchemy.engine.Engine [cached since 2.1s ago] ('carol', 4)";
        let entries = scan(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].sql,
            "UPDATE users SET name=? WHERE users.id = ?"
        );
        assert_eq!(entries[0].parameters.as_deref(), Some("('carol', 4)"));
    }

    #[test]
    fn test_multiple_entries() {
        let text = "\
INFO sqlalchemy.engine.Engine BEGIN (implicit)
INFO sqlalchemy.engine.Engine SELECT * FROM t WHERE a = ?
INFO sqlalchemy.engine.Engine [generated in 0.0001s] (1,)
INFO sqlalchemy.engine.Engine COMMIT";
        let entries = scan(text);
        let sqls: Vec<&str> = entries.iter().map(|e| e.sql.as_str()).collect();
        assert_eq!(
            sqls,
            vec!["BEGIN (implicit)", "SELECT * FROM t WHERE a = ?", "COMMIT"]
        );
        assert_eq!(entries[0].parameters, None);
        assert_eq!(entries[1].parameters.as_deref(), Some("(1,)"));
        assert_eq!(entries[2].parameters, None);
    }

    #[test]
    fn test_multiline_parameter_block() {
        let text = "\
INFO sqlalchemy.engine.Engine INSERT INTO t (a, b) VALUES (?, ?)
INFO sqlalchemy.engine.Engine [generated in 0.0001s] ('first line,
second', 2)";
        let entries = scan(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].parameters.as_deref(),
            Some("('first line,\nsecond', 2)")
        );
    }

    #[test]
    fn test_timing_line_without_literal_stops_search() {
        let text = "\
INFO sqlalchemy.engine.Engine SELECT * FROM t WHERE a = ?
INFO sqlalchemy.engine.Engine [generated in 0.0001s]
(9,)";
        let entries = scan(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].parameters, None);
    }

    #[test]
    fn test_lookahead_window() {
        let mut text = String::from(
            "INFO sqlalchemy.engine.Engine SELECT * FROM t WHERE a = ?\n",
        );
        for i in 0..12 {
            text.push_str(&format!("unrelated output {i}\n"));
        }
        text.push_str("(1,)\n");
        let entries = scan(&text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].parameters, None);

        let config = EngineConfig { lookahead: 20, ..EngineConfig::default() };
        let entries = scan_with(&text, &config);
        assert_eq!(entries[0].parameters.as_deref(), Some("(1,)"));
    }

    #[test]
    fn test_headerless_block() {
        let text = "SELECT * FROM users WHERE id = :user_id AND name = :name\n{'user_id': 123, 'name': 'Bob'}";
        let entries = scan(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].parameters.as_deref(),
            Some("{'user_id': 123, 'name': 'Bob'}")
        );

        let strict =
            EngineConfig { allow_headerless: false, ..EngineConfig::default() };
        assert!(scan_with(text, &strict).is_empty());
    }

    #[test]
    fn test_no_header_no_sql() {
        assert!(scan("hello world\nnothing to see (here)").is_empty());
        assert!(scan("").is_empty());
    }
}
