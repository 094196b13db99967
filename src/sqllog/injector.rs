//! 占位符检测与字面量注入

use crate::sqllog::types::{ParameterValue, PlaceholderType};
use crate::sqllog::utils::is_ident_char;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    static ref PYFORMAT_RE: Regex =
        Regex::new(r"%\(([A-Za-z_][A-Za-z0-9_]*)\)s").unwrap();
    static ref PYFORMAT_SUB_RE: Regex =
        Regex::new(r"%%|%\(([A-Za-z_][A-Za-z0-9_]*)\)s").unwrap();
    static ref FORMAT_SUB_RE: Regex = Regex::new(r"%%|%s").unwrap();
}

/// 根据 SQL 文本判断占位符风格
///
/// 优先级：`?` > `:name` > `%(name)s` > `%s`。同时出现 `?` 和 `:name`
/// 时按 `?` 处理，`:name` 不会被替换。
pub fn detect_placeholder_type(sql: &str) -> PlaceholderType {
    if sql.contains('?') {
        PlaceholderType::Question
    } else if !named_placeholders(sql).is_empty() {
        PlaceholderType::Named
    } else if PYFORMAT_RE.is_match(sql) {
        PlaceholderType::Pyformat
    } else if sql.contains("%s") {
        PlaceholderType::Format
    } else {
        PlaceholderType::None
    }
}

/// 把参数以 SQL 字面量的形式注入到占位符位置
///
/// 参数不足时剩余的占位符原样保留，多余的参数被忽略。
/// 替换只扫描一遍原始 SQL，注入的字面量不会被再次当作占位符。
pub fn inject(
    sql: &str,
    placeholder_type: PlaceholderType,
    parameters: &[ParameterValue],
) -> String {
    if parameters.is_empty() {
        return sql.to_string();
    }

    match placeholder_type {
        PlaceholderType::Question => inject_question(sql, parameters),
        PlaceholderType::Named => inject_named(sql, parameters),
        PlaceholderType::Pyformat => inject_pyformat(sql, parameters),
        PlaceholderType::Format => inject_format(sql, parameters),
        PlaceholderType::None => sql.to_string(),
    }
}

/// 将参数值格式化为 SQL 字面量
///
/// 字符串中的单引号按 SQL 标准加倍，非有限浮点数输出 `NULL`。
pub fn format_literal(value: &ParameterValue) -> String {
    match value {
        ParameterValue::Null => "NULL".to_string(),
        ParameterValue::Boolean(true) => "TRUE".to_string(),
        ParameterValue::Boolean(false) => "FALSE".to_string(),
        ParameterValue::Integer(n) => n.to_string(),
        ParameterValue::Float(f) => format_float(*f),
        ParameterValue::String(s) => quote_string(s),
        ParameterValue::Named { value, .. } => format_literal(value),
    }
}

fn format_float(f: f64) -> String {
    if !f.is_finite() {
        return "NULL".to_string();
    }
    // 整数值保留 `.0`，避免和整数参数混淆
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    out.push_str(&s.replace('\'', "''"));
    out.push('\'');
    out
}

/// 找出 SQL 中所有 `:name` 占位符，返回 (起始字节, 结束字节, 名称)
///
/// `::type` 类型转换、`a:b` 这类前面紧跟标识符字符的冒号以及 `\:` 都不算占位符。
pub fn named_placeholders(sql: &str) -> Vec<(usize, usize, &str)> {
    let mut found = Vec::new();
    let mut prev: Option<char> = None;
    let mut iter = sql.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        let preceded_ok = !matches!(
            prev,
            Some(p) if p == ':' || p == '\\' || is_ident_char(p)
        );
        if c == ':' && preceded_ok {
            let starts_ident = iter
                .peek()
                .is_some_and(|&(_, n)| n.is_ascii_alphabetic() || n == '_');
            if starts_ident {
                let name_start = i + 1;
                let mut end = name_start;
                while let Some(&(j, n)) = iter.peek() {
                    if !is_ident_char(n) {
                        break;
                    }
                    end = j + n.len_utf8();
                    prev = Some(n);
                    iter.next();
                }
                found.push((i, end, &sql[name_start..end]));
                continue;
            }
        }
        prev = Some(c);
    }
    found
}

/// 按名称建立参数查找表，同名时第一个生效
fn named_lookup(
    parameters: &[ParameterValue],
) -> HashMap<&str, &ParameterValue> {
    let mut lookup = HashMap::new();
    for param in parameters {
        if let ParameterValue::Named { name, value } = param {
            lookup.entry(name.as_str()).or_insert(value.as_ref());
        }
    }
    lookup
}

fn inject_question(sql: &str, parameters: &[ParameterValue]) -> String {
    let mut out = String::with_capacity(sql.len() + parameters.len() * 8);
    let mut next = parameters.iter();
    for c in sql.chars() {
        if c != '?' {
            out.push(c);
            continue;
        }
        match next.next() {
            Some(value) => out.push_str(&format_literal(value)),
            None => out.push('?'),
        }
    }
    out
}

fn inject_named(sql: &str, parameters: &[ParameterValue]) -> String {
    let lookup = named_lookup(parameters);
    let mut out = String::with_capacity(sql.len());
    let mut last = 0usize;

    for (start, end, name) in named_placeholders(sql) {
        if let Some(value) = lookup.get(name) {
            out.push_str(&sql[last..start]);
            out.push_str(&format_literal(value));
            last = end;
        }
    }
    out.push_str(&sql[last..]);
    out
}

fn inject_pyformat(sql: &str, parameters: &[ParameterValue]) -> String {
    let lookup = named_lookup(parameters);
    let mut substituted = 0usize;
    let out = PYFORMAT_SUB_RE.replace_all(sql, |caps: &Captures| {
        match caps.get(1).and_then(|name| lookup.get(name.as_str())) {
            Some(value) => {
                substituted += 1;
                format_literal(value)
            }
            None if caps.get(1).is_none() => "%".to_string(),
            None => caps[0].to_string(),
        }
    });
    // 一个占位符都没替换时 `%%` 也保持原样
    if substituted == 0 {
        return sql.to_string();
    }
    out.into_owned()
}

fn inject_format(sql: &str, parameters: &[ParameterValue]) -> String {
    let mut next = parameters.iter();
    let mut substituted = 0usize;
    let out = FORMAT_SUB_RE.replace_all(sql, |caps: &Captures| {
        if &caps[0] == "%%" {
            return "%".to_string();
        }
        match next.next() {
            Some(value) => {
                substituted += 1;
                format_literal(value)
            }
            None => caps[0].to_string(),
        }
    });
    if substituted == 0 {
        return sql.to_string();
    }
    out.into_owned()
}
