//! 参数类型推断
//!
//! 把分词得到的原始文本（Python repr 风格）转换为带类型的 [`ParameterValue`]。
//! 这一步永远不会失败：无法识别的文本原样作为字符串保留。

use crate::sqllog::types::ParameterValue;
use chrono::{NaiveDate, NaiveTime, Timelike};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INTEGER_RE: Regex = Regex::new(r"^-?\d+$").unwrap();
    static ref FLOAT_RE: Regex =
        Regex::new(r"^-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?$").unwrap();
    static ref DECIMAL_RE: Regex =
        Regex::new(r#"^Decimal\(\s*['"]([^'"]*)['"]\s*\)$"#).unwrap();
    static ref UUID_RE: Regex =
        Regex::new(r#"^UUID\(\s*['"]([0-9A-Fa-f-]+)['"]\s*\)$"#).unwrap();
    static ref TEMPORAL_RE: Regex =
        Regex::new(r"^datetime\.(datetime|date|time)\((.*)\)$").unwrap();
}

/// 将单个原始参数文本转换为 `ParameterValue`
///
/// 规则依次为：空值/`None`/`null`，带引号的字符串，布尔，整数，浮点数
/// （包括 `Infinity`/`NaN` 等非有限值），`Decimal`/`datetime`/`UUID` 等
/// 构造表达式，最后回退为原样字符串。
///
/// 非有限浮点数在这里仍记录为 `Float`，到生成 SQL 字面量时才变成 `NULL`。
pub fn coerce(token: &str) -> ParameterValue {
    let token = token.trim();

    if token.is_empty()
        || token.eq_ignore_ascii_case("none")
        || token.eq_ignore_ascii_case("null")
    {
        return ParameterValue::Null;
    }

    if let Some((body, quote)) = quoted_body(token) {
        return ParameterValue::String(unescape(body, quote));
    }

    if token.eq_ignore_ascii_case("true") {
        return ParameterValue::Boolean(true);
    }
    if token.eq_ignore_ascii_case("false") {
        return ParameterValue::Boolean(false);
    }

    if let Some(number) = coerce_number(token) {
        return number;
    }

    if let Some(value) = coerce_constructor(token) {
        return value;
    }

    ParameterValue::String(token.to_string())
}

/// 数字：整数、小数、科学计数法以及非有限值
fn coerce_number(token: &str) -> Option<ParameterValue> {
    if INTEGER_RE.is_match(token) {
        // 超出 i64 范围的整数退化为浮点数
        return Some(match token.parse::<i64>() {
            Ok(n) => ParameterValue::Integer(n),
            Err(_) => token.parse::<f64>().map_or_else(
                |_| ParameterValue::String(token.to_string()),
                ParameterValue::Float,
            ),
        });
    }

    if FLOAT_RE.is_match(token) {
        return token.parse::<f64>().ok().map(ParameterValue::Float);
    }

    let sentinel = match token.to_ascii_lowercase().as_str() {
        "infinity" | "+infinity" | "inf" | "+inf" => f64::INFINITY,
        "-infinity" | "-inf" => f64::NEG_INFINITY,
        "nan" | "-nan" => f64::NAN,
        _ => return None,
    };
    Some(ParameterValue::Float(sentinel))
}

/// Python 对象的 repr：`Decimal('1.5')`、`datetime.datetime(...)`、`UUID('...')`
fn coerce_constructor(token: &str) -> Option<ParameterValue> {
    if let Some(caps) = DECIMAL_RE.captures(token) {
        let inner = caps.get(1).map_or("", |m| m.as_str()).trim();
        return Some(
            coerce_number(inner)
                .unwrap_or_else(|| ParameterValue::String(inner.to_string())),
        );
    }

    if let Some(caps) = UUID_RE.captures(token) {
        return caps
            .get(1)
            .map(|m| ParameterValue::String(m.as_str().to_string()));
    }

    let caps = TEMPORAL_RE.captures(token)?;
    let kind = caps.get(1)?.as_str();
    let args = leading_int_args(caps.get(2)?.as_str());
    let arg = |i: usize| args.get(i).copied().unwrap_or(0);

    let text = match kind {
        "datetime" => {
            if args.len() < 3 {
                return None;
            }
            let date = make_date(arg(0), arg(1), arg(2))?;
            let time = make_time(arg(3), arg(4), arg(5), arg(6))?;
            format!("{} {}", date.format("%Y-%m-%d"), format_time(time))
        }
        "date" => {
            if args.len() < 3 {
                return None;
            }
            make_date(arg(0), arg(1), arg(2))?.format("%Y-%m-%d").to_string()
        }
        _ => {
            if args.is_empty() {
                return None;
            }
            format_time(make_time(arg(0), arg(1), arg(2), arg(3))?)
        }
    };
    Some(ParameterValue::String(text))
}

/// 取构造参数中开头的整数部分，遇到 `tzinfo=...` 之类的关键字参数即停止
fn leading_int_args(args: &str) -> Vec<i64> {
    args.split(',')
        .map(str::trim)
        .map_while(|a| a.parse::<i64>().ok())
        .collect()
}

fn make_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )
}

fn make_time(h: i64, m: i64, s: i64, micro: i64) -> Option<NaiveTime> {
    NaiveTime::from_hms_micro_opt(
        u32::try_from(h).ok()?,
        u32::try_from(m).ok()?,
        u32::try_from(s).ok()?,
        u32::try_from(micro).ok()?,
    )
}

fn format_time(time: NaiveTime) -> String {
    if time.nanosecond() == 0 {
        time.format("%H:%M:%S").to_string()
    } else {
        time.format("%H:%M:%S%.6f").to_string()
    }
}

/// 去掉包裹的引号，返回内部文本和所用的引号字符
///
/// 也接受 Python 字节串的 `b'...'` 写法。
fn quoted_body(token: &str) -> Option<(&str, char)> {
    let token = token
        .strip_prefix('b')
        .filter(|rest| rest.starts_with(['\'', '"']))
        .unwrap_or(token);

    let quote = token.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    if token.len() < 2 || !token.ends_with(quote) {
        return None;
    }
    Some((&token[1..token.len() - 1], quote))
}

/// 还原引号内的转义
///
/// `\'`、`\"`、`\\` 还原为字符本身，`\n`、`\t`、`\r` 还原为控制字符，
/// 其余转义原样保留。单引号字符串中的 `''` 还原为一个单引号。
fn unescape(body: &str, quote: char) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(e @ ('\'' | '"' | '\\')) => out.push(e),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '\'' if quote == '\'' && chars.peek() == Some(&'\'') => {
                chars.next();
                out.push('\'');
            }
            _ => out.push(c),
        }
    }
    out
}
