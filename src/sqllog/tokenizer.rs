//! 参数字面量分词
//!
//! 日志里的参数是 Python repr 风格的元组、列表或字典，例如
//! `('a, b', 1, (2, 3))` 或 `{'user_id': 123, 'name': 'Bob'}`。
//! 这里按最外层的括号形状分派，然后用同一个状态机切分顶层元素：
//!
//! - 引号状态：`'` 或 `"` 开启，只能被同一个字符关闭，关闭后可再次开启
//! - 转义标记：反斜杠转义下一个字符，二者都原样保留在元素文本中，
//!   留给类型推断阶段还原
//! - 嵌套深度：引号外的 `(`/`[`/`{` 加一，`)`/`]`/`}` 减一
//!
//! 只有引号外且深度为 0 的逗号才结束当前元素。

use crate::sqllog::coerce::coerce;
use crate::sqllog::types::{ParameterShape, ParameterValue};
use crate::sqllog::utils::closing_bracket;

/// 判断参数字面量的外层形状
pub fn detect_shape(raw: &str) -> ParameterShape {
    match raw.trim().chars().next() {
        None => ParameterShape::Empty,
        Some('(') => ParameterShape::Tuple,
        Some('[') => ParameterShape::List,
        Some('{') => ParameterShape::Dict,
        Some(_) => ParameterShape::Scalar,
    }
}

/// 把原始参数文本解析为参数值序列
///
/// 形状只在这里判断一次，元组/列表和字典分别交给对应的分词函数。
/// 元素全是元组或字典的列表是 `executemany` 的批量参数，只取第一组。
pub fn tokenize(raw: &str) -> Vec<ParameterValue> {
    match detect_shape(raw) {
        ParameterShape::Empty => Vec::new(),
        ParameterShape::Tuple => tokenize_tuple(raw),
        ParameterShape::Dict => tokenize_dict(raw),
        ParameterShape::Scalar => vec![coerce(raw)],
        ParameterShape::List => {
            let items = split_top_level(bracket_body(raw));
            let is_batch = !items.is_empty()
                && items.iter().all(|item| {
                    matches!(
                        detect_shape(item),
                        ParameterShape::Tuple | ParameterShape::Dict
                    )
                });
            if is_batch {
                tokenize(items[0])
            } else {
                items.into_iter().map(coerce).collect()
            }
        }
    }
}

/// 解析元组或列表形式的参数：`('Alice', 25, True)`、`[1, 2, 3]`
///
/// 顶层有 n 个元素就返回 n 个值；空括号返回空序列。
/// 缺少闭括号时尽量解析已有的内容。
pub fn tokenize_tuple(raw: &str) -> Vec<ParameterValue> {
    split_top_level(bracket_body(raw))
        .into_iter()
        .map(coerce)
        .collect()
}

/// 解析字典形式的参数：`{'user_id': 123, 'name': 'Bob'}`
///
/// 每一项在第一个冒号处拆成键和值，键去掉引号，结果是 `Named` 值。
/// 没有冒号的项被丢弃。
pub fn tokenize_dict(raw: &str) -> Vec<ParameterValue> {
    split_top_level(bracket_body(raw))
        .into_iter()
        .filter_map(|pair| {
            let (key, value) = pair.split_once(':')?;
            let name = strip_quotes(key.trim());
            if name.is_empty() {
                return None;
            }
            Some(ParameterValue::named(name, coerce(value)))
        })
        .collect()
}

/// 去掉最外层的括号，返回括号内的文本
///
/// 只有末尾是与开头配对的闭括号时才去掉末尾字符。
fn bracket_body(raw: &str) -> &str {
    let raw = raw.trim();
    let mut chars = raw.chars();
    let Some(open) = chars.next() else {
        return raw;
    };
    let Some(close) = closing_bracket(open) else {
        return raw;
    };
    let inner = chars.as_str();
    inner.strip_suffix(close).unwrap_or(inner)
}

/// 按顶层逗号切分，返回去掉首尾空白的元素切片
///
/// 中间的空元素保留（之后推断为 `Null`），末尾的空元素（如 `('a',)`
/// 的尾逗号）不计入。
fn split_top_level(body: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '\'' | '"' => match quote {
                Some(q) if q == c => quote = None,
                None => quote = Some(c),
                Some(_) => {}
            },
            _ if quote.is_some() => {}
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                tokens.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    let last = body[start..].trim();
    if !last.is_empty() {
        tokens.push(last);
    }
    tokens
}

/// 去掉字典键两侧的引号
fn strip_quotes(key: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = key
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    key
}
