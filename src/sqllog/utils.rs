//! 扫描和分词共用的工具函数

/// 每月天数（非闰年），用于日期合法性校验
pub const DAYS_IN_MONTH: [u8; 12] =
    [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// 日志时间戳前缀的长度：`2024-01-15 10:30:00,123`
pub const TIMESTAMP_LEN: usize = 23;

/// 判断年份是否为闰年
#[must_use]
pub const fn is_leap_year(year: u16) -> bool {
    (year.trailing_zeros() >= 2 && year % 100 != 0) || year % 400 == 0
}

/// 判断字符串是否为日志记录的时间戳前缀
///
/// 接受 Python logging 默认的 `2024-01-15 10:30:00,123`，
/// 也接受毫秒前用 `.` 分隔的写法。
#[must_use]
pub fn is_log_timestamp(s: &str) -> bool {
    if s.len() != TIMESTAMP_LEN {
        return false;
    }

    let b = s.as_bytes();

    // 检查所有分隔符位置
    if !(b[4] == b'-'
        && b[7] == b'-'
        && b[10] == b' '
        && b[13] == b':'
        && b[16] == b':'
        && (b[19] == b',' || b[19] == b'.'))
    {
        return false;
    }

    const DIGITS: [usize; 17] =
        [0, 1, 2, 3, 5, 6, 8, 9, 11, 12, 14, 15, 17, 18, 20, 21, 22];
    if !DIGITS.iter().all(|&i| b[i].is_ascii_digit()) {
        return false;
    }

    let two = |i: usize| (b[i] - b'0') * 10 + (b[i + 1] - b'0');

    // 年份合法性校验
    let year = u16::from(b[0] - b'0') * 1000
        + u16::from(b[1] - b'0') * 100
        + u16::from(b[2] - b'0') * 10
        + u16::from(b[3] - b'0');
    if year == 0 {
        return false;
    }

    // 月份合法性校验
    let month = two(5);
    if month == 0 || month > 12 {
        return false;
    }

    // 获取每月最大天数
    let mut max_days = DAYS_IN_MONTH[month as usize - 1];
    if month == 2 && is_leap_year(year) {
        max_days += 1;
    }

    let day = two(8);
    if day == 0 || day > max_days {
        return false;
    }

    two(11) <= 23 && two(14) <= 59 && two(17) <= 59
}

/// 行首是否带有日志时间戳
#[must_use]
pub fn starts_with_log_timestamp(line: &str) -> bool {
    line.trim_start()
        .get(0..TIMESTAMP_LEN)
        .is_some_and(is_log_timestamp)
}

/// 取文本开头的单词（连续的 ASCII 字母），没有则返回空串
#[must_use]
pub fn leading_word(text: &str) -> &str {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map_or(text.len(), |(i, _)| i);
    // 单词后面紧跟数字或下划线时视为标识符的一部分
    if text[end..].starts_with(|c: char| c.is_ascii_digit() || c == '_') {
        return "";
    }
    &text[..end]
}

/// 是否为标识符字符
#[inline]
#[must_use]
pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// 与开括号配对的闭括号
#[inline]
#[must_use]
pub const fn closing_bracket(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

/// 计算文本中未闭合的括号层数（引号内的括号和被反斜杠转义的字符不计）
///
/// 返回值小于等于 0 表示括号已经平衡（或多出了闭括号）。
#[must_use]
pub fn bracket_depth(text: &str) -> i32 {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
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
            '(' | '[' | '{' if quote.is_none() => depth += 1,
            ')' | ']' | '}' if quote.is_none() => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// 去掉引号括起的部分，只保留引号外的文本
#[must_use]
pub fn strip_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => escaped = c == '\\',
            None if c == '\'' || c == '"' => quote = Some(c),
            None => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_log_timestamp() {
        assert!(is_log_timestamp("2024-01-15 10:30:00,123"));
        assert!(is_log_timestamp("2024-02-29 23:59:59.999"));
        assert!(!is_log_timestamp("2023-02-29 10:30:00,123"));
        assert!(!is_log_timestamp("2024-13-01 10:30:00,123"));
        assert!(!is_log_timestamp("2024-01-15 24:30:00,123"));
        assert!(!is_log_timestamp("2024-01-15T10:30:00,123"));
        assert!(!is_log_timestamp("2024-01-15 10:30:00"));
    }

    #[test]
    fn test_starts_with_log_timestamp() {
        assert!(starts_with_log_timestamp(
            "2024-01-15 10:30:00,123 INFO app: started"
        ));
        assert!(!starts_with_log_timestamp("INFO app: started"));
        assert!(!starts_with_log_timestamp("short"));
    }

    #[test]
    fn test_leading_word() {
        assert_eq!(leading_word("  SELECT * FROM t"), "SELECT");
        assert_eq!(leading_word("BEGIN (implicit)"), "BEGIN");
        assert_eq!(leading_word("select_count FROM t"), "");
        assert_eq!(leading_word("(1, 2)"), "");
        assert_eq!(leading_word("FROM"), "FROM");
    }

    #[test]
    fn test_bracket_depth() {
        assert_eq!(bracket_depth("(1, 2)"), 0);
        assert_eq!(bracket_depth("('a', (1,"), 2);
        assert_eq!(bracket_depth("('(', 1"), 1);
        assert_eq!(bracket_depth(r"('it\'s (', 1)"), 0);
        assert_eq!(bracket_depth("{'a': [1, 2]}"), 0);
    }

    #[test]
    fn test_strip_quoted() {
        assert_eq!(strip_quoted("('a?', 1, \"b\")"), "(, 1, )");
        assert_eq!(strip_quoted(r"('it\'s', ?)"), "(, ?)");
    }

    #[test]
    fn test_is_leap_year() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
    }
}
