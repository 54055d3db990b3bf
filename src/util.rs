use chrono::NaiveDate;
use log::info;
use std::collections::BTreeMap;
use crate::errors::Result;

// 日期转换工具
pub fn parse_iso_date(date_str: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")?)
}

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn previous_day(date: &NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}

// 限制历史记录天数，保留日期最新的 max_days 条
pub fn limit_history_window<V>(history: &mut BTreeMap<NaiveDate, V>, max_days: usize) {
    if history.len() > max_days {
        info!("Limiting {} history records to the {} most recent dates",
              history.len(), max_days);
        while history.len() > max_days {
            history.pop_first();
        }
    }
}

/// 四舍五入到指定小数位；位数过大无法表示时原值返回
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(i32::try_from(places).unwrap_or(i32::MAX));
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() { rounded } else { value }
}

/// 合并连续空白
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 从文本中解析第一个数值：跳过货币符号和空白，去掉千分位逗号
///
/// `"₹ 13,069"` → `13069.0`，`"190.00 (+1)"` → `190.0`。
/// 格式错误（如多个小数点）返回 `None`。
pub fn parse_price_token(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let token: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    let token = token.trim_end_matches('.');

    if token.matches('.').count() > 1 {
        return None;
    }

    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 截取前 n 个字符（按字符而非字节）
pub fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// 按行切分长消息，每段不超过 limit 个字符；超长的单行按字符硬切
///
/// 用 `"\n"` 连接各段即可还原原文，空行不会丢失。
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    // 空行也算开始了一段，不能用 current.is_empty() 判断
    let mut started = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if started { current_len + 1 + line_len } else { line_len };

        if needed <= limit {
            if started {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
            started = true;
            continue;
        }

        if started {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        let mut rest = line;
        while rest.chars().count() > limit {
            let head = take_chars(rest, limit);
            chunks.push(head.to_string());
            rest = &rest[head.len()..];
        }
        current.push_str(rest);
        current_len = rest.chars().count();
        started = true;
    }

    if started {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_token() {
        assert_eq!(parse_price_token("₹ 13,069"), Some(13069.0));
        assert_eq!(parse_price_token("Rs. 1,20,500.50 per 10g"), Some(120500.5));
        assert_eq!(parse_price_token("190.00 (+1)"), Some(190.0));
        assert_eq!(parse_price_token("190."), Some(190.0));
        assert_eq!(parse_price_token("1.2.3"), None);
        assert_eq!(parse_price_token("no digits"), None);
        assert_eq!(parse_price_token(""), None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(13069.104, 2), 13069.1);
        assert_eq!(round_to(0.1 + 0.2, 2), 0.3);
        assert_eq!(round_to(5.5, 0), 6.0);
        assert_eq!(round_to(190.25, 400), 190.25);
        assert_eq!(round_to(190.25, u32::MAX), 190.25);
    }

    #[test]
    fn test_limit_history_window_drops_oldest() {
        let mut history = BTreeMap::new();
        for day in 1..=5 {
            history.insert(NaiveDate::from_ymd_opt(2025, 6, day).unwrap(), day);
        }
        limit_history_window(&mut history, 3);
        let days: Vec<u32> = history.values().copied().collect();
        assert_eq!(days, vec![3, 4, 5]);
    }

    #[test]
    fn test_take_chars_multibyte() {
        assert_eq!(take_chars("₹₹₹abc", 4), "₹₹₹a");
        assert_eq!(take_chars("ab", 10), "ab");
    }

    #[test]
    fn test_split_message_respects_limit_and_lines() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(split_message(text, 9), vec!["aaaa\nbbbb", "cccc"]);
        assert_eq!(split_message(text, 100), vec![text]);

        let long = "x".repeat(25);
        let chunks = split_message(&long, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), long);
    }

    #[test]
    fn test_split_message_keeps_blank_lines() {
        let text = "aaaa\n\nbbbb";
        let chunks = split_message(text, 4);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
        assert_eq!(chunks.join("\n"), text);

        let blocks = "block one\n\nblock two\n\nblock three";
        let chunks = split_message(blocks, 12);
        assert_eq!(chunks, vec!["block one\n", "block two\n", "block three"]);
        assert_eq!(chunks.join("\n"), blocks);

        assert!(split_message("", 10).is_empty());
    }

    #[test]
    fn test_iso_dates() {
        let date = parse_iso_date("2025-06-02").unwrap();
        assert_eq!(format_iso_date(&date), "2025-06-02");
        assert_eq!(previous_day(&date), NaiveDate::from_ymd_opt(2025, 6, 1));
        assert!(parse_iso_date("02/06/2025").is_err());
    }
}
