//! 包含一些工具函数的模块。

use regex::Regex;
use std::sync::LazyLock;

static BR_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("编译 BR_TAG_REGEX 失败"));

static HTML_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("编译 HTML_TAG_REGEX 失败"));

/// 规范化文本中的空白字符
pub fn normalize_text_whitespace(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    trimmed.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// 去除文本中的 HTML 标签。
///
/// `<br>` 的各种写法会先被替换为换行符，其余标签直接删除。
pub fn strip_html_tags(text: &str) -> String {
    let with_breaks = BR_TAG_REGEX.replace_all(text, "\n");
    HTML_TAG_REGEX.replace_all(&with_breaks, "").into_owned()
}

/// 解码常见的 HTML 实体。
///
/// `&amp;` 最后处理，避免 `&amp;lt;` 被解码两次。
pub fn decode_html_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// 反转义 JavaScript / JSON 字符串字面量中的常见转义序列。
///
/// 处理 `\n`、`\t`、`\r`、`\'`、`\"`、`\\` 和 `\uXXXX`（包括代理对），
/// 其他 `\x` 形式一律还原为 `x`。单次扫描，所以 `\\n` 会得到 `\n` 两个字符而不是换行。
/// 无法配对的代理项替换为 U+FFFD。
pub fn unescape_js_string(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut utf16_units: Vec<u16> = Vec::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some((unit, rest)) = parse_unicode_escape(chars.as_str())
        {
            utf16_units.push(unit);
            chars = rest.chars();
            continue;
        }
        flush_utf16(&mut utf16_units, &mut result);

        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    flush_utf16(&mut utf16_units, &mut result);

    result
}

/// 解析反斜杠之后的 `uXXXX`，返回 UTF-16 码元和剩余的文本。
fn parse_unicode_escape(after_backslash: &str) -> Option<(u16, &str)> {
    let hex = after_backslash.strip_prefix('u')?.get(..4)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let unit = u16::from_str_radix(hex, 16).ok()?;
    Some((unit, &after_backslash[5..]))
}

fn flush_utf16(units: &mut Vec<u16>, out: &mut String) {
    if units.is_empty() {
        return;
    }
    out.extend(
        char::decode_utf16(units.drain(..)).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}

/// 把文本按换行拆分，去除每行首尾空白，并丢弃空行。
pub fn split_non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
