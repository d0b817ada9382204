//! 从页面内嵌的 JSON 数据中提取歌词。
//!
//! 页面渲染前的初始状态通常以 `JSON.parse('...')` 的形式写在脚本里，
//! 有时歌词也以 `"lyrics"`、`"body"`、`"plain"` 字段直接出现在内联数据中。

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{Extraction, Strategy};
use crate::{
    model::lyrics::ExtractionStrategy,
    utils::{decode_html_entities, split_non_empty_lines, strip_html_tags, unescape_js_string},
};

/// 内嵌数据模式表，按优先级排列。捕获组 1 是转义后的字符串内容。
pub const EMBEDDED_PATTERNS: &[(&str, &str)] = &[
    (
        "preloaded-state",
        r"(?s)window\.__PRELOADED_STATE__\s*=\s*JSON\.parse\('((?:[^'\\]|\\.)*)'\)",
    ),
    ("lyrics-field", r#"(?s)"lyrics"\s*:\s*"((?:[^"\\]|\\.)*)""#),
    (
        "body-html-field",
        r#"(?s)"body"\s*:\s*\{\s*"html"\s*:\s*"((?:[^"\\]|\\.)*)""#,
    ),
    ("plain-field", r#"(?s)"plain"\s*:\s*"((?:[^"\\]|\\.)*)""#),
];

static COMPILED_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    EMBEDDED_PATTERNS
        .iter()
        .map(|(name, pattern)| (*name, Regex::new(pattern).expect("编译内嵌数据模式失败")))
        .collect()
});

/// 在 JSON 中寻找歌词字符串时优先查看的键名片段。
const KEY_HINTS: &[&str] = &["lyrics", "body"];

/// 被视为歌词正文的字符串的最小长度（字符数）。
const MIN_TEXT_CHARS: usize = 100;

/// JSON 遍历的最大深度。
const MAX_DEPTH: usize = 32;

/// JSON 遍历最多访问的节点数。
const MAX_VISITED_NODES: usize = 20_000;

/// 内嵌数据提取策略。
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedDataStrategy;

impl Strategy for EmbeddedDataStrategy {
    fn kind(&self) -> ExtractionStrategy {
        ExtractionStrategy::EmbeddedData
    }

    fn try_extract(&self, html: &str, min_lines: usize) -> Option<Extraction> {
        for (name, regex) in COMPILED_PATTERNS.iter() {
            let Some(captured) = regex.captures(html).and_then(|caps| caps.get(1)) else {
                continue;
            };

            let lines = recover_lines(captured.as_str());
            debug!("[Extractor] 内嵌模式 '{name}' 恢复出 {} 行。", lines.len());
            if !lines.is_empty() && lines.len() >= min_lines {
                return Some(Extraction {
                    strategy: ExtractionStrategy::EmbeddedData,
                    detail: (*name).to_string(),
                    lines,
                });
            }
        }

        None
    }
}

/// 把一个捕获到的转义字符串还原成歌词行。
///
/// 反转义后若内容像 JSON 且能解析，就在其中寻找歌词字符串；否则把内容直接当作文本。
fn recover_lines(captured: &str) -> Vec<String> {
    let unescaped = unescape_js_string(captured);
    let trimmed = unescaped.trim_start();

    let text = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => match find_lyrics_text(&value) {
                Some(found) => found.to_string(),
                None => {
                    debug!("[Extractor] JSON 解析成功，但没有找到歌词字符串。");
                    return Vec::new();
                }
            },
            Err(e) => {
                debug!("[Extractor] 内嵌内容不是有效的 JSON ({e})，按纯文本处理。");
                unescaped
            }
        }
    } else {
        unescaped
    };

    // 部分页面对换行做了双重转义
    let text = text.replace("\\n", "\n");
    split_non_empty_lines(&decode_html_entities(&strip_html_tags(&text)))
}

fn looks_like_lyrics(text: &str) -> bool {
    text.chars().count() > MIN_TEXT_CHARS && (text.contains('\n') || text.contains("<br"))
}

fn is_hinted_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    KEY_HINTS.iter().any(|hint| lower.contains(hint))
}

/// 在 JSON 树中寻找第一个看起来像歌词正文的字符串。
///
/// 每一层对象都先搜索键名含有提示词的值，再按文档顺序搜索其余的值。
/// 遍历深度和访问节点数都有上限。
pub fn find_lyrics_text(root: &Value) -> Option<&str> {
    let mut budget = MAX_VISITED_NODES;
    find_in(root, 0, &mut budget)
}

fn find_in<'a>(value: &'a Value, depth: usize, budget: &mut usize) -> Option<&'a str> {
    if depth > MAX_DEPTH || *budget == 0 {
        return None;
    }
    *budget -= 1;

    match value {
        Value::String(s) if looks_like_lyrics(s) => Some(s),
        Value::Object(map) => {
            let (hinted, rest): (Vec<_>, Vec<_>) = map.iter().partition(|(k, _)| is_hinted_key(k));
            hinted
                .into_iter()
                .chain(rest)
                .find_map(|(_, child)| find_in(child, depth + 1, budget))
        }
        Value::Array(items) => items
            .iter()
            .find_map(|child| find_in(child, depth + 1, budget)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn long_lyrics() -> String {
        (1..=8)
            .map(|i| format!("This is lyric line number {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(COMPILED_PATTERNS.len(), EMBEDDED_PATTERNS.len());
    }

    #[test]
    fn test_preloaded_state_with_html_body() {
        let html = r#"<script>window.__PRELOADED_STATE__ = JSON.parse('{\"songPage\":{\"title\":\"x\",\"lyricsData\":{\"body\":{\"html\":\"<p>I\'m on the first line<br>\\nRock &amp; roll on the second<br>\\nAnd a third line to pad<br>\\nA fourth one to be long enough</p>\"}}}}');</script>"#;

        let extraction = EmbeddedDataStrategy.try_extract(html, 1).unwrap();
        assert_eq!(extraction.detail, "preloaded-state");
        assert_eq!(
            extraction.lines,
            vec![
                "I'm on the first line",
                "Rock & roll on the second",
                "And a third line to pad",
                "A fourth one to be long enough",
            ]
        );
    }

    #[test]
    fn test_inline_lyrics_field_as_text() {
        let html = r#"<script>var data = {"id": 1, "lyrics": "First \"quoted\" line\nSecond line"};</script>"#;

        let extraction = EmbeddedDataStrategy.try_extract(html, 1).unwrap();
        assert_eq!(extraction.detail, "lyrics-field");
        assert_eq!(extraction.lines, vec!["First \"quoted\" line", "Second line"]);
    }

    #[test]
    fn test_body_html_field() {
        let html = r#"{"body": {"html": "<p>Alpha<br/>Beta</p>"}}"#;
        let extraction = EmbeddedDataStrategy.try_extract(html, 1).unwrap();
        assert_eq!(extraction.detail, "body-html-field");
        assert_eq!(extraction.lines, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_no_pattern_returns_none() {
        assert!(EmbeddedDataStrategy.try_extract("<html></html>", 1).is_none());
    }

    #[test]
    fn test_find_prefers_hinted_keys() {
        let lyrics = long_lyrics();
        let decoy = format!("decoy\n{}", "d".repeat(150));
        let value = json!({
            "comments": decoy,
            "lyricsBody": lyrics,
        });

        assert_eq!(find_lyrics_text(&value), Some(lyrics.as_str()));
    }

    #[test]
    fn test_find_descends_unhinted_values_in_order() {
        let lyrics = long_lyrics();
        let value = json!({
            "meta": { "short": "too\nshort" },
            "payload": [{ "nothing": 1 }, { "text": lyrics }],
        });

        assert_eq!(find_lyrics_text(&value), Some(lyrics.as_str()));
    }

    #[test]
    fn test_find_ignores_short_or_single_line_strings() {
        let value = json!({ "lyrics": "x".repeat(500), "body": "a\nb" });
        assert_eq!(find_lyrics_text(&value), None);
    }

    #[test]
    fn test_find_is_depth_bounded() {
        let mut value = json!({ "lyrics": long_lyrics() });
        for _ in 0..(MAX_DEPTH + 5) {
            value = json!({ "lyrics": value });
        }
        assert_eq!(find_lyrics_text(&value), None);
    }

    #[test]
    fn test_unparseable_json_falls_back_to_text() {
        assert_eq!(
            recover_lines(r#"{broken json\nsecond"#),
            vec!["{broken json", "second"]
        );
    }

    #[test]
    fn test_unicode_escapes_in_inline_field_are_decoded() {
        let html = r#"<script>var d = {"lyrics": "\u3042\u306a\u305f\nRock \u0026 Roll"};</script>"#;

        let extraction = EmbeddedDataStrategy.try_extract(html, 1).unwrap();
        assert_eq!(extraction.detail, "lyrics-field");
        assert_eq!(extraction.lines, vec!["あなた", "Rock & Roll"]);
    }

    #[test]
    fn test_unicode_escapes_inside_preloaded_state() {
        let body = (1..=4)
            .map(|i| format!(r"\\u3042\\u306a\\u305f line {i} \\u0026 more padding text"))
            .collect::<Vec<_>>()
            .join(r"\\n");
        let html = format!(
            r#"<script>window.__PRELOADED_STATE__ = JSON.parse('{{\"lyricsData\":{{\"body\":{{\"plain\":\"{body}\"}}}}}}');</script>"#
        );

        let extraction = EmbeddedDataStrategy.try_extract(&html, 1).unwrap();
        assert_eq!(extraction.detail, "preloaded-state");
        assert_eq!(extraction.lines.len(), 4);
        assert_eq!(extraction.lines[0], "あなた line 1 & more padding text");
    }
}
