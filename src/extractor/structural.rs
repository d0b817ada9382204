//! 基于已知歌词容器元素的结构化提取。

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use super::{Extraction, Strategy};
use crate::{model::lyrics::ExtractionStrategy, utils::split_non_empty_lines};

/// 已知的歌词容器选择器，按优先级排列：
/// 稳定的 data 属性、带版本号的类名、类名子串匹配、通用类名。
pub const CONTAINER_SELECTORS: &[&str] = &[
    r#"[data-lyrics-container="true"]"#,
    ".Lyrics__Container-sc-1ynbvzw-1",
    ".Lyrics__Container-sc-1ynbvzw-6",
    ".RichText__Container-oz284w-0",
    r#"[class*="Lyrics__Container"]"#,
    r#"[class*="RichText__Container"]"#,
    ".lyrics",
];

static PARSED_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    CONTAINER_SELECTORS
        .iter()
        .map(|s| (*s, Selector::parse(s).expect("编译歌词容器选择器失败")))
        .collect()
});

/// 内容不属于歌词、需要整体跳过的元素。
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// 结束时产生换行的块级元素。
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "section", "article",
];

/// 按选择器表查找歌词容器的策略。
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralStrategy;

impl Strategy for StructuralStrategy {
    fn kind(&self) -> ExtractionStrategy {
        ExtractionStrategy::Structural
    }

    fn try_extract(&self, html: &str, min_lines: usize) -> Option<Extraction> {
        let document = Html::parse_document(html);

        for (selector_str, selector) in PARSED_SELECTORS.iter() {
            let mut lines = Vec::new();
            let mut matched = 0;
            for element in document.select(selector) {
                matched += 1;
                let mut text = String::new();
                collect_text(element, &mut text);
                lines.extend(split_non_empty_lines(&text));
            }

            if matched == 0 {
                continue;
            }
            debug!(
                "[Extractor] 选择器 '{selector_str}' 匹配到 {matched} 个元素，共 {} 行。",
                lines.len()
            );
            if !lines.is_empty() && lines.len() >= min_lines {
                return Some(Extraction {
                    strategy: ExtractionStrategy::Structural,
                    detail: (*selector_str).to_string(),
                    lines,
                });
            }
        }

        None
    }
}

/// 递归收集元素的文本内容。
///
/// `<br>` 变为换行，块级元素结束时追加换行。
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                if SKIPPED_ELEMENTS.contains(&name)
                    || el.attr("data-exclude-from-selection").is_some()
                {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, out);
                }
                if BLOCK_ELEMENTS.contains(&name) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Option<Extraction> {
        StructuralStrategy.try_extract(html, 1)
    }

    #[test]
    fn test_all_selectors_parse() {
        assert_eq!(PARSED_SELECTORS.len(), CONTAINER_SELECTORS.len());
    }

    #[test]
    fn test_data_attribute_containers_in_document_order() {
        let html = r#"
            <html><body>
              <div data-lyrics-container="true">[Verse 1]<br>First line<br><a href="/x"><span>Second</span> line</a></div>
              <div class="ad">Buy now</div>
              <div data-lyrics-container="true">Third line<br/>Fourth line</div>
            </body></html>
        "#;

        let extraction = extract(html).unwrap();
        assert_eq!(extraction.detail, r#"[data-lyrics-container="true"]"#);
        assert_eq!(
            extraction.lines,
            vec!["[Verse 1]", "First line", "Second line", "Third line", "Fourth line"]
        );
    }

    #[test]
    fn test_excluded_and_script_elements_are_skipped() {
        let html = r#"
            <div data-lyrics-container="true">
              <div data-exclude-from-selection="true">12 Contributors</div>
              <script>var x = "not lyrics";</script>
              <style>.a { color: red; }</style>
              Real line one<br>Real line two
            </div>
        "#;

        assert_eq!(extract(html).unwrap().lines, vec!["Real line one", "Real line two"]);
    }

    #[test]
    fn test_block_elements_break_lines() {
        let html = r#"<div class="lyrics"><p>Para one</p><p>Para two</p>tail</div>"#;
        let extraction = extract(html).unwrap();
        assert_eq!(extraction.detail, ".lyrics");
        assert_eq!(extraction.lines, vec!["Para one", "Para two", "tail"]);
    }

    #[test]
    fn test_higher_priority_selector_wins() {
        let html = r#"
            <div class="lyrics">generic</div>
            <div class="Lyrics__Container-sc-abc123">substring match</div>
        "#;
        let extraction = extract(html).unwrap();
        assert_eq!(extraction.detail, r#"[class*="Lyrics__Container"]"#);
        assert_eq!(extraction.lines, vec!["substring match"]);
    }

    #[test]
    fn test_empty_container_falls_through_to_next_selector() {
        let html = r#"
            <div data-lyrics-container="true">   </div>
            <div class="lyrics">fallback line</div>
        "#;
        assert_eq!(extract(html).unwrap().lines, vec!["fallback line"]);
    }

    #[test]
    fn test_no_container_returns_none() {
        assert!(extract("<html><body><p>hello</p></body></html>").is_none());
    }

    #[test]
    fn test_min_lines_threshold() {
        let html = r#"<div data-lyrics-container="true">only one</div>"#;
        assert!(StructuralStrategy.try_extract(html, 2).is_none());
    }
}
