use lyrics_stage_rs::{
    extractor::{ExtractorOptions, HtmlLineExtractor},
    model::lyrics::ExtractionStrategy,
    processors::{line_cleaner, segmenter::Segmenter},
};

use std::{fs, path::Path};

fn load_test_data(filename: &str) -> String {
    let path = Path::new("tests/test_data").join(filename);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("无法读取测试文件 {}: {e}", path.display()))
}

fn extractor() -> HtmlLineExtractor {
    HtmlLineExtractor::new(ExtractorOptions::default())
}

#[test]
fn test_structural_page_is_extracted_and_cleaned() {
    let html = load_test_data("structural_page.html");

    let extraction = extractor().extract_detailed(&html).unwrap();
    assert_eq!(extraction.strategy, ExtractionStrategy::Structural);
    assert_eq!(extraction.detail, r#"[data-lyrics-container="true"]"#);

    let lines = line_cleaner::clean(&extraction.lines);
    insta::assert_debug_snapshot!(lines, @r#"
    [
        "[Verse 1]",
        "夢ならばどれほどよかったでしょう",
        "未だにあなたのことを夢にみる",
        "忘れた物を取りに帰るように",
        "古びた思い出の埃を払う",
        "[Chorus]",
        "あの日の悲しみさえ",
        "あの日の苦しみさえ",
    ]
    "#);
}

#[test]
fn test_preloaded_state_only_page_uses_embedded_data() {
    let html = load_test_data("preloaded_state_page.html");

    let extraction = extractor().extract_detailed(&html).unwrap();
    assert_eq!(extraction.strategy, ExtractionStrategy::EmbeddedData);
    assert_eq!(extraction.detail, "preloaded-state");
    assert_eq!(
        extraction.lines,
        vec![
            "[Verse 1]",
            "Dreams would have been so much better",
            "I still see you in my dreams",
            "Like going back for something forgotten",
            "I brush the dust off old memories",
        ]
    );
}

#[test]
fn test_page_without_lyrics_yields_nothing() {
    let html = load_test_data("no_lyrics_page.html");

    assert!(extractor().extract_detailed(&html).is_none());
    assert!(extractor().extract(&html).is_empty());
}

#[test]
fn test_extracted_lines_segment_in_order() {
    let html = load_test_data("structural_page.html");
    let lines = line_cleaner::clean(&extractor().extract(&html));

    let segments = Segmenter::segment_heuristic(&lines);

    assert!(!segments.is_empty());
    assert!(segments.iter().all(|s| !s.as_str().trim().is_empty()));
    assert!(
        segments
            .windows(2)
            .all(|pair| pair[0].line_index() <= pair[1].line_index())
    );
    // 段落标记行不产生片段
    assert!(segments.iter().all(|s| s.line_index() != 0 && s.line_index() != 5));
    assert!(segments.iter().any(|s| s.line_index() == 1));
}
