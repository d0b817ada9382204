//! 歌词分段器。
//!
//! 把清洗后的歌词行切成适合逐段显示的短片段。含有假名或汉字的行优先使用形态素分析，
//! 其余的行按标点和词数切分。输出顺序严格跟随输入行的顺序。

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::{model::lyrics::Segment, utils::normalize_text_whitespace};

pub mod analyzer;
mod japanese;
mod latin;

pub use analyzer::{
    AnalyzerLoader, AnalyzerState, DictionaryLoader, MorphAnalyzer, MorphologyHandle, Morpheme,
    PartOfSpeech, VibratoAnalyzer,
};

/// 匹配 `[Verse]`、`(Chorus)` 这类段落标记。
static SECTION_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]|\([^)]*\)").expect("编译 SECTION_MARKER_REGEX 失败")
});

/// 判断文本是否含有平假名、片假名或 CJK 统一汉字。
pub fn is_cjk_bearing(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{3040}'..='\u{309F}' // 平假名
            | '\u{30A0}'..='\u{30FF}' // 片假名
            | '\u{4E00}'..='\u{9FFF}') // CJK 统一汉字
    })
}

/// 去除段落标记并规范化空白。结果可能为空。
pub fn strip_section_markers(line: &str) -> String {
    normalize_text_whitespace(&SECTION_MARKER_REGEX.replace_all(line, ""))
}

/// 歌词分段器。
///
/// 持有形态素分析器的共享句柄；分析器在第一次遇到日语行时才加载。
pub struct Segmenter {
    morphology: Option<Arc<MorphologyHandle>>,
}

impl Segmenter {
    /// 使用给定的形态素分析器句柄创建分段器。
    pub fn new(morphology: Arc<MorphologyHandle>) -> Self {
        Self {
            morphology: Some(morphology),
        }
    }

    /// 创建一个只使用启发式规则的分段器。
    pub fn heuristic_only() -> Self {
        Self { morphology: None }
    }

    /// 形态素分析器的当前状态。
    pub fn analyzer_state(&self) -> AnalyzerState {
        match &self.morphology {
            Some(handle) => handle.state(),
            None => AnalyzerState::Disabled,
        }
    }

    /// 对歌词行进行分段。
    ///
    /// 结果是一次性完整计算出来的。相同输入在分析器就绪后总是得到相同的输出。
    ///
    /// # 参数
    /// * `lines` - 清洗后的歌词行。
    ///
    /// # 返回
    /// 按输入顺序排列的片段，每个片段都记录了来源行号。
    pub async fn segment<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Segment> {
        let prepared = prepare_lines(lines);

        let analyzer = match &self.morphology {
            Some(handle) if prepared.iter().any(|(_, line)| is_cjk_bearing(line)) => {
                handle.get().await
            }
            _ => None,
        };

        let segments = build_segments(&prepared, analyzer.as_deref());
        debug!(
            "[Segmenter] {} 行歌词被分为 {} 个片段 (形态素分析: {})",
            lines.len(),
            segments.len(),
            analyzer.is_some()
        );
        segments
    }

    /// 只使用启发式规则进行分段，不会等待分析器加载。
    pub fn segment_heuristic<S: AsRef<str>>(lines: &[S]) -> Vec<Segment> {
        build_segments(&prepare_lines(lines), None)
    }
}

fn prepare_lines<S: AsRef<str>>(lines: &[S]) -> Vec<(usize, String)> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let stripped = strip_section_markers(line.as_ref());
            (!stripped.is_empty()).then_some((index, stripped))
        })
        .collect()
}

fn build_segments(
    prepared: &[(usize, String)],
    analyzer: Option<&dyn MorphAnalyzer>,
) -> Vec<Segment> {
    prepared
        .iter()
        .flat_map(|(index, line)| {
            split_line(line, analyzer)
                .into_iter()
                .filter_map(move |text| Segment::new(&text, *index))
        })
        .collect()
}

fn split_line(line: &str, analyzer: Option<&dyn MorphAnalyzer>) -> Vec<String> {
    if !is_cjk_bearing(line) {
        return latin::split_latin(line);
    }

    // 空白本身就是自然的断点。连续的非 CJK 短语合并后按拉丁文本处理，不会被拆开单词
    let mut segments = Vec::new();
    let mut latin_run: Vec<&str> = Vec::new();
    for phrase in line.split_whitespace() {
        if !is_cjk_bearing(phrase) {
            latin_run.push(phrase);
            continue;
        }
        flush_latin_run(&mut latin_run, &mut segments);
        segments.extend(split_cjk_phrase(phrase, analyzer));
    }
    flush_latin_run(&mut latin_run, &mut segments);

    segments
}

fn flush_latin_run(run: &mut Vec<&str>, segments: &mut Vec<String>) {
    if !run.is_empty() {
        segments.extend(latin::split_latin(&run.join(" ")));
        run.clear();
    }
}

fn split_cjk_phrase(phrase: &str, analyzer: Option<&dyn MorphAnalyzer>) -> Vec<String> {
    match analyzer {
        Some(analyzer) => {
            let morphemes = analyzer.tokenize(phrase);
            if morphemes.is_empty() {
                warn!("[Segmenter] 分析器对 '{phrase}' 没有返回任何形态素，改用启发式分段。");
                japanese::split_heuristic(phrase)
            } else {
                japanese::split_with_morphemes(&morphemes)
            }
        }
        None => japanese::split_heuristic(phrase),
    }
}
