//! 日语歌词分段。
//!
//! 有形态素分析器时按词性寻找自然的断点，否则退回到按助词字符和标点切分的启发式方法。

use unicode_segmentation::UnicodeSegmentation;

use super::analyzer::{Morpheme, PartOfSpeech};

/// 助词后断开所需的最小累计长度。
const PARTICLE_MIN_LEN: usize = 2;

/// 动词、形容词后断开所需的最小累计长度。
const INFLECTED_MIN_LEN: usize = 3;

/// 启发式分段的软上限。
pub(super) const SOFT_CAP: usize = 8;

/// 任何片段都不会超过的长度。
pub(super) const HARD_CAP: usize = 12;

const PARTICLE_CHARS: &[char] = &['が', 'を', 'に', 'で', 'と', 'へ', 'の', 'は', 'も', 'か'];

fn is_break_punctuation(c: char) -> bool {
    matches!(c, '、' | '。' | '！' | '？' | '!' | '?')
}

/// 以字素簇为单位的显示长度。
pub(super) fn display_len(text: &str) -> usize {
    text.graphemes(true).count()
}

fn flush(current: &mut String, segments: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
    current.clear();
}

/// 根据形态素序列分段。
///
/// 断点规则：
/// - 助词之后，累计长度 >= 2
/// - 动词、形容词之后，累计长度 >= 3
/// - 句读点 (、。！？) 之后
/// - 接续词之前，累计长度 >= 2
/// - 加入下一个形态素会超过 `HARD_CAP` 时先断开；单个形态素本身超过 `HARD_CAP` 时按字素簇切开
pub(super) fn split_with_morphemes(morphemes: &[Morpheme]) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for (i, morpheme) in morphemes.iter().enumerate() {
        let surface_len = display_len(&morpheme.surface);
        if display_len(current.trim()) + surface_len > HARD_CAP {
            flush(&mut current, &mut segments);
        }
        if surface_len > HARD_CAP {
            push_oversized(&morpheme.surface, &mut current, &mut segments);
        } else {
            current.push_str(&morpheme.surface);
        }

        let len = display_len(current.trim());
        let next_is_conjunction = morphemes
            .get(i + 1)
            .is_some_and(|next| next.pos == PartOfSpeech::Conjunction);

        let should_break = match morpheme.pos {
            PartOfSpeech::Particle => len >= PARTICLE_MIN_LEN,
            PartOfSpeech::Verb | PartOfSpeech::Adjective => len >= INFLECTED_MIN_LEN,
            _ => false,
        } || morpheme.surface.chars().any(is_break_punctuation)
            || (next_is_conjunction && len >= PARTICLE_MIN_LEN)
            || len >= HARD_CAP;

        if should_break {
            flush(&mut current, &mut segments);
        }
    }
    flush(&mut current, &mut segments);

    segments
}

/// 把超长的形态素按 `HARD_CAP` 个字素簇一段切开，最后不足一段的部分留在 `current` 中。
fn push_oversized(surface: &str, current: &mut String, segments: &mut Vec<String>) {
    let graphemes: Vec<&str> = surface.graphemes(true).collect();
    for chunk in graphemes.chunks(HARD_CAP) {
        current.push_str(&chunk.concat());
        if chunk.len() == HARD_CAP {
            flush(current, segments);
        }
    }
}

/// 不依赖形态素分析的启发式分段。
///
/// 在助词字符（累计长度 >= 2 时）和句读点之后断开，累计长度达到 `SOFT_CAP` 时也断开，
/// 但不会在连续的 ASCII 字母数字中间断开。
pub(super) fn split_heuristic(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut len = 0;
    let mut graphemes = text.graphemes(true).peekable();

    while let Some(grapheme) = graphemes.next() {
        if len == 0 && grapheme.trim().is_empty() {
            continue;
        }
        current.push_str(grapheme);
        len += 1;

        let first = grapheme.chars().next().unwrap_or_default();
        let inside_word = first.is_ascii_alphanumeric()
            && graphemes
                .peek()
                .is_some_and(|next| next.chars().all(|c| c.is_ascii_alphanumeric()));
        let should_break = is_break_punctuation(first)
            || (PARTICLE_CHARS.contains(&first) && len >= PARTICLE_MIN_LEN)
            || (len >= SOFT_CAP && !inside_word);

        if should_break {
            flush(&mut current, &mut segments);
            len = 0;
        }
    }
    flush(&mut current, &mut segments);

    segments
}
