//! 翻译版本的识别与过滤。

use crate::model::track::SearchCandidate;

/// 标题或艺术家中出现时，表示该条目是翻译版本的标记（小写）。
const TRANSLATION_MARKERS: &[&str] = &["english translation", "genius english translations"];

/// 判断一个候选是否为翻译版本。
pub fn is_translation_candidate(candidate: &SearchCandidate) -> bool {
    let title = candidate.title.to_lowercase();
    let artist = candidate.artist.to_lowercase();
    TRANSLATION_MARKERS
        .iter()
        .any(|marker| title.contains(marker) || artist.contains(marker))
}

/// 过滤翻译版本。
///
/// 只要还有一个原文候选，就丢弃全部翻译候选；如果全部都是翻译，原样返回。
/// 保留的候选维持原有的相关度顺序。
pub fn filter_translations(candidates: Vec<SearchCandidate>) -> Vec<SearchCandidate> {
    if candidates.iter().all(is_translation_candidate) {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| !is_translation_candidate(c))
        .collect()
}
