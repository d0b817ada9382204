//! 搜索模块
//!
//! 在歌词提供商上搜索候选歌曲，并应用翻译版本过滤策略。此层不做缓存。

use tracing::{info, warn};

use crate::{
    error::{LyricsStageError, Result},
    model::track::SearchCandidate,
    providers::LyricsProvider,
};

mod matcher;
pub use matcher::{filter_translations, is_translation_candidate};

/// 一次搜索的结果：过滤后的候选列表，以及过滤前的命中数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSearch {
    /// 过滤后的候选，原文在前，保持提供商的相关度顺序。
    pub candidates: Vec<SearchCandidate>,
    /// 提供商返回的原始命中数量。
    pub found_results: usize,
}

/// 在指定提供商上搜索候选歌曲。
///
/// # 参数
/// * `provider` - 实现了 `LyricsProvider` trait 的提供商。
/// * `query` - 查询字符串。空白查询返回 `InvalidInput`。
///
/// # 返回
/// 一个 `Result`，成功时包含过滤后的候选列表。提供商的错误原样向上传递。
pub async fn search_candidates(
    provider: &dyn LyricsProvider,
    query: &str,
) -> Result<CandidateSearch> {
    if query.trim().is_empty() {
        return Err(LyricsStageError::InvalidInput(
            "查询字符串不能为空".to_string(),
        ));
    }

    let raw = provider.search_songs(query).await.inspect_err(|e| {
        warn!("[Search] 提供商 '{}' 的搜索失败: {e}", provider.name());
    })?;
    let found_results = raw.len();
    let candidates = filter_translations(raw);

    info!(
        "[Search] 原始结果 {found_results} 条，过滤翻译版本后 {} 条。",
        candidates.len()
    );

    Ok(CandidateSearch {
        candidates,
        found_results,
    })
}
