//! 歌词解析编排器。
//!
//! 对每个查询：检查缓存 → 搜索候选 → 依次获取候选页面并提取、清洗歌词 →
//! 第一个得到歌词的候选胜出。所有候选都失败时合成一个回退结果。
//! 这里的任何失败都不会以错误的形式返回给调用方。

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info, instrument, warn};

use crate::{
    extractor::{ExtractorOptions, HtmlLineExtractor},
    model::{
        lyrics::{ExtractionMeta, ExtractionStrategy, FailureKind, LyricsResult},
        track::SearchCandidate,
    },
    processors::line_cleaner,
    providers::LyricsProvider,
    search::search_candidates,
};

pub mod cache;
pub use cache::ResultCache;

/// 回退结果中无法推断时使用的艺术家名。
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// 回退结果中无法推断时使用的标题。
pub const UNKNOWN_SONG: &str = "Unknown Song";

/// 解析器的可调参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// 最多尝试的候选数。
    pub max_candidates: usize,
    /// 成功结果的缓存有效期。
    pub cache_ttl: Duration,
    /// 回退结果的缓存有效期。
    pub fallback_cache_ttl: Duration,
    /// 缓存的最大条目数。
    pub cache_capacity: usize,
    /// 提取器参数。
    pub extractor: ExtractorOptions,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_candidates: 3,
            cache_ttl: Duration::from_secs(300),
            fallback_cache_ttl: Duration::from_secs(300),
            cache_capacity: 512,
            extractor: ExtractorOptions::default(),
        }
    }
}

/// 歌词解析器。
pub struct LyricsResolver {
    provider: Arc<dyn LyricsProvider>,
    extractor: HtmlLineExtractor,
    cache: ResultCache,
    inflight: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    max_candidates: usize,
}

/// 生成缓存键：去除首尾空白并转为小写。
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// 从原始查询推测标题和艺术家。
///
/// 至少两个词时，最后一个词视为艺术家，其余视为标题；只有一个词时它就是标题。
pub fn guess_title_artist(query: &str) -> (String, String) {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    match tokens.split_last() {
        None => (UNKNOWN_SONG.to_string(), UNKNOWN_ARTIST.to_string()),
        Some((only, [])) => (only.to_string(), UNKNOWN_ARTIST.to_string()),
        Some((last, rest)) => (rest.join(" "), last.to_string()),
    }
}

/// 单飞映射表中的一个槽位。
///
/// 析构时若没有其他调用仍在使用该槽位，就把它从映射表中移除，
/// 解析中途被取消时也是如此。
struct InflightSlot<'a> {
    map: &'a DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    key: &'a str,
    slot: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> InflightSlot<'a> {
    fn acquire(map: &'a DashMap<String, Arc<tokio::sync::Mutex<()>>>, key: &'a str) -> Self {
        let slot = Arc::clone(&map.entry(key.to_string()).or_default());
        Self { map, key, slot }
    }
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        // 自己和映射表各持有一份引用时，说明没有其他等待者
        self.map
            .remove_if(self.key, |_, slot| Arc::strong_count(slot) <= 2);
    }
}

/// 记录在回退结果中的失败原因。
struct Failure {
    kind: FailureKind,
    detail: String,
    found_results: usize,
}

impl LyricsResolver {
    /// 创建一个新的解析器。
    pub fn new(provider: Arc<dyn LyricsProvider>, options: ResolverOptions) -> Self {
        Self {
            provider,
            extractor: HtmlLineExtractor::new(options.extractor),
            cache: ResultCache::new(
                options.cache_capacity,
                options.cache_ttl,
                options.fallback_cache_ttl,
            ),
            inflight: DashMap::new(),
            max_candidates: options.max_candidates.max(1),
        }
    }

    /// 结果缓存，主要供测试和诊断使用。
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// 解析一个查询。总是返回一个结果，失败时 `is_fallback` 为 `true`。
    ///
    /// 同一个规范化查询的并发调用共享同一次解析。
    #[instrument(skip(self))]
    pub async fn resolve(&self, query: &str) -> LyricsResult {
        let key = normalize_query(query);
        if let Some(cached) = self.cache.get(&key) {
            debug!("[Resolver] 命中缓存: '{key}'");
            return cached;
        }

        let inflight = InflightSlot::acquire(&self.inflight, &key);
        let _lock = inflight.slot.lock().await;

        // 等待期间可能已有其他调用完成了同一次解析
        match self.cache.get(&key) {
            Some(cached) => {
                debug!("[Resolver] 复用并发调用的解析结果: '{key}'");
                cached
            }
            None => {
                let result = self.resolve_uncached(query).await;
                self.cache.insert(key.clone(), result.clone());
                result
            }
        }
    }

    async fn resolve_uncached(&self, query: &str) -> LyricsResult {
        info!("[Resolver] 开始解析: '{query}'");

        let search = match search_candidates(self.provider.as_ref(), query).await {
            Ok(search) => search,
            Err(e) => {
                return self.build_fallback(
                    query,
                    Failure {
                        kind: e.failure_kind(),
                        detail: e.to_string(),
                        found_results: 0,
                    },
                );
            }
        };

        let mut fetch_failures = Vec::new();
        let mut tried = 0;
        for (index, candidate) in search
            .candidates
            .iter()
            .take(self.max_candidates)
            .enumerate()
        {
            tried += 1;
            info!(
                "[Resolver] 尝试第 {} 个候选: {} - {}",
                index + 1,
                candidate.title,
                candidate.artist
            );

            let html = match self
                .provider
                .fetch_lyrics_page(&candidate.lyrics_page_url)
                .await
            {
                Ok(html) => html,
                Err(e) => {
                    warn!("[Resolver] 候选 {} 的页面获取失败: {e}", index + 1);
                    fetch_failures.push(e.to_string());
                    continue;
                }
            };

            let Some(extraction) = self.extractor.extract_detailed(&html) else {
                warn!("[Resolver] 候选 {} 的页面中没有提取到歌词。", index + 1);
                continue;
            };

            let lines = line_cleaner::clean(&extraction.lines);
            if lines.is_empty() {
                warn!("[Resolver] 候选 {} 的歌词在清洗后为空。", index + 1);
                continue;
            }

            info!(
                "[Resolver] 成功从候选 {} 获取 {} 行歌词。",
                index + 1,
                lines.len()
            );
            return build_success(
                query,
                candidate,
                index,
                search.found_results,
                extraction.strategy,
                extraction.detail,
                lines,
            );
        }

        let failure = if tried > 0 && fetch_failures.len() == tried {
            Failure {
                kind: FailureKind::PageFetchError,
                detail: fetch_failures.join("; "),
                found_results: search.found_results,
            }
        } else {
            Failure {
                kind: FailureKind::NoLyricsFound,
                detail: format!("{tried} 个候选均未提取到歌词"),
                found_results: search.found_results,
            }
        };
        self.build_fallback(query, failure)
    }

    fn build_fallback(&self, query: &str, failure: Failure) -> LyricsResult {
        warn!(
            "[Resolver] 使用回退结果 ({}): {}",
            failure.kind, failure.detail
        );
        let (title, artist) = guess_title_artist(query);

        let mut lines = vec![
            format!("🎵 {title}"),
            format!("🎤 {artist}"),
            "歌詞の取得に失敗しました".to_string(),
            "考えられる原因:".to_string(),
            "• 楽曲名やアーティスト名が正確でない".to_string(),
            "• Geniusに歌詞が登録されていない".to_string(),
            "• ネットワーク接続の問題".to_string(),
            "• サイトの構造変更".to_string(),
            "対処法:".to_string(),
            "• 楽曲名とアーティスト名を正確に入力".to_string(),
            "• 英語表記で試してみる".to_string(),
            "• 別の楽曲で試してみる".to_string(),
            format!("検索クエリ: \"{}\"", query.trim()),
            format!("エラー: {}", failure.detail),
        ];
        lines.push(if failure.found_results > 0 {
            format!("検索結果: {}件見つかりました", failure.found_results)
        } else {
            "検索結果: 0件".to_string()
        });

        let now = Utc::now();
        LyricsResult {
            id: u64::try_from(now.timestamp_millis()).unwrap_or_default(),
            title,
            artist,
            extraction_meta: ExtractionMeta {
                search_query: query.to_string(),
                strategy_used: None,
                strategy_detail: None,
                candidate_index: None,
                line_count: lines.len(),
                found_results: failure.found_results,
                failure: Some(failure.kind),
                failure_detail: Some(failure.detail),
                timestamp: now,
            },
            lines,
            source_url: self.provider.search_page_url(query.trim()),
            is_fallback: true,
        }
    }
}

fn build_success(
    query: &str,
    candidate: &SearchCandidate,
    index: usize,
    found_results: usize,
    strategy: ExtractionStrategy,
    detail: String,
    lines: Vec<String>,
) -> LyricsResult {
    LyricsResult {
        id: candidate.external_id,
        title: candidate.title.clone(),
        artist: candidate.artist.clone(),
        source_url: candidate.lyrics_page_url.clone(),
        extraction_meta: ExtractionMeta {
            search_query: query.to_string(),
            strategy_used: Some(strategy),
            strategy_detail: Some(detail),
            candidate_index: Some(index),
            line_count: lines.len(),
            found_results,
            failure: None,
            failure_detail: None,
            timestamp: Utc::now(),
        },
        lines,
        is_fallback: false,
    }
}
