#![warn(missing_docs)]

//! # Lyrics Stage RS
//!
//! 一个 Rust 库，用于从歌词站点搜索歌曲、抓取并清洗歌词，再把歌词切分为适合逐段显示的短片段。
//!
//! ## 主要功能
//!
//! - **歌词解析**: 在 Genius 上搜索候选，依次抓取歌词页面，按优先级尝试多种提取策略，
//!   第一个得到歌词的候选胜出；全部失败时返回带诊断信息的回退结果。结果按查询缓存。
//! - **歌词分段**: 日语行使用形态素分析寻找自然断点（分析器不可用时退回启发式规则），
//!   其余文字按标点和词数切分。
//! - **曲目搜索**: 通过 Spotify 目录搜索曲目和封面。
//! - **HTTP 服务**: `server` 模块提供 `/lyrics`、`/catalog/search` 和 `/health` 路由。
//!
//! ## 获取并分段歌词
//!
//! ```rust,no_run
//! use lyrics_stage_rs::{LyricsStage, config::StageConfig};
//!
//! async {
//!     let config = StageConfig::load().unwrap();
//!     let stage = LyricsStage::from_config(&config).unwrap();
//!
//!     let result = stage.resolve("Lemon 米津玄師").await.unwrap();
//!     if result.is_fallback {
//!         println!("未能获取歌词: {:?}", result.extraction_meta.failure);
//!     }
//!     for segment in stage.segment(&result.lines).await {
//!         println!("[{}] {}", segment.line_index(), segment);
//!     }
//! };
//! ```

use std::sync::Arc;

use tracing::info;

pub mod config;
pub mod error;
pub mod extractor;
pub mod model;
pub mod processors;
pub mod providers;
pub mod resolver;
pub mod search;
pub mod server;
pub mod utils;

use crate::{
    config::StageConfig,
    error::{LyricsStageError, Result},
    model::{
        lyrics::{LyricsResult, Segment},
        track::CatalogTrack,
    },
    processors::segmenter::{AnalyzerState, MorphologyHandle, Segmenter},
    providers::{CatalogProvider, LyricsProvider, genius::GeniusClient, spotify::SpotifyClient},
    resolver::{LyricsResolver, ResolverOptions},
};

// ==========================================================
//  顶层 API
// ==========================================================

/// 顶层入口，组合了歌词解析器、分段器和音乐目录。
pub struct LyricsStage {
    resolver: LyricsResolver,
    segmenter: Segmenter,
    catalog: Arc<dyn CatalogProvider>,
}

impl LyricsStage {
    /// 使用给定的组件创建实例。
    ///
    /// # 参数
    /// * `lyrics_provider` - 歌词站点提供商。
    /// * `catalog` - 音乐目录提供商。
    /// * `segmenter` - 分段器。
    /// * `options` - 解析器参数。
    pub fn new(
        lyrics_provider: Arc<dyn LyricsProvider>,
        catalog: Arc<dyn CatalogProvider>,
        segmenter: Segmenter,
        options: ResolverOptions,
    ) -> Self {
        Self {
            resolver: LyricsResolver::new(lyrics_provider, options),
            segmenter,
            catalog,
        }
    }

    /// 根据配置创建 Genius、Spotify 客户端和分段器。不会发起网络请求，也不会加载词典。
    pub fn from_config(config: &StageConfig) -> Result<Self> {
        let genius = GeniusClient::new(config.genius_access_token.clone())?
            .with_timeouts(config.search_timeout(), config.page_timeout());
        let spotify = SpotifyClient::new(
            config.spotify_client_id.clone(),
            config.spotify_client_secret.clone(),
        )?
        .with_timeout(config.search_timeout());

        let segmenter = match &config.dictionary_path {
            Some(path) => {
                info!("[Segmenter] 词典路径: {}，将在首次使用时加载。", path.display());
                Segmenter::new(Arc::new(MorphologyHandle::from_dictionary(
                    path.clone(),
                    config.tokenizer_init_timeout(),
                )))
            }
            None => {
                info!("[Segmenter] 未配置词典，只使用启发式分段。");
                Segmenter::heuristic_only()
            }
        };

        Ok(Self::new(
            Arc::new(genius),
            Arc::new(spotify),
            segmenter,
            config.resolver_options(),
        ))
    }

    /// 解析一个查询的歌词。
    ///
    /// 只有空白查询会返回错误 (`InvalidInput`)；其他任何失败都以回退结果的形式返回。
    pub async fn resolve(&self, query: &str) -> Result<LyricsResult> {
        if query.trim().is_empty() {
            return Err(LyricsStageError::InvalidInput(
                "查询字符串不能为空".to_string(),
            ));
        }
        Ok(self.resolver.resolve(query).await)
    }

    /// 把歌词行切分为显示片段。
    pub async fn segment<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Segment> {
        self.segmenter.segment(lines).await
    }

    /// 在音乐目录中搜索曲目。
    pub async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>> {
        if query.trim().is_empty() {
            return Err(LyricsStageError::InvalidInput(
                "查询字符串不能为空".to_string(),
            ));
        }
        self.catalog.search_tracks(query).await
    }

    /// 形态素分析器的当前状态。
    pub fn analyzer_state(&self) -> AnalyzerState {
        self.segmenter.analyzer_state()
    }

    /// 解析器，主要供测试和诊断使用。
    pub fn resolver(&self) -> &LyricsResolver {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_tracing() {
        use tracing_subscriber::{EnvFilter, FmtSubscriber};
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,lyrics_stage_rs=debug"));
        let _ = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        init_tracing();
        let stage = LyricsStage::from_config(&StageConfig::default()).unwrap();

        assert!(matches!(
            stage.resolve("  ").await,
            Err(LyricsStageError::InvalidInput(_))
        ));
        assert!(matches!(
            stage.search_tracks("").await,
            Err(LyricsStageError::InvalidInput(_))
        ));
        assert_eq!(stage.analyzer_state(), AnalyzerState::Disabled);
    }

    #[tokio::test]
    async fn test_missing_token_yields_credentials_fallback() {
        init_tracing();
        let stage = LyricsStage::from_config(&StageConfig::default()).unwrap();

        let result = stage.resolve("Lemon 米津玄師").await.unwrap();
        assert!(result.is_fallback);
        assert_eq!(
            result.extraction_meta.failure,
            Some(model::lyrics::FailureKind::CredentialsMissing)
        );
        assert_eq!(result.title, "Lemon");
        assert!(result.source_url.starts_with("https://genius.com/search?q="));
    }

    /// 端到端测试：需要 `GENIUS_ACCESS_TOKEN` 和网络。
    #[tokio::test]
    #[ignore]
    async fn test_live_resolve_and_segment() {
        init_tracing();
        let config = StageConfig::load().unwrap();
        let stage = LyricsStage::from_config(&config).unwrap();

        let result = stage.resolve("Lemon 米津玄師").await.unwrap();
        println!("{:#?}", result.extraction_meta);
        assert!(!result.is_fallback);

        let segments = stage.segment(&result.lines).await;
        assert!(!segments.is_empty());
        for segment in segments.iter().take(20) {
            println!("[{}] {}", segment.line_index(), segment);
        }
    }
}
