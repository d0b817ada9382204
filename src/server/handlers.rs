//! 路由处理函数和对外的 JSON 结构。

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use super::AppState;
use crate::{
    error::LyricsStageError,
    model::{
        lyrics::{ExtractionMeta, LyricsResult, Segment},
        track::CatalogTrack,
    },
    processors::segmenter::AnalyzerState,
};

// =================================================================
// 请求参数
// =================================================================

/// `/lyrics` 的查询参数。
#[derive(Debug, Deserialize)]
pub struct LyricsQuery {
    /// 自由文本查询。
    pub q: Option<String>,
    /// 是否在响应中附带分段结果。
    #[serde(default)]
    pub segment: bool,
}

/// `/catalog/search` 的查询参数。
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// 自由文本查询。
    pub q: Option<String>,
}

// =================================================================
// 响应结构
// =================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LyricsDebug {
    #[serde(flatten)]
    meta: ExtractionMeta,
    fallback: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct LyricsResponse {
    id: u64,
    title: String,
    artist: String,
    lyrics: Vec<String>,
    url: String,
    debug: LyricsDebug,
    #[serde(skip_serializing_if = "Option::is_none")]
    segments: Option<Vec<Segment>>,
}

impl From<LyricsResult> for LyricsResponse {
    fn from(result: LyricsResult) -> Self {
        Self {
            id: result.id,
            title: result.title,
            artist: result.artist,
            lyrics: result.lines,
            url: result.source_url,
            debug: LyricsDebug {
                meta: result.extraction_meta,
                fallback: result.is_fallback,
            },
            segments: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct TracksResponse {
    tracks: Vec<CatalogTrack>,
}

/// `/health` 的响应。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// 固定为 `"ok"`。
    pub status: &'static str,
    /// 当前 crate 版本。
    pub version: &'static str,
    /// 形态素分析器的状态。
    pub analyzer: AnalyzerState,
    /// 是否配置了歌词站点的访问令牌。
    pub genius_token_configured: bool,
}

// =================================================================
// 错误
// =================================================================

/// 处理函数返回的错误，每个变体对应一种错误响应。
#[derive(Debug)]
pub enum ApiError {
    /// 缺少或为空的 `q` 参数。
    MissingQuery,
    /// 歌词解析过程本身崩溃，无法生成回退结果。
    LyricsFailed {
        /// 错误描述。
        details: String,
        /// 原始查询。
        query: String,
        /// 出错的时间。
        timestamp: DateTime<Utc>,
    },
    /// 目录服务缺少凭据。
    CatalogCredentialsMissing(Vec<String>),
    /// 目录搜索的其他失败。
    CatalogFailed,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingQuery => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Query parameter is required" }),
            ),
            ApiError::LyricsFailed {
                details,
                query,
                timestamp,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Failed to fetch lyrics",
                    "details": details,
                    "debug": {
                        "searchQuery": query,
                        "timestamp": timestamp,
                    },
                }),
            ),
            ApiError::CatalogCredentialsMissing(missing) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Spotify API credentials not configured",
                    "debug": { "missing": missing },
                }),
            ),
            ApiError::CatalogFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to search tracks" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

fn required_query(q: Option<String>) -> Result<String, ApiError> {
    q.filter(|q| !q.trim().is_empty())
        .ok_or(ApiError::MissingQuery)
}

// =================================================================
// 处理函数
// =================================================================

/// GET /lyrics?q=<query>[&segment=true]
pub(super) async fn get_lyrics(
    State(state): State<AppState>,
    Query(params): Query<LyricsQuery>,
) -> Result<Json<LyricsResponse>, ApiError> {
    let with_segments = params.segment;
    let query = required_query(params.q)?;
    info!("[Server] 歌词请求: '{query}'");

    // 在独立任务中解析，任务崩溃时仍能给出错误响应
    let stage = state.stage.clone();
    let task_query = query.clone();
    let resolved = tokio::spawn(async move {
        let result = stage.resolve(&task_query).await?;
        let segments = if with_segments {
            Some(stage.segment(&result.lines).await)
        } else {
            None
        };
        Ok::<_, LyricsStageError>((result, segments))
    })
    .await;

    match resolved {
        Ok(Ok((result, segments))) => {
            let mut response = LyricsResponse::from(result);
            response.segments = segments;
            Ok(Json(response))
        }
        Ok(Err(LyricsStageError::InvalidInput(_))) => Err(ApiError::MissingQuery),
        Ok(Err(e)) => {
            error!("[Server] 歌词解析失败: {e}");
            Err(ApiError::LyricsFailed {
                details: e.to_string(),
                query,
                timestamp: Utc::now(),
            })
        }
        Err(e) => {
            error!("[Server] 歌词解析任务异常终止: {e}");
            Err(ApiError::LyricsFailed {
                details: e.to_string(),
                query,
                timestamp: Utc::now(),
            })
        }
    }
}

/// GET /catalog/search?q=<query>
pub(super) async fn search_catalog(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<TracksResponse>, ApiError> {
    let query = required_query(params.q)?;

    match state.stage.search_tracks(&query).await {
        Ok(tracks) => {
            info!("[Server] 目录搜索 '{query}' 返回 {} 首曲目。", tracks.len());
            Ok(Json(TracksResponse { tracks }))
        }
        Err(LyricsStageError::InvalidInput(_)) => Err(ApiError::MissingQuery),
        Err(LyricsStageError::CredentialsMissing(names)) => {
            warn!("[Server] 目录服务缺少凭据: {names}");
            Err(ApiError::CatalogCredentialsMissing(
                names.split(", ").map(str::to_string).collect(),
            ))
        }
        Err(e) => {
            error!("[Server] 目录搜索失败: {e}");
            Err(ApiError::CatalogFailed)
        }
    }
}

/// GET /health
pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        analyzer: state.stage.analyzer_state(),
        genius_token_configured: state.genius_token_configured,
    })
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        LyricsStage,
        error::Result,
        model::track::SearchCandidate,
        processors::segmenter::Segmenter,
        providers::{CatalogProvider, LyricsProvider},
        resolver::ResolverOptions,
        server::build_router,
    };

    struct MockLyrics {
        pages: HashMap<&'static str, &'static str>,
        searches: AtomicUsize,
    }

    #[async_trait]
    impl LyricsProvider for MockLyrics {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn search_songs(&self, query: &str) -> Result<Vec<SearchCandidate>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if query.contains("nothing") {
                return Err(LyricsStageError::SearchEmpty);
            }
            Ok(vec![SearchCandidate {
                external_id: 42,
                title: "Lemon".into(),
                artist: "米津玄師".into(),
                lyrics_page_url: "https://example.com/lemon".into(),
            }])
        }

        async fn fetch_lyrics_page(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .map(|html| html.to_string())
                .ok_or_else(|| LyricsStageError::PageFetch("404".into()))
        }

        fn search_page_url(&self, query: &str) -> String {
            format!("https://example.com/search?q={}", urlencoding::encode(query))
        }
    }

    struct MockCatalog {
        missing: Option<&'static str>,
    }

    #[async_trait]
    impl CatalogProvider for MockCatalog {
        fn name(&self) -> &'static str {
            "mock-catalog"
        }

        async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>> {
            if let Some(missing) = self.missing {
                return Err(LyricsStageError::CredentialsMissing(missing.to_string()));
            }
            Ok(vec![CatalogTrack {
                id: "t1".into(),
                name: query.to_string(),
                artist: "米津玄師".into(),
                album: "STRAY SHEEP".into(),
                preview_url: None,
                external_urls: "https://open.spotify.com/track/t1".into(),
                image: Some("https://i.scdn.co/image/300".into()),
                duration_ms: 255_000,
            }])
        }
    }

    fn app(missing: Option<&'static str>) -> Router {
        let lyrics = MockLyrics {
            pages: HashMap::from([(
                "https://example.com/lemon",
                r#"<html><body><div data-lyrics-container="true">夢ならばどれほどよかったでしょう<br>未だにあなたのことを夢にみる</div></body></html>"#,
            )]),
            searches: AtomicUsize::new(0),
        };
        let stage = LyricsStage::new(
            Arc::new(lyrics),
            Arc::new(MockCatalog { missing }),
            Segmenter::heuristic_only(),
            ResolverOptions::default(),
        );
        build_router(AppState::new(Arc::new(stage), true))
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_lyrics_requires_query() {
        let app = app(None);
        for uri in ["/lyrics", "/lyrics?q=", "/lyrics?q=%20%20"] {
            let (status, body) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Query parameter is required");
        }
    }

    #[tokio::test]
    async fn test_lyrics_success_shape() {
        let app = app(None);
        let (status, body) = get_json(&app, "/lyrics?q=Lemon").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 42);
        assert_eq!(body["title"], "Lemon");
        assert_eq!(body["artist"], "米津玄師");
        assert_eq!(body["url"], "https://example.com/lemon");
        assert_eq!(body["lyrics"].as_array().unwrap().len(), 2);
        assert_eq!(body["debug"]["fallback"], false);
        assert_eq!(body["debug"]["strategyUsed"], "structural");
        assert_eq!(body["debug"]["searchQuery"], "Lemon");
        assert!(body.get("segments").is_none());
    }

    #[tokio::test]
    async fn test_lyrics_with_segments() {
        let app = app(None);
        let (status, body) = get_json(&app, "/lyrics?q=Lemon&segment=true").await;

        assert_eq!(status, StatusCode::OK);
        let segments = body["segments"].as_array().unwrap();
        assert!(!segments.is_empty());
        assert_eq!(segments[0]["lineIndex"], 0);
        assert!(
            segments
                .iter()
                .all(|s| !s["text"].as_str().unwrap().trim().is_empty())
        );
    }

    #[tokio::test]
    async fn test_lyrics_fallback_is_still_ok() {
        let app = app(None);
        let (status, body) = get_json(&app, "/lyrics?q=nothing%20here").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["debug"]["fallback"], true);
        assert_eq!(body["debug"]["failure"], "SearchEmpty");
        assert_eq!(body["url"], "https://example.com/search?q=nothing%20here");
    }

    #[tokio::test]
    async fn test_catalog_search() {
        let app = app(None);
        let (status, body) = get_json(&app, "/catalog/search?q=Lemon").await;

        assert_eq!(status, StatusCode::OK);
        let track = &body["tracks"][0];
        assert_eq!(track["name"], "Lemon");
        assert_eq!(track["preview_url"], Value::Null);
        assert_eq!(track["duration_ms"], 255_000);
    }

    #[tokio::test]
    async fn test_catalog_missing_credentials() {
        let app = app(Some("SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET"));
        let (status, body) = get_json(&app, "/catalog/search?q=Lemon").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Spotify API credentials not configured");
        assert_eq!(
            body["debug"]["missing"],
            serde_json::json!(["SPOTIFY_CLIENT_ID", "SPOTIFY_CLIENT_SECRET"])
        );

        let (status, _) = get_json(&app, "/catalog/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(None);
        let (status, body) = get_json(&app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["analyzer"]["state"], "disabled");
        assert_eq!(body["geniusTokenConfigured"], true);
    }

    #[test]
    fn test_lyrics_failed_response() {
        let response = ApiError::LyricsFailed {
            details: "task panicked".into(),
            query: "Lemon".into(),
            timestamp: Utc::now(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
