//! HTTP 服务
//!
//! 提供三个路由：
//! - `GET /lyrics?q=<query>[&segment=true]`：解析歌词，可选地附带分段结果。
//! - `GET /catalog/search?q=<query>`：在音乐目录中搜索曲目。
//! - `GET /health`：报告服务版本和形态素分析器状态。

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::LyricsStage;

mod handlers;
pub use handlers::{ApiError, HealthResponse, LyricsQuery, SearchQuery};

/// 所有处理函数共享的状态。
#[derive(Clone)]
pub struct AppState {
    /// 顶层入口。
    pub stage: Arc<LyricsStage>,
    /// 是否配置了歌词站点的访问令牌，仅用于健康检查。
    pub genius_token_configured: bool,
}

impl AppState {
    /// 创建服务状态。
    pub fn new(stage: Arc<LyricsStage>, genius_token_configured: bool) -> Self {
        Self {
            stage,
            genius_token_configured,
        }
    }
}

/// 构建应用路由。
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/lyrics", get(handlers::get_lyrics))
        .route("/catalog/search", get(handlers::search_catalog))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
