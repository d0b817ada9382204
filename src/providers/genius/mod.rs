//! 此模块实现了与 Genius 进行交互的 `LyricsProvider`。
//!
//! 搜索使用需要 Bearer 令牌的官方 API，歌词页面则以普通浏览器的身份直接获取。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT},
};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{LyricsStageError, Result},
    model::track::SearchCandidate,
    providers::{BROWSER_USER_AGENT, LyricsProvider},
};

pub mod models;

const API_BASE_URL: &str = "https://api.genius.com";
const WEB_BASE_URL: &str = "https://genius.com";
const API_USER_AGENT: &str = "Mozilla/5.0 (compatible; LyricsBot/1.0)";
const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// 访问令牌对应的环境变量名，也用于错误信息。
pub const ACCESS_TOKEN_VAR: &str = "GENIUS_ACCESS_TOKEN";

/// 错误响应正文最多保留的字符数。
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Genius 客户端的实现。
#[derive(Debug, Clone)]
pub struct GeniusClient {
    access_token: Option<String>,
    http_client: Client,
    api_base_url: String,
    search_timeout: Duration,
    page_timeout: Duration,
}

impl GeniusClient {
    /// 创建一个新的 `GeniusClient` 实例。
    ///
    /// # 参数
    /// * `access_token` - API 访问令牌。为 `None` 或空白时，搜索会返回 `CredentialsMissing`。
    pub fn new(access_token: Option<String>) -> Result<Self> {
        let http_client = Client::builder().build()?;
        Ok(Self {
            access_token: access_token.filter(|t| !t.trim().is_empty()),
            http_client,
            api_base_url: API_BASE_URL.to_string(),
            search_timeout: Duration::from_secs(10),
            page_timeout: Duration::from_secs(15),
        })
    }

    /// 设置搜索和页面获取各自的超时时间。
    pub fn with_timeouts(mut self, search_timeout: Duration, page_timeout: Duration) -> Self {
        self.search_timeout = search_timeout;
        self.page_timeout = page_timeout;
        self
    }

    /// 替换 API 的基础 URL，主要用于测试。
    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// 是否配置了访问令牌。
    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }
}

fn map_search_error(e: reqwest::Error) -> LyricsStageError {
    if e.is_timeout() {
        LyricsStageError::SearchTimeout
    } else {
        LyricsStageError::Reqwest(e)
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[async_trait]
impl LyricsProvider for GeniusClient {
    fn name(&self) -> &'static str {
        "genius"
    }

    #[instrument(skip(self))]
    async fn search_songs(&self, query: &str) -> Result<Vec<SearchCandidate>> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| LyricsStageError::CredentialsMissing(ACCESS_TOKEN_VAR.to_string()))?;

        let url = format!(
            "{}/search?q={}",
            self.api_base_url,
            urlencoding::encode(query)
        );
        debug!("[Genius] 搜索 URL: {url}");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .header(USER_AGENT, API_USER_AGENT)
            .timeout(self.search_timeout)
            .send()
            .await
            .map_err(map_search_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("[Genius] 搜索接口返回错误状态: {status}");
            return Err(LyricsStageError::SearchProviderError {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let data: models::SearchResponse = response.json().await.map_err(map_search_error)?;
        let candidates: Vec<SearchCandidate> = data
            .response
            .hits
            .into_iter()
            .map(SearchCandidate::from)
            .collect();

        info!("[Genius] 搜索 '{query}' 命中 {} 条结果。", candidates.len());
        if candidates.is_empty() {
            return Err(LyricsStageError::SearchEmpty);
        }
        Ok(candidates)
    }

    #[instrument(skip(self))]
    async fn fetch_lyrics_page(&self, url: &str) -> Result<String> {
        let response = self
            .http_client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, HTML_ACCEPT)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(REFERER, format!("{WEB_BASE_URL}/"))
            .timeout(self.page_timeout)
            .send()
            .await
            .map_err(|e| LyricsStageError::PageFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LyricsStageError::PageFetch(format!(
                "页面返回状态码 {status}"
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| LyricsStageError::PageFetch(e.to_string()))?;
        debug!("[Genius] 页面获取成功，共 {} 字节。", html.len());
        Ok(html)
    }

    fn search_page_url(&self, query: &str) -> String {
        format!("{WEB_BASE_URL}/search?q={}", urlencoding::encode(query))
    }
}
