//! 此模块实现了与 Spotify 进行交互的 `CatalogProvider`。
//!
//! 使用 Client Credentials 流程获取应用级访问令牌，令牌在进程内缓存，
//! 在其报告的过期时间前 60 秒之内都会被复用。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, info, instrument};

use crate::{
    error::{LyricsStageError, Result},
    model::track::CatalogTrack,
    providers::CatalogProvider,
};

pub mod models;

const ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";
const API_BASE_URL: &str = "https://api.spotify.com/v1";

/// 客户端 ID 对应的环境变量名。
pub const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
/// 客户端密钥对应的环境变量名。
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";

/// 令牌在报告的过期时间之前多少秒就视为过期。
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

/// 封面图片的目标高度范围（像素）。
const PREFERRED_IMAGE_HEIGHT: std::ops::RangeInclusive<u32> = 200..=400;

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Spotify 客户端的实现。
#[derive(Debug)]
pub struct SpotifyClient {
    client_id: Option<String>,
    client_secret: Option<String>,
    http_client: Client,
    accounts_base_url: String,
    api_base_url: String,
    request_timeout: Duration,
    token: RwLock<Option<CachedToken>>,
}

impl SpotifyClient {
    /// 创建一个新的 `SpotifyClient` 实例。此时不会发起任何请求。
    pub fn new(client_id: Option<String>, client_secret: Option<String>) -> Result<Self> {
        Ok(Self {
            client_id: client_id.filter(|s| !s.trim().is_empty()),
            client_secret: client_secret.filter(|s| !s.trim().is_empty()),
            http_client: Client::builder().build()?,
            accounts_base_url: ACCOUNTS_BASE_URL.to_string(),
            api_base_url: API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            token: RwLock::new(None),
        })
    }

    /// 替换账户服务和 API 的基础 URL，主要用于测试。
    pub fn with_base_urls(
        mut self,
        accounts_base_url: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        self.accounts_base_url = accounts_base_url.into().trim_end_matches('/').to_string();
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// 设置单个请求的超时时间。
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// 返回缺失的凭据对应的环境变量名。
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.client_id.is_none() {
            missing.push(CLIENT_ID_VAR);
        }
        if self.client_secret.is_none() {
            missing.push(CLIENT_SECRET_VAR);
        }
        missing
    }

    /// 获取访问令牌，缓存有效时直接复用。
    #[instrument(skip(self))]
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref()
            && Instant::now() < token.expires_at
        {
            return Ok(token.value.clone());
        }

        let mut guard = self.token.write().await;
        // 等待写锁期间可能已有其他请求刷新了令牌
        if let Some(token) = guard.as_ref()
            && Instant::now() < token.expires_at
        {
            return Ok(token.value.clone());
        }

        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err(LyricsStageError::CredentialsMissing(
                self.missing_credentials().join(", "),
            ));
        };

        debug!("[Spotify] 正在请求新的访问令牌...");
        let response: models::TokenResponse = self
            .http_client
            .post(format!("{}/api/token", self.accounts_base_url))
            .basic_auth(client_id, Some(client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .timeout(self.request_timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let lifetime = response.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);
        info!("[Spotify] 获取访问令牌成功，{lifetime} 秒内有效。");
        *guard = Some(CachedToken {
            value: response.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
        Ok(response.access_token)
    }
}

/// 选择尺寸最合适的图片：优先高度在目标范围内的，否则取第一张。
pub fn best_fit_image(images: &[models::Image]) -> Option<String> {
    images
        .iter()
        .find(|image| {
            image
                .height
                .is_some_and(|h| PREFERRED_IMAGE_HEIGHT.contains(&h))
        })
        .or_else(|| images.first())
        .map(|image| image.url.clone())
}

impl From<models::Track> for CatalogTrack {
    fn from(track: models::Track) -> Self {
        Self {
            image: best_fit_image(&track.album.images),
            id: track.id,
            name: track.name,
            artist: track
                .artists
                .into_iter()
                .next()
                .map(|a| a.name)
                .unwrap_or_default(),
            album: track.album.name,
            preview_url: track.preview_url,
            external_urls: track.external_urls.spotify,
            duration_ms: track.duration_ms,
        }
    }
}

#[async_trait]
impl CatalogProvider for SpotifyClient {
    fn name(&self) -> &'static str {
        "spotify"
    }

    #[instrument(skip(self))]
    async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>> {
        let missing = self.missing_credentials();
        if !missing.is_empty() {
            return Err(LyricsStageError::CredentialsMissing(missing.join(", ")));
        }

        let token = self.access_token().await?;
        let url = format!(
            "{}/search?q={}&type=track&limit=10",
            self.api_base_url,
            urlencoding::encode(query)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LyricsStageError::SearchProviderError {
                status: status.as_u16(),
                body,
            });
        }

        let data: models::SearchResponse = response.json().await?;
        let tracks: Vec<CatalogTrack> = data.tracks.items.into_iter().map(Into::into).collect();
        info!("[Spotify] 搜索 '{query}' 返回 {} 首曲目。", tracks.len());
        Ok(tracks)
    }
}
