//! 提供商模块
//!
//! 该模块定义了与外部服务进行交互的核心抽象：歌词站点（搜索 + 页面获取）和音乐目录（曲目搜索）。

use async_trait::async_trait;

use crate::{
    error::Result,
    model::track::{CatalogTrack, SearchCandidate},
};

pub mod genius;
pub mod spotify;

/// 浏览器风格的 User-Agent，用于获取网页。
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 定义了歌词站点提供商需要实现的接口。
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    ///
    /// 返回提供商的唯一名称。
    ///
    /// 一个全小写的静态字符串，例如 `"genius"`。
    ///
    fn name(&self) -> &'static str;

    ///
    /// 根据自由文本查询搜索歌曲。
    ///
    /// # 参数
    /// * `query` - 非空的查询字符串，可能同时包含标题和艺术家。
    ///
    /// # 返回
    /// 按提供商相关度排序的候选列表。没有命中时返回 `SearchEmpty` 错误，
    /// 超时返回 `SearchTimeout`，非 2xx 响应返回 `SearchProviderError`。
    ///
    async fn search_songs(&self, query: &str) -> Result<Vec<SearchCandidate>>;

    ///
    /// 获取一个候选的歌词页面的原始 HTML。
    ///
    /// # 参数
    /// * `url` - 候选的歌词页面 URL。
    ///
    /// # 返回
    /// 页面 HTML 文本。任何失败都以 `PageFetch` 错误返回。
    ///
    async fn fetch_lyrics_page(&self, url: &str) -> Result<String>;

    ///
    /// 返回该提供商针对某个查询的搜索页面 URL，用于回退结果。
    ///
    fn search_page_url(&self, query: &str) -> String;
}

/// 定义了音乐目录提供商需要实现的接口。
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    ///
    /// 返回提供商的唯一名称。
    ///
    fn name(&self) -> &'static str;

    ///
    /// 按查询搜索曲目。
    ///
    /// # 参数
    /// * `query` - 非空的查询字符串。
    ///
    /// # 返回
    /// 曲目列表。缺少凭据时返回 `CredentialsMissing`。
    ///
    async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>>;
}
