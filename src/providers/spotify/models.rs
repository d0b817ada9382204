//! 此模块定义了用于反序列化 Spotify Web API 响应的 `struct` 数据结构。

use serde::Deserialize;

// =================================================================
// 令牌接口 (`/api/token`) 的模型
// =================================================================

/// Client Credentials 流程返回的令牌。
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// 访问令牌。
    pub access_token: String,
    /// 有效期（秒）。
    pub expires_in: u64,
}

// =================================================================
// 搜索接口 (`/v1/search`) 的模型
// =================================================================

/// 搜索 API 的顶层响应结构。
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// 曲目搜索结果。
    pub tracks: Paging,
}

/// 分页容器。
#[derive(Debug, Deserialize)]
pub struct Paging {
    /// 当前页的曲目。
    #[serde(default)]
    pub items: Vec<Track>,
}

/// 曲目对象。
#[derive(Debug, Deserialize)]
pub struct Track {
    /// 曲目 ID。
    pub id: String,
    /// 曲目名。
    pub name: String,
    /// 艺术家列表。
    #[serde(default)]
    pub artists: Vec<Artist>,
    /// 所属专辑。
    pub album: Album,
    /// 试听链接。
    pub preview_url: Option<String>,
    /// 外部链接。
    pub external_urls: ExternalUrls,
    /// 时长（毫秒）。
    pub duration_ms: u64,
}

/// 艺术家对象（简化）。
#[derive(Debug, Deserialize)]
pub struct Artist {
    /// 艺术家名称。
    pub name: String,
}

/// 专辑对象（简化）。
#[derive(Debug, Deserialize)]
pub struct Album {
    /// 专辑名。
    pub name: String,
    /// 封面图片，通常按尺寸从大到小排列。
    #[serde(default)]
    pub images: Vec<Image>,
}

/// 图片对象。
#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    /// 图片 URL。
    pub url: String,
    /// 高度（像素），可能缺失。
    pub height: Option<u32>,
    /// 宽度（像素），可能缺失。
    pub width: Option<u32>,
}

/// 外部链接集合。
#[derive(Debug, Deserialize)]
pub struct ExternalUrls {
    /// Spotify 网页链接。
    #[serde(default)]
    pub spotify: String,
}
