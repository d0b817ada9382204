//! 定义了与歌曲搜索功能相关的核心数据结构。

use serde::{Deserialize, Serialize};

/// 代表一条歌词站点的搜索命中。
///
/// 由搜索客户端从提供商的原始 JSON 转换而来，创建后不再修改。
/// 列表中的顺序即提供商给出的相关度顺序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchCandidate {
    /// 在提供商平台上的歌曲 ID。
    pub external_id: u64,
    /// 歌曲标题。
    pub title: String,
    /// 主要艺术家名称。
    pub artist: String,
    /// 该歌曲歌词页面的完整 URL。
    pub lyrics_page_url: String,
}

/// 代表音乐目录 (Spotify) 中的一首曲目，直接用作 `/catalog/search` 的响应条目。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CatalogTrack {
    /// 曲目 ID。
    pub id: String,
    /// 曲目名。
    pub name: String,
    /// 第一位艺术家的名称。
    pub artist: String,
    /// 专辑名。
    pub album: String,
    /// 30 秒试听链接，可能不存在。
    pub preview_url: Option<String>,
    /// 曲目在 Spotify 上的外部链接。
    pub external_urls: String,
    /// 尺寸最合适的专辑封面 URL。
    pub image: Option<String>,
    /// 曲目时长（毫秒）。
    pub duration_ms: u64,
}
