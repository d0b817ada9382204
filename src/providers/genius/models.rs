//! 此模块定义了用于反序列化 Genius 搜索 API 响应的 `struct` 数据结构。

use serde::Deserialize;

use crate::model::track::SearchCandidate;

// =================================================================
// 搜索接口 (`/search`) 的模型
// =================================================================

/// 搜索 API 的顶层响应结构。
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// 包含命中列表的容器。
    pub response: SearchResponseData,
}

/// 搜索结果的数据部分。
#[derive(Debug, Deserialize)]
pub struct SearchResponseData {
    /// 命中列表，按相关度排序。
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// 单条命中。
#[derive(Debug, Deserialize)]
pub struct Hit {
    /// 命中的歌曲。
    pub result: SongResult,
}

/// 命中中的歌曲信息。
#[derive(Debug, Deserialize)]
pub struct SongResult {
    /// 歌曲 ID。
    pub id: u64,
    /// 歌曲标题。
    pub title: String,
    /// 主要艺术家。
    pub primary_artist: Artist,
    /// 歌词页面 URL。
    pub url: String,
}

/// 艺术家信息。
#[derive(Debug, Deserialize)]
pub struct Artist {
    /// 艺术家名称。
    pub name: String,
}

impl From<Hit> for SearchCandidate {
    fn from(hit: Hit) -> Self {
        let song = hit.result;
        Self {
            external_id: song.id,
            title: song.title,
            artist: song.primary_artist.name,
            lyrics_page_url: song.url,
        }
    }
}
