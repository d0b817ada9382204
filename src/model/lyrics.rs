//! 定义了歌词解析结果和显示分段的数据结构。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// 提取歌词时实际生效的策略。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ExtractionStrategy {
    /// 通过已知的歌词容器元素提取。
    Structural,
    /// 从页面内嵌的 JSON 数据中提取。
    EmbeddedData,
}

/// 歌词解析流程中记录的失败分类。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
pub enum FailureKind {
    /// 搜索请求超时。
    SearchTimeout,
    /// 搜索接口返回错误。
    SearchProviderError,
    /// 搜索没有命中。
    SearchEmpty,
    /// 某个候选的页面获取失败。
    PageFetchError,
    /// 所有尝试过的候选都没有提取出歌词。
    NoLyricsFound,
    /// 没有配置访问令牌。
    CredentialsMissing,
    /// 查询为空或无效。
    InvalidInput,
}

/// 一次解析的元数据，用于排查上游页面结构变化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMeta {
    /// 原始查询字符串。
    pub search_query: String,
    /// 生效的提取策略。回退结果为 `None`。
    pub strategy_used: Option<ExtractionStrategy>,
    /// 命中的选择器或内嵌数据模式。
    pub strategy_detail: Option<String>,
    /// 成功候选在过滤后列表中的位置。
    pub candidate_index: Option<usize>,
    /// 最终的歌词行数。
    pub line_count: usize,
    /// 搜索返回的命中数量（过滤前）。
    pub found_results: usize,
    /// 失败分类，仅回退结果会设置。
    pub failure: Option<FailureKind>,
    /// 失败的详细描述。
    pub failure_detail: Option<String>,
    /// 结果生成的时间。
    pub timestamp: DateTime<Utc>,
}

/// 一次歌词解析的最终结果，也是缓存的单位。
///
/// 当 `is_fallback` 为 `false` 时，`lines` 一定非空。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsResult {
    /// 歌曲 ID；回退结果使用生成时的毫秒时间戳。
    pub id: u64,
    /// 歌曲标题。
    pub title: String,
    /// 艺术家。
    pub artist: String,
    /// 清洗后的歌词行。
    pub lines: Vec<String>,
    /// 歌词来源页面。
    pub source_url: String,
    /// 提取过程的元数据。
    pub extraction_meta: ExtractionMeta,
    /// 是否为合成的回退结果。
    pub is_fallback: bool,
}

/// 一个用于逐段显示的歌词片段。
///
/// 文本去除首尾空白后一定非空。创建后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    text: String,
    line_index: usize,
}

impl Segment {
    /// 创建一个片段。文本去除首尾空白后为空时返回 `None`。
    pub fn new(text: &str, line_index: usize) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self {
                text: trimmed.to_string(),
                line_index,
            })
        }
    }

    /// 片段文本。
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// 该片段来自输入中的第几行。
    pub fn line_index(&self) -> usize {
        self.line_index
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
