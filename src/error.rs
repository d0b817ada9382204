//! 定义了整个 `lyrics-stage` 库的错误类型 `LyricsStageError`。

use std::io;
use thiserror::Error;

use crate::model::lyrics::FailureKind;

/// `lyrics-stage` 库的通用错误枚举。
#[derive(Error, Debug)]
pub enum LyricsStageError {
    /// 网络请求失败 (源自 `reqwest::Error`)
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// JSON 解析失败 (源自 `serde_json::Error`)
    #[error("JSON 解析失败: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O 错误 (源自 `io::Error`)
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),

    /// 调用方传入了无效的参数，例如空查询
    #[error("无效的输入: {0}")]
    InvalidInput(String),

    /// 缺少访问外部服务所需的凭据
    #[error("缺少凭据: {0}")]
    CredentialsMissing(String),

    /// 搜索请求超时
    #[error("搜索请求超时")]
    SearchTimeout,

    /// 搜索接口返回了非 2xx 状态码
    #[error("搜索接口返回错误: {status} - {body}")]
    SearchProviderError {
        /// HTTP 状态码
        status: u16,
        /// 响应正文（可能被截断）
        body: String,
    },

    /// 搜索没有任何命中
    #[error("搜索结果为空")]
    SearchEmpty,

    /// 获取歌词页面失败
    #[error("获取歌词页面失败: {0}")]
    PageFetch(String),

    /// 所有候选都没有提取出歌词
    #[error("在所有候选中均未找到歌词")]
    NoLyricsFound,

    /// 形态素分析器初始化失败
    #[error("形态素分析器初始化失败: {0}")]
    TokenizerInit(String),
}

/// `LyricsStageError` 的 `Result` 类型别名，方便在函数签名中使用。
pub type Result<T> = std::result::Result<T, LyricsStageError>;

impl LyricsStageError {
    /// 将错误归入歌词解析流程对外记录的失败分类。
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::CredentialsMissing(_) => FailureKind::CredentialsMissing,
            Self::SearchTimeout => FailureKind::SearchTimeout,
            Self::SearchEmpty => FailureKind::SearchEmpty,
            Self::PageFetch(_) => FailureKind::PageFetchError,
            Self::NoLyricsFound => FailureKind::NoLyricsFound,
            Self::Reqwest(e) if e.is_timeout() => FailureKind::SearchTimeout,
            _ => FailureKind::SearchProviderError,
        }
    }
}
