//! 形态素分析器的抽象与共享句柄。
//!
//! 分析器依赖一个较大的词典文件，首次使用时才异步加载。
//! `MorphologyHandle` 保证并发的首次调用只触发一次加载，
//! 加载失败或超时后，下一次调用会重新尝试。

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::{LyricsStageError, Result};

/// 形态素的粗粒度词性，只区分分段规则关心的几类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    /// 助詞
    Particle,
    /// 動詞
    Verb,
    /// 形容詞
    Adjective,
    /// 接続詞
    Conjunction,
    /// 記号 / 補助記号
    Symbol,
    /// 其他
    Other,
}

impl PartOfSpeech {
    /// 从 IPADIC / UniDic 风格的 CSV 特征串中读取第一列词性。
    pub fn from_feature(feature: &str) -> Self {
        match feature.split(',').next().unwrap_or_default() {
            "助詞" => Self::Particle,
            "動詞" => Self::Verb,
            "形容詞" => Self::Adjective,
            "接続詞" => Self::Conjunction,
            "記号" | "補助記号" => Self::Symbol,
            _ => Self::Other,
        }
    }
}

/// 一个形态素：表层形和词性。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    /// 表层形，即原文中的文字。
    pub surface: String,
    /// 词性。
    pub pos: PartOfSpeech,
}

impl Morpheme {
    /// 便捷构造函数。
    pub fn new(surface: &str, pos: PartOfSpeech) -> Self {
        Self {
            surface: surface.to_string(),
            pos,
        }
    }
}

/// 形态素分析器需要实现的接口。
pub trait MorphAnalyzer: Send + Sync {
    /// 将一段文本切分为形态素序列，表层形按顺序拼接应还原原文。
    fn tokenize(&self, text: &str) -> Vec<Morpheme>;
}

/// 负责构建分析器的加载器。
#[async_trait]
pub trait AnalyzerLoader: Send + Sync {
    /// 构建一个分析器实例。可能很慢，也可能失败。
    async fn load(&self) -> Result<Arc<dyn MorphAnalyzer>>;
}

/// 基于 vibrato 的分析器实现。
pub struct VibratoAnalyzer {
    tokenizer: vibrato::Tokenizer,
}

impl VibratoAnalyzer {
    /// 从词典文件构建分析器。
    ///
    /// 以 `.zst` 结尾的文件按 zstd 压缩格式读取。
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            LyricsStageError::TokenizerInit(format!("无法打开词典 {}: {e}", path.display()))
        })?;

        let dictionary = if path.extension().is_some_and(|ext| ext == "zst") {
            let decoder = zstd::Decoder::new(file)
                .map_err(|e| LyricsStageError::TokenizerInit(format!("无法解压词典: {e}")))?;
            vibrato::Dictionary::read(decoder)
        } else {
            vibrato::Dictionary::read(BufReader::new(file))
        }
        .map_err(|e| LyricsStageError::TokenizerInit(format!("词典格式错误: {e}")))?;

        Ok(Self {
            tokenizer: vibrato::Tokenizer::new(dictionary),
        })
    }
}

impl MorphAnalyzer for VibratoAnalyzer {
    fn tokenize(&self, text: &str) -> Vec<Morpheme> {
        let mut worker = self.tokenizer.new_worker();
        worker.reset_sentence(text);
        worker.tokenize();
        worker
            .token_iter()
            .map(|token| Morpheme {
                surface: token.surface().to_string(),
                pos: PartOfSpeech::from_feature(token.feature()),
            })
            .collect()
    }
}

/// 从磁盘上的词典文件加载 `VibratoAnalyzer`。
pub struct DictionaryLoader {
    path: PathBuf,
}

impl DictionaryLoader {
    /// 创建一个新的加载器。此时不会读取文件。
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AnalyzerLoader for DictionaryLoader {
    async fn load(&self) -> Result<Arc<dyn MorphAnalyzer>> {
        let path = self.path.clone();
        info!("[Segmenter] 正在加载词典: {}", path.display());

        let analyzer = tokio::task::spawn_blocking(move || VibratoAnalyzer::from_path(&path))
            .await
            .map_err(|e| LyricsStageError::TokenizerInit(format!("词典加载任务异常退出: {e}")))??;

        info!("[Segmenter] 词典加载完成。");
        Ok(Arc::new(analyzer))
    }
}

/// 分析器当前的状态。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "camelCase")]
pub enum AnalyzerState {
    /// 尚未尝试加载。
    Uninitialized,
    /// 已加载，可以使用。
    Ready,
    /// 最近一次加载失败。
    Failed(String),
    /// 没有配置分析器，只使用启发式分段。
    Disabled,
}

/// 形态素分析器的共享句柄。
///
/// 第一个调用者触发加载，并发的调用者等待同一次加载，之后的调用者直接复用结果。
pub struct MorphologyHandle {
    loader: Box<dyn AnalyzerLoader>,
    cell: OnceCell<Arc<dyn MorphAnalyzer>>,
    init_timeout: Duration,
    last_failure: Mutex<Option<String>>,
}

impl MorphologyHandle {
    /// 使用自定义加载器创建句柄。
    pub fn new(loader: impl AnalyzerLoader + 'static, init_timeout: Duration) -> Self {
        Self {
            loader: Box::new(loader),
            cell: OnceCell::new(),
            init_timeout,
            last_failure: Mutex::new(None),
        }
    }

    /// 使用词典文件创建句柄。
    pub fn from_dictionary(path: impl Into<PathBuf>, init_timeout: Duration) -> Self {
        Self::new(DictionaryLoader::new(path), init_timeout)
    }

    /// 获取分析器，必要时触发加载。
    ///
    /// 加载失败或超过 `init_timeout` 时返回 `None`，调用方应改用启发式分段。
    pub async fn get(&self) -> Option<Arc<dyn MorphAnalyzer>> {
        let result = self
            .cell
            .get_or_try_init(|| async {
                match tokio::time::timeout(self.init_timeout, self.loader.load()).await {
                    Ok(loaded) => loaded,
                    Err(_) => Err(LyricsStageError::TokenizerInit(format!(
                        "初始化超时 ({}s)",
                        self.init_timeout.as_secs_f32()
                    ))),
                }
            })
            .await;

        match result {
            Ok(analyzer) => {
                self.set_failure(None);
                Some(Arc::clone(analyzer))
            }
            Err(e) => {
                warn!("[Segmenter] 形态素分析器不可用，将使用启发式分段: {e}");
                self.set_failure(Some(e.to_string()));
                None
            }
        }
    }

    /// 报告分析器的当前状态，不会触发加载。
    pub fn state(&self) -> AnalyzerState {
        if self.cell.initialized() {
            return AnalyzerState::Ready;
        }
        match self.last_failure.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(reason) => AnalyzerState::Failed(reason.clone()),
                None => AnalyzerState::Uninitialized,
            },
            Err(_) => AnalyzerState::Failed("状态锁已损坏".to_string()),
        }
    }

    fn set_failure(&self, failure: Option<String>) {
        if let Ok(mut guard) = self.last_failure.lock() {
            *guard = failure;
        }
    }
}
