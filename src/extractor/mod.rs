//! 歌词页面的行提取器。
//!
//! 上游页面的结构不受控制，并且经常在没有通知的情况下改版。
//! 因此这里按固定的优先级依次尝试多个提取策略，第一个产出足够行数的策略胜出。
//! 选择器和内嵌数据模式都集中维护在各策略模块的常量表中。

use tracing::{debug, info};

use crate::model::lyrics::ExtractionStrategy;

pub mod embedded;
pub mod structural;

pub use embedded::EmbeddedDataStrategy;
pub use structural::StructuralStrategy;

/// 提取器的可调参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorOptions {
    /// 一个策略至少要产出多少行才算成功。
    pub min_lines: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self { min_lines: 1 }
    }
}

/// 一次成功的提取。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// 生效的策略。
    pub strategy: ExtractionStrategy,
    /// 命中的选择器或模式名称。
    pub detail: String,
    /// 按文档顺序排列、已去除首尾空白的非空行。
    pub lines: Vec<String>,
}

/// 一个独立的提取策略。
///
/// 实现者在没有匹配时返回 `None`，不应返回错误。
pub trait Strategy: Send + Sync {
    /// 策略的种类，记录在解析元数据中。
    fn kind(&self) -> ExtractionStrategy;

    /// 尝试从 HTML 文档中恢复歌词行。
    ///
    /// # 参数
    /// * `html` - 完整的页面 HTML。
    /// * `min_lines` - 视为成功所需的最少行数。
    fn try_extract(&self, html: &str, min_lines: usize) -> Option<Extraction>;
}

/// 按优先级驱动各个提取策略的提取器。
pub struct HtmlLineExtractor {
    strategies: Vec<Box<dyn Strategy>>,
    options: ExtractorOptions,
}

impl Default for HtmlLineExtractor {
    fn default() -> Self {
        Self::new(ExtractorOptions::default())
    }
}

impl HtmlLineExtractor {
    /// 使用默认策略顺序（结构化选择器，然后是内嵌数据）创建提取器。
    pub fn new(options: ExtractorOptions) -> Self {
        Self::with_strategies(
            vec![
                Box::new(StructuralStrategy),
                Box::new(EmbeddedDataStrategy),
            ],
            options,
        )
    }

    /// 使用自定义的策略列表创建提取器。列表顺序即优先级。
    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>, options: ExtractorOptions) -> Self {
        Self {
            strategies,
            options: ExtractorOptions {
                min_lines: options.min_lines.max(1),
            },
        }
    }

    /// 依次尝试各策略，返回第一个成功的提取结果。
    pub fn extract_detailed(&self, html: &str) -> Option<Extraction> {
        for strategy in &self.strategies {
            debug!("[Extractor] 尝试策略: {}", strategy.kind());
            if let Some(extraction) = strategy.try_extract(html, self.options.min_lines) {
                info!(
                    "[Extractor] 策略 {} ({}) 提取到 {} 行。",
                    extraction.strategy,
                    extraction.detail,
                    extraction.lines.len()
                );
                return Some(extraction);
            }
        }
        debug!("[Extractor] 所有策略均未提取到歌词。");
        None
    }

    /// 提取歌词行。没有任何策略成功时返回空列表。
    pub fn extract(&self, html: &str) -> Vec<String> {
        self.extract_detailed(html)
            .map(|extraction| extraction.lines)
            .unwrap_or_default()
    }
}
