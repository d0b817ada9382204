//! 歌词行清洗器。
//!
//! 过滤掉空行、异常长的行和歌词站点的页面模板文本，
//! 按首次出现顺序去重，并限制最终行数。

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::RegexSet;

/// 单行歌词允许的最大字符数。
pub const MAX_LINE_CHARS: usize = 1000;

/// 清洗后最多保留的行数。
pub const MAX_LINES: usize = 100;

/// 已知的非歌词模板文本，均对去除首尾空白后的整行匹配。
static BOILERPLATE_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)^\d+\s*contributors?",
        r"(?i)^you might also like",
        r"(?i)^more on genius",
        r"(?i)^embed$",
        r"(?i)^genius$",
        r"(?i)^see .* live",
        r"(?i)^get tickets",
        r"(?i)^\d+(?:\.\d+)?k?$",
    ])
    .expect("编译 BOILERPLATE_PATTERNS 失败")
});

/// 判断一行（已去除首尾空白）是否为模板文本。
pub fn is_boilerplate(trimmed: &str) -> bool {
    BOILERPLATE_PATTERNS.is_match(trimmed)
}

/// 清洗歌词行。
///
/// 纯函数，不修改输入。输出中的每一行都已去除首尾空白，长度在
/// `1..=MAX_LINE_CHARS` 之间，互不相同，且不匹配任何模板文本。
///
/// # 参数
/// * `lines` - 提取器得到的原始行，按文档顺序。
///
/// # 返回
/// 清洗后的行，最多 `MAX_LINES` 行。
pub fn clean<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();

    for line in lines {
        if cleaned.len() >= MAX_LINES {
            break;
        }

        let trimmed = line.as_ref().trim();
        let char_count = trimmed.chars().count();
        if char_count == 0 || char_count > MAX_LINE_CHARS {
            continue;
        }
        if is_boilerplate(trimmed) {
            continue;
        }
        if seen.insert(trimmed) {
            cleaned.push(trimmed.to_string());
        }
    }

    cleaned
}
