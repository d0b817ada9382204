//! 歌词文本的后处理模块：行清洗与显示分段。

pub mod line_cleaner;
pub mod segmenter;
