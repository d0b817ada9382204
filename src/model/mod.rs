//! 数据模型模块
//!
//! 定义了搜索候选、歌词结果和显示分段等在各组件之间传递的数据结构。

pub mod lyrics;
pub mod track;
