//! 解析结果的内存缓存：按规范化查询索引，带 TTL 和 LRU 容量上限。
//!
//! 时间使用 `tokio::time::Instant`，因此测试可以用暂停的时钟来推进 TTL。

use std::{
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use lru::LruCache;
use tokio::time::Instant;

use crate::model::lyrics::LyricsResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: LyricsResult,
    stored_at: Instant,
}

/// 解析结果缓存。
#[derive(Debug)]
pub struct ResultCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
    fallback_ttl: Duration,
}

impl ResultCache {
    /// 创建一个缓存。
    ///
    /// # 参数
    /// * `capacity` - 最多保留的条目数，为 0 时按 1 处理。
    /// * `ttl` - 成功结果的有效期。
    /// * `fallback_ttl` - 回退结果的有效期。
    pub fn new(capacity: usize, ttl: Duration, fallback_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            fallback_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        // 条目总是整体替换，锁中毒时数据依然一致
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ttl_for(&self, value: &LyricsResult) -> Duration {
        if value.is_fallback {
            self.fallback_ttl
        } else {
            self.ttl
        }
    }

    /// 读取一个仍在有效期内的条目。过期的条目会被移除。
    pub fn get(&self, key: &str) -> Option<LyricsResult> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl_for(&entry.value) {
            return Some(entry.value.clone());
        }
        entries.pop(key);
        None
    }

    /// 写入一个条目，覆盖同键的旧条目。
    pub fn insert(&self, key: String, value: LyricsResult) {
        self.lock().put(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// 某个条目的写入时间，不论是否过期。不会影响 LRU 顺序。
    pub fn stored_at(&self, key: &str) -> Option<Instant> {
        self.lock().peek(key).map(|entry| entry.stored_at)
    }

    /// 当前的条目数。
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// 缓存是否为空。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::lyrics::ExtractionMeta;

    fn result(title: &str, is_fallback: bool) -> LyricsResult {
        LyricsResult {
            id: 1,
            title: title.to_string(),
            artist: "artist".to_string(),
            lines: vec!["line".to_string()],
            source_url: "https://example.com".to_string(),
            extraction_meta: ExtractionMeta {
                search_query: title.to_string(),
                strategy_used: None,
                strategy_detail: None,
                candidate_index: None,
                line_count: 1,
                found_results: 0,
                failure: None,
                failure_detail: None,
                timestamp: Utc::now(),
            },
            is_fallback,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ResultCache::new(8, Duration::from_secs(300), Duration::from_secs(60));
        cache.insert("a".into(), result("a", false));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("a").is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_uses_its_own_ttl() {
        let cache = ResultCache::new(8, Duration::from_secs(300), Duration::from_secs(60));
        cache.insert("f".into(), result("f", true));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("f").is_none());
    }

    #[tokio::test]
    async fn test_least_recently_used_entry_is_evicted() {
        let cache = ResultCache::new(2, Duration::from_secs(300), Duration::from_secs(300));
        cache.insert("a".into(), result("a", false));
        cache.insert("b".into(), result("b", false));
        assert!(cache.get("a").is_some());

        cache.insert("c".into(), result("c", false));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_stored_at() {
        let cache = ResultCache::new(4, Duration::from_secs(300), Duration::from_secs(300));
        cache.insert("a".into(), result("old", false));
        let first = cache.stored_at("a").unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        cache.insert("a".into(), result("new", false));

        assert!(cache.stored_at("a").unwrap() > first);
        assert_eq!(cache.get("a").unwrap().title, "new");
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = ResultCache::new(0, Duration::from_secs(1), Duration::from_secs(1));
        assert!(cache.is_empty());
    }
}
