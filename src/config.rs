//! 负责加载应用配置。
//!
//! 加载顺序：默认值 → 用户配置目录下的 `lyrics-stage/config.json`（可选）→ 环境变量。

use std::{
    fs,
    io::ErrorKind,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{LyricsStageError, Result},
    extractor::ExtractorOptions,
    providers::{genius, spotify},
    resolver::ResolverOptions,
};

/// 词典路径对应的环境变量名。
pub const DICTIONARY_VAR: &str = "LYRICS_STAGE_DICTIONARY";

const CONFIG_DIR_NAME: &str = "lyrics-stage";
const CONFIG_FILE_NAME: &str = "config.json";

/// 应用的全部配置项。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Genius API 访问令牌。
    pub genius_access_token: Option<String>,
    /// Spotify 客户端 ID。
    pub spotify_client_id: Option<String>,
    /// Spotify 客户端密钥。
    pub spotify_client_secret: Option<String>,
    /// 形态素分析词典的路径。为空时只使用启发式分段。
    pub dictionary_path: Option<PathBuf>,
    /// 成功结果的缓存有效期（秒）。
    pub cache_ttl_secs: u64,
    /// 回退结果的缓存有效期（秒）。
    pub fallback_cache_ttl_secs: u64,
    /// 缓存的最大条目数。
    pub cache_capacity: usize,
    /// 最多尝试的候选数。
    pub max_candidates: usize,
    /// 搜索请求的超时（秒）。
    pub search_timeout_secs: u64,
    /// 页面获取的超时（秒）。
    pub page_timeout_secs: u64,
    /// 形态素分析器初始化的超时（秒）。
    pub tokenizer_init_timeout_secs: u64,
    /// 提取策略视为成功所需的最少行数。
    pub min_extracted_lines: usize,
    /// HTTP 服务监听地址。
    pub bind_addr: SocketAddr,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            genius_access_token: None,
            spotify_client_id: None,
            spotify_client_secret: None,
            dictionary_path: None,
            cache_ttl_secs: 300,
            fallback_cache_ttl_secs: 300,
            cache_capacity: 512,
            max_candidates: 3,
            search_timeout_secs: 10,
            page_timeout_secs: 15,
            tokenizer_init_timeout_secs: 10,
            min_extracted_lines: 1,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

/// 默认配置文件的完整路径。
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl StageConfig {
    /// 从默认位置加载配置，并应用环境变量覆盖。
    pub fn load() -> Result<Self> {
        let mut config = match default_config_path() {
            Some(path) => Self::from_file_or_default(&path)?,
            None => {
                debug!("无法找到用户配置目录，使用默认配置。");
                Self::default()
            }
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// 从指定文件加载配置，并应用环境变量覆盖。文件必须存在。
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// 读取配置文件。文件不存在时返回默认配置，格式错误时返回错误。
    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        match Self::from_file(path) {
            Err(LyricsStageError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("配置文件 {} 不存在，使用默认配置。", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        info!("已从 {} 加载配置。", path.display());
        Ok(config)
    }

    /// 用环境变量覆盖凭据和词典路径。空值会被忽略。
    ///
    /// # 参数
    /// * `lookup` - 按变量名查询值的函数，便于测试时注入。
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(genius::ACCESS_TOKEN_VAR) {
            self.genius_access_token = Some(token);
        }
        if let Some(id) = get(spotify::CLIENT_ID_VAR) {
            self.spotify_client_id = Some(id);
        }
        if let Some(secret) = get(spotify::CLIENT_SECRET_VAR) {
            self.spotify_client_secret = Some(secret);
        }
        if let Some(path) = get(DICTIONARY_VAR) {
            self.dictionary_path = Some(PathBuf::from(path));
        }
    }

    /// 转换为解析器参数。
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            max_candidates: self.max_candidates,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            fallback_cache_ttl: Duration::from_secs(self.fallback_cache_ttl_secs),
            cache_capacity: self.cache_capacity,
            extractor: ExtractorOptions {
                min_lines: self.min_extracted_lines,
            },
        }
    }

    /// 搜索请求的超时。
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    /// 页面获取的超时。
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    /// 形态素分析器初始化的超时。
    pub fn tokenizer_init_timeout(&self) -> Duration {
        Duration::from_secs(self.tokenizer_init_timeout_secs)
    }
}
