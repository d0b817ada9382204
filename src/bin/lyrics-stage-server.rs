//! 歌词舞台的 HTTP 服务入口。

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lyrics_stage_rs::{
    LyricsStage,
    config::{DICTIONARY_VAR, StageConfig},
    server::{AppState, build_router},
};

#[derive(Parser, Debug)]
#[command(name = "lyrics-stage-server", version, about = "歌词搜索、提取与分段服务")]
struct Args {
    /// 配置文件路径，默认使用用户配置目录下的 lyrics-stage/config.json
    #[arg(short, long, env = "LYRICS_STAGE_CONFIG")]
    config: Option<PathBuf>,

    /// 监听地址，覆盖配置文件中的 bind_addr
    #[arg(short, long, env = "LYRICS_STAGE_BIND")]
    bind: Option<SocketAddr>,

    /// 形态素分析词典路径
    #[arg(short, long, env = DICTIONARY_VAR)]
    dictionary: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lyrics_stage_rs=debug,tower_http=debug".into()),
        )
        .with(fmt::layer())
        .init();

    let args = Args::parse();
    info!("[Server] lyrics-stage-server v{} 正在启动", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => StageConfig::load_from(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => StageConfig::load().context("无法加载配置")?,
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dictionary) = args.dictionary {
        config.dictionary_path = Some(dictionary);
    }

    let token_configured = config.genius_access_token.is_some();
    if token_configured {
        info!("[Server] 已找到 Genius 访问令牌。");
    } else {
        warn!("[Server] 未配置 Genius 访问令牌，所有歌词请求都将返回回退结果。");
    }
    if config.spotify_client_id.is_none() || config.spotify_client_secret.is_none() {
        warn!("[Server] 未完整配置 Spotify 凭据，目录搜索将不可用。");
    }

    let stage = LyricsStage::from_config(&config).context("无法初始化 LyricsStage")?;
    let app = build_router(AppState::new(Arc::new(stage), token_configured));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("无法监听 {}", config.bind_addr))?;
    info!("[Server] 正在监听 http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("服务异常退出")?;
    Ok(())
}
