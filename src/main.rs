use anyhow::Result;
use clap::Parser;

mod catalog;
mod cli;
mod config;
mod editor;
mod export;
mod tui;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // CLI引数パース
    let cli = Cli::parse();

    // ログ初期化（TUI中は画面を崩さないよう既定で無効）
    let default_filter = if cli.verbose {
        "debug"
    } else if cli.is_interactive() {
        "off"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    // 実行
    cli.execute().await?;

    Ok(())
}
