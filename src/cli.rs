use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::PathBuf;
use tokio::runtime::Handle;
use tracing::info;

use crate::catalog::ServerCatalog;
use crate::config::Config;
use crate::editor::Editor;
use crate::export::{bootstrap_command, DirectorySink, ExportSink, NoClipboard};
use crate::tui::App;

#[derive(Parser, Debug)]
#[command(
    name = "mcpdesk",
    version,
    about = "Claude Desktop の MCP サーバー設定を編集し、適用用のシェルコマンドを生成する",
    long_about = None
)]
pub struct Cli {
    /// 読み込む設定JSON（- で標準入力）
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// 標準出力ではなくクリップボードへ送る
    #[arg(long, global = true)]
    pub copy: bool,

    /// 設定ファイル
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 詳細ログ
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// サブコマンド
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 既存の設定をクリップボードへコピーするコマンドを表示
    Bootstrap,

    /// 追加できるサーバー一覧
    Catalog,

    /// 読み込んだ設定を表示
    Show,

    /// サーバー追加
    Add {
        /// サーバーID
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// サーバー削除
    Remove {
        /// サーバーID
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// 変更を適用するコマンドを表示
    Apply,

    /// claude_desktop_config.json として保存
    Save {
        /// 保存先ディレクトリ
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// mcpServers の形を検証
    Validate,

    /// 対話フォーム起動
    Tui,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Commands::Tui))
    }

    pub async fn execute(self) -> Result<()> {
        let config = Config::load_default(self.config.as_deref());
        let catalog = ServerCatalog::builtin().with_overrides(&config.catalog);
        let mut editor = Editor::new(catalog, config.paths.target.clone());
        let mut sink = ExportSink::from_config(&config.clipboard, config.out_dir());

        self.load_input(&mut editor).await?;

        match &self.command {
            None | Some(Commands::Tui) => {
                let mut app = App::new(editor, sink, Handle::current(), build_label());
                app.run()
            }
            Some(Commands::Bootstrap) => {
                self.emit(&mut sink, &bootstrap_command(editor.target_path()));
                Ok(())
            }
            Some(Commands::Catalog) => {
                for entry in editor.catalog().iter() {
                    println!(
                        "{:<20} {:<8} {}",
                        entry.id,
                        entry.descriptor.kind(),
                        entry.description
                    );
                    if self.verbose {
                        println!("    {}", entry.descriptor.command_line());
                    }
                }
                Ok(())
            }
            Some(Commands::Show) => {
                self.emit(&mut sink, &editor.document().to_pretty_json());
                Ok(())
            }
            Some(Commands::Add { ids }) => {
                require_loaded(&editor)?;
                for id in ids {
                    editor.add_server(id)?;
                    info!(server = %id, "added");
                }
                self.emit_apply(&editor, &mut sink);
                Ok(())
            }
            Some(Commands::Remove { ids }) => {
                require_loaded(&editor)?;
                for id in ids {
                    editor.remove_server(id);
                }
                self.emit_apply(&editor, &mut sink);
                Ok(())
            }
            Some(Commands::Apply) => {
                require_loaded(&editor)?;
                self.emit_apply(&editor, &mut sink);
                Ok(())
            }
            Some(Commands::Save { out_dir }) => {
                require_loaded(&editor)?;
                let artifact = editor.render_download_artifact();
                let saved = match out_dir {
                    Some(dir) => {
                        let downloader = DirectorySink::new(dir.clone());
                        ExportSink::new(Box::new(NoClipboard), Box::new(downloader)).download(&artifact)
                    }
                    None => sink.download(&artifact),
                };
                match saved {
                    Some(path) => println!("saved: {}", path.display()),
                    None => eprintln!("failed to save {}", artifact.file_name),
                }
                Ok(())
            }
            Some(Commands::Validate) => {
                let config = editor.document().validate()?;
                let entries = config.entries();
                println!("ok: {} server(s)", entries.len());
                for (name, entry) in entries {
                    println!("{} {} {}", name, entry.command, entry.args.join(" "));
                }
                Ok(())
            }
        }
    }

    async fn load_input(&self, editor: &mut Editor) -> Result<()> {
        let Some(input) = &self.input else {
            return Ok(());
        };
        if input.as_os_str() == "-" {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read stdin")?;
            editor.load_from_text(&raw)?;
        } else {
            editor.load_from_file(input).await?;
        }
        Ok(())
    }

    fn emit_apply(&self, editor: &Editor, sink: &mut ExportSink) {
        let commands = editor.apply_commands();
        if commands.is_empty() {
            eprintln!("nothing to apply");
            return;
        }
        self.emit(sink, &commands.join("\n"));
        eprintln!("then restart Claude.app");
    }

    fn emit(&self, sink: &mut ExportSink, text: &str) {
        if self.copy {
            if sink.copy(text) {
                eprintln!("copied to clipboard");
            } else {
                println!("{}", text);
            }
        } else {
            println!("{}", text);
        }
    }
}

/// add / remove / apply / save は設定の読み込み後のみ
fn require_loaded(editor: &Editor) -> Result<()> {
    editor
        .require_loaded()
        .map_err(|err| anyhow!("{} (pass it with --input)", err))
}

pub fn build_label() -> String {
    let timestamp = option_env!("BUILD_TIMESTAMP").unwrap_or("unknown");
    format!("{} ({})", env!("CARGO_PKG_VERSION"), timestamp)
}

pub fn parse_ids(raw: &str) -> Result<Vec<String>> {
    let ids: Vec<String> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return Err(anyhow!("server id required"));
    }
    Ok(ids)
}
