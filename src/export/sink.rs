// Export sink
// クリップボードへの書き込みとファイル保存

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Local;
use tracing::{debug, warn};

use crate::config::{ClipboardConfig, ClipboardMethod};
use crate::editor::DownloadArtifact;

/// コピー完了表示を出しておく時間
pub const COPY_ACK: Duration = Duration::from_secs(2);

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

pub trait Downloader {
    /// 保存先のパスを返す
    fn download(&mut self, artifact: &DownloadArtifact) -> Result<PathBuf>;
}

/// OSC 52 でターミナル経由のクリップボードに書く
pub struct Osc52Clipboard<W: Write> {
    out: W,
    /// 出力先が端末でなければエスケープは誰にも届かない
    terminal: bool,
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W, terminal: bool) -> Self {
        Self { out, terminal }
    }
}

impl Osc52Clipboard<io::Stdout> {
    pub fn stdout() -> Self {
        let out = io::stdout();
        let terminal = out.is_terminal();
        Self::new(out, terminal)
    }
}

pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))
}

impl<W: Write> Clipboard for Osc52Clipboard<W> {
    fn write_text(&mut self, text: &str) -> Result<()> {
        if !self.terminal {
            return Err(anyhow!("OSC 52 needs a terminal on stdout"));
        }
        self.out.write_all(osc52_sequence(text).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// pbcopy / xclip などの標準入力に流し込む
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("clipboard command is empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Clipboard for CommandClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.program))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        let status = child.wait()?;
        if !status.success() {
            return Err(anyhow!("{} exited with {}", self.program, status));
        }
        Ok(())
    }
}

/// クリップボードを使わない
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn write_text(&mut self, _text: &str) -> Result<()> {
        Err(anyhow!("clipboard is disabled"))
    }
}

/// 出力ディレクトリへ保存する。既存ファイルは日時付きでバックアップ。
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl Downloader for DirectorySink {
    fn download(&mut self, artifact: &DownloadArtifact) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.dir.join(artifact.file_name);
        if path.exists() {
            let backup = backup_path(&path);
            std::fs::copy(&path, &backup)
                .with_context(|| format!("failed to back up {}", path.display()))?;
            debug!(backup = %backup.display(), "existing file backed up");
        }
        std::fs::write(&path, &artifact.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%dT%H%M%S%.3f");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}.bak", name, stamp))
}

pub struct ExportSink {
    clipboard: Box<dyn Clipboard>,
    downloader: Box<dyn Downloader>,
}

impl ExportSink {
    pub fn new(clipboard: Box<dyn Clipboard>, downloader: Box<dyn Downloader>) -> Self {
        Self {
            clipboard,
            downloader,
        }
    }

    pub fn from_config(config: &ClipboardConfig, out_dir: PathBuf) -> Self {
        let clipboard: Box<dyn Clipboard> = match config.method {
            ClipboardMethod::Osc52 => Box::new(Osc52Clipboard::stdout()),
            ClipboardMethod::Command => match CommandClipboard::new(&config.command) {
                Ok(clipboard) => Box::new(clipboard),
                Err(err) => {
                    warn!("clipboard command unusable: {}", err);
                    Box::new(NoClipboard)
                }
            },
            ClipboardMethod::None => Box::new(NoClipboard),
        };
        Self::new(clipboard, Box::new(DirectorySink::new(out_dir)))
    }

    /// 失敗はログのみ。成功したかどうかを返す。
    pub fn copy(&mut self, text: &str) -> bool {
        match self.clipboard.write_text(text) {
            Ok(()) => true,
            Err(err) => {
                warn!("error copying to clipboard: {}", err);
                false
            }
        }
    }

    pub fn download(&mut self, artifact: &DownloadArtifact) -> Option<PathBuf> {
        match self.downloader.download(artifact) {
            Ok(path) => Some(path),
            Err(err) => {
                warn!("error saving file: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ConfigDocument;

    #[test]
    fn osc52_carries_base64_payload() {
        let mut out = Vec::new();
        Osc52Clipboard::new(&mut out, true)
            .write_text("echo \"hi\"")
            .unwrap();
        let written = String::from_utf8(out).unwrap();
        assert_eq!(written, format!("\x1b]52;c;{}\x07", STANDARD.encode("echo \"hi\"")));
    }

    #[test]
    fn osc52_refuses_non_terminal_output() {
        let mut out = Vec::new();
        assert!(Osc52Clipboard::new(&mut out, false).write_text("text").is_err());
        assert!(out.is_empty());

        let mut sink = ExportSink::new(
            Box::new(Osc52Clipboard::new(Vec::new(), false)),
            Box::new(DirectorySink::new(PathBuf::from("."))),
        );
        assert!(!sink.copy("text"));
    }

    #[test]
    fn command_clipboard_requires_program() {
        assert!(CommandClipboard::new(&[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn command_clipboard_pipes_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("clip.txt");
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            format!("cat > '{}'", out.display()),
        ];
        let mut clipboard = CommandClipboard::new(&command).unwrap();
        clipboard.write_text("payload").unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "payload");
    }

    #[test]
    fn directory_sink_writes_and_backs_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("out"));
        let artifact = ConfigDocument::default().to_artifact();

        let path = sink.download(&artifact).unwrap();
        assert_eq!(path.file_name().unwrap(), "claude_desktop_config.json");
        assert_eq!(std::fs::read(&path).unwrap(), artifact.content.to_vec());

        sink.download(&artifact).unwrap();
        let backups: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".bak"))
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn export_failures_are_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let mut sink = ExportSink::new(Box::new(NoClipboard), Box::new(DirectorySink::new(blocker)));
        assert!(!sink.copy("text"));
        assert!(sink.download(&ConfigDocument::default().to_artifact()).is_none());
    }
}
