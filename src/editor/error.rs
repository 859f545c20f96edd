use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    /// 入力がJSONとして解釈できない
    #[error("malformed JSON input: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown server: {0}")]
    UnknownServer(String),

    #[error("unexpected config shape: {0}")]
    InvalidShape(String),

    /// 編集前に現在の設定を読み込んでいない
    #[error("load your config first")]
    NotLoaded,
}
