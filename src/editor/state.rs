use crate::editor::ConfigDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Success,
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Idle => "idle",
            UploadStatus::Success => "success",
            UploadStatus::Error => "error",
        }
    }
}

/// エディタの状態。遷移ごとに新しい値を作って丸ごと差し替える。
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub document: ConfigDocument,
    pub terminal_servers: Vec<String>,
    pub status: UploadStatus,
    pub loading: bool,
    pub instructions_open: bool,
    pub load_generation: u64,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            document: ConfigDocument::default(),
            terminal_servers: Vec::new(),
            status: UploadStatus::Idle,
            loading: false,
            instructions_open: true,
            load_generation: 0,
        }
    }
}

impl EditorState {
    pub fn with_document(&self, document: ConfigDocument) -> Self {
        Self {
            document,
            ..self.clone()
        }
    }

    pub fn with_status(&self, status: UploadStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn with_terminal_servers(&self, terminal_servers: Vec<String>) -> Self {
        Self {
            terminal_servers,
            ..self.clone()
        }
    }
}
