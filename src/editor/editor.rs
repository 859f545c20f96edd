// Editor module
// 設定ドキュメントの編集と出力

use std::path::Path;

use tracing::{debug, error, info};

use crate::catalog::{ServerCatalog, ServerDescriptor};
use crate::editor::{ConfigDocument, DownloadArtifact, EditorError, EditorState, ServerEntry, UploadStatus};
use crate::export::apply_command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// より新しい読み込みが始まっていたため破棄
    Stale,
}

pub struct Editor {
    state: EditorState,
    catalog: ServerCatalog,
    target_path: String,
}

impl Editor {
    pub fn new(catalog: ServerCatalog, target_path: String) -> Self {
        Self {
            state: EditorState::default(),
            catalog,
            target_path,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.state.document
    }

    pub fn status(&self) -> UploadStatus {
        self.state.status
    }

    pub fn catalog(&self) -> &ServerCatalog {
        &self.catalog
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    pub fn is_loaded(&self) -> bool {
        self.state.status == UploadStatus::Success
    }

    /// 追加・削除・適用は読み込み成功後のみ
    pub fn require_loaded(&self) -> Result<(), EditorError> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(EditorError::NotLoaded)
        }
    }

    /// サーバー一覧は読み込み成功後、中身のある文書のときだけ表示する
    pub fn show_servers(&self) -> bool {
        self.is_loaded() && self.state.document.has_content()
    }

    pub fn set_instructions_open(&mut self, open: bool) {
        self.state = EditorState {
            instructions_open: open,
            ..self.state.clone()
        };
    }

    pub fn load_from_text(&mut self, raw: &str) -> Result<(), EditorError> {
        match ConfigDocument::parse(raw) {
            Ok(document) => {
                self.state = EditorState {
                    document,
                    status: UploadStatus::Success,
                    instructions_open: false,
                    ..self.state.clone()
                };
                info!(servers = self.state.document.server_names().len(), "config loaded from text");
                Ok(())
            }
            Err(err) => {
                error!("error parsing JSON: {}", err);
                self.state = self.state.with_status(UploadStatus::Error);
                Err(err)
            }
        }
    }

    /// ファイル読み込み開始。戻り値の世代番号を `finish_file_load` に渡す。
    pub fn begin_file_load(&mut self) -> u64 {
        let generation = self.state.load_generation.wrapping_add(1);
        self.state = EditorState {
            loading: true,
            status: UploadStatus::Idle,
            load_generation: generation,
            ..self.state.clone()
        };
        generation
    }

    pub fn finish_file_load(
        &mut self,
        generation: u64,
        result: Result<String, EditorError>,
    ) -> Result<LoadOutcome, EditorError> {
        if generation != self.state.load_generation {
            debug!(generation, latest = self.state.load_generation, "stale file load ignored");
            return Ok(LoadOutcome::Stale);
        }
        let parsed = result.and_then(|raw| ConfigDocument::parse(&raw));
        match parsed {
            Ok(document) => {
                self.state = EditorState {
                    document,
                    status: UploadStatus::Success,
                    loading: false,
                    ..self.state.clone()
                };
                info!(servers = self.state.document.server_names().len(), "config loaded from file");
                Ok(LoadOutcome::Applied)
            }
            Err(err) => {
                error!("error loading config file: {}", err);
                self.state = EditorState {
                    status: UploadStatus::Error,
                    loading: false,
                    ..self.state.clone()
                };
                Err(err)
            }
        }
    }

    pub async fn load_from_file(&mut self, path: &Path) -> Result<LoadOutcome, EditorError> {
        let generation = self.begin_file_load();
        let result = read_config_file(path).await;
        self.finish_file_load(generation, result)
    }

    pub fn add_server(&mut self, id: &str) -> Result<(), EditorError> {
        let entry = self
            .catalog
            .get(id)
            .ok_or_else(|| EditorError::UnknownServer(id.to_string()))?;
        match &entry.descriptor {
            ServerDescriptor::Terminal { .. } => {
                let mut selection = self.state.terminal_servers.clone();
                selection.push(id.to_string());
                self.state = self.state.with_terminal_servers(selection);
            }
            ServerDescriptor::Merge { .. } => {
                let document = self
                    .state
                    .document
                    .with_server(id, &ServerEntry::launcher(id));
                self.state = self.state.with_document(document);
            }
        }
        debug!(server = id, "server added");
        Ok(())
    }

    pub fn remove_server(&mut self, id: &str) {
        let selection = self
            .state
            .terminal_servers
            .iter()
            .filter(|selected| selected.as_str() != id)
            .cloned()
            .collect();
        let document = self.state.document.without_server(id);
        self.state = EditorState {
            document,
            terminal_servers: selection,
            ..self.state.clone()
        };
        debug!(server = id, "server removed");
    }

    pub fn render_download_artifact(&self) -> DownloadArtifact {
        self.state.document.to_artifact()
    }

    pub fn render_apply_command(&self) -> String {
        apply_command(&self.state.document.to_pretty_json(), &self.target_path)
    }

    /// 「変更を適用」に並べるコマンド
    pub fn apply_commands(&self) -> Vec<String> {
        let mut commands = Vec::new();
        if self.state.document.has_servers() {
            commands.push(self.render_apply_command());
        }
        for id in &self.state.terminal_servers {
            if let Some(ServerDescriptor::Terminal { command }) =
                self.catalog.get(id).map(|entry| &entry.descriptor)
            {
                commands.push(command.clone());
            }
        }
        commands
    }
}

pub async fn read_config_file(path: &Path) -> Result<String, EditorError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| EditorError::Io {
            path: path.to_path_buf(),
            source,
        })
}
