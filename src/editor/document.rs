// Config document
// claude_desktop_config.json の中身

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::json::to_js_pretty_string;
use crate::editor::EditorError;

pub const MCP_SERVERS_KEY: &str = "mcpServers";
pub const ARTIFACT_FILE_NAME: &str = "claude_desktop_config.json";

/// Claude Desktopが起動するMCPサーバー1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub command: String,
    pub args: Vec<String>,
}

impl ServerEntry {
    /// `mcp <id>` で起動するエントリ
    pub fn launcher(id: &str) -> Self {
        Self {
            command: "mcp".to_string(),
            args: vec![id.to_string()],
        }
    }
}

/// `validate()` が返す型付きビュー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpConfig {
    pub mcp_servers: Map<String, Value>,
}

impl McpConfig {
    pub fn entries(&self) -> Vec<(String, ServerEntry)> {
        self.mcp_servers
            .iter()
            .filter_map(|(name, value)| {
                serde_json::from_value::<ServerEntry>(value.clone())
                    .ok()
                    .map(|entry| (name.clone(), entry))
            })
            .collect()
    }
}

/// 保存用ファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: &'static str,
    pub content: Bytes,
}

/// 読み込んだJSONをそのまま保持する。形は検証しない。
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: Value,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        let mut root = Map::new();
        root.insert(MCP_SERVERS_KEY.to_string(), Value::Object(Map::new()));
        Self {
            root: Value::Object(root),
        }
    }
}

impl ConfigDocument {
    pub fn parse(raw: &str) -> Result<Self, EditorError> {
        let root: Value = serde_json::from_str(raw)?;
        Ok(Self { root })
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn server_names(&self) -> Vec<String> {
        self.servers()
            .map(|servers| servers.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// `Object.keys(doc).length > 0` 相当
    pub fn has_content(&self) -> bool {
        match &self.root {
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::String(text) => !text.is_empty(),
            _ => false,
        }
    }

    pub fn has_servers(&self) -> bool {
        self.servers().map(|servers| !servers.is_empty()).unwrap_or(false)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.servers().and_then(|servers| servers.get(name))
    }

    /// 既存の同名エントリは上書き
    pub fn with_server(&self, name: &str, entry: &ServerEntry) -> Self {
        let mut root = match &self.root {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let mut servers = match root.get(MCP_SERVERS_KEY) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        servers.insert(
            name.to_string(),
            json!({ "command": entry.command, "args": entry.args }),
        );
        root.insert(MCP_SERVERS_KEY.to_string(), Value::Object(servers));
        Self {
            root: Value::Object(root),
        }
    }

    pub fn without_server(&self, name: &str) -> Self {
        let mut next = self.clone();
        if let Some(Value::Object(servers)) = next
            .root
            .as_object_mut()
            .and_then(|root| root.get_mut(MCP_SERVERS_KEY))
        {
            servers.shift_remove(name);
        }
        next
    }

    /// `JSON.stringify(doc, null, 2)` 相当
    pub fn to_pretty_json(&self) -> String {
        to_js_pretty_string(self.as_value()).unwrap_or_else(|_| "null".to_string())
    }

    pub fn to_artifact(&self) -> DownloadArtifact {
        DownloadArtifact {
            file_name: ARTIFACT_FILE_NAME,
            content: Bytes::from(self.to_pretty_json()),
        }
    }

    pub fn validate(&self) -> Result<McpConfig, EditorError> {
        let root = self
            .root
            .as_object()
            .ok_or_else(|| EditorError::InvalidShape("root is not an object".to_string()))?;
        let servers = root
            .get(MCP_SERVERS_KEY)
            .ok_or_else(|| EditorError::InvalidShape("missing mcpServers".to_string()))?
            .as_object()
            .ok_or_else(|| EditorError::InvalidShape("mcpServers is not an object".to_string()))?;
        for (name, value) in servers {
            let entry: ServerEntry = serde_json::from_value(value.clone()).map_err(|err| {
                EditorError::InvalidShape(format!("server {}: {}", name, err))
            })?;
            if entry.command.trim().is_empty() {
                return Err(EditorError::InvalidShape(format!(
                    "server {}: empty command",
                    name
                )));
            }
        }
        Ok(McpConfig {
            mcp_servers: servers.clone(),
        })
    }

    fn servers(&self) -> Option<&Map<String, Value>> {
        self.root.get(MCP_SERVERS_KEY).and_then(Value::as_object)
    }
}
