// Config module
// 設定ファイル管理 (~/.mcpdesk/config.toml, ./.mcpdesk/config.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::export::DEFAULT_TARGET_PATH;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    #[serde(default)]
    pub catalog: Vec<CatalogOverride>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// シェルコマンドに埋め込むパス（エスケープ済み）
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardMethod {
    #[default]
    Osc52,
    Command,
    None,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClipboardConfig {
    #[serde(default)]
    pub method: ClipboardMethod,
    #[serde(default = "default_clipboard_command")]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogOverride {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub terminal_command: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            out_dir: default_out_dir(),
        }
    }
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            method: ClipboardMethod::Osc52,
            command: default_clipboard_command(),
        }
    }
}

fn default_target() -> String {
    DEFAULT_TARGET_PATH.to_string()
}

fn default_out_dir() -> String {
    ".".to_string()
}

fn default_clipboard_command() -> Vec<String> {
    vec!["pbcopy".to_string()]
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Self::from_table(read_table(path)?)
    }

    /// ホーム → カレントの順に読み、後勝ち。読めないファイルはログして無視。
    pub fn load_default(explicit: Option<&Path>) -> Self {
        let candidates = match explicit {
            Some(path) => vec![path.to_path_buf()],
            None => Self::candidate_paths(),
        };
        Self::load_layered(&candidates)
    }

    /// セクション単位でマージする。`[[catalog]]` は積み上げる。
    pub fn load_layered(paths: &[PathBuf]) -> Self {
        let mut merged = toml::Table::new();
        for path in paths {
            if !path.exists() {
                continue;
            }
            let table = read_table(path).and_then(|table| {
                Self::from_table(table.clone())?;
                Ok(table)
            });
            match table {
                Ok(table) => {
                    debug!(path = %path.display(), "config loaded");
                    merge_tables(&mut merged, table);
                }
                Err(err) => warn!(path = %path.display(), "ignoring config: {}", err),
            }
        }
        Self::from_table(merged).unwrap_or_else(|err| {
            warn!("ignoring merged config: {}", err);
            Config::default()
        })
    }

    fn from_table(table: toml::Table) -> anyhow::Result<Self> {
        let mut config: Config = toml::Value::Table(table).try_into()?;
        config.expand_env_vars();
        Ok(config)
    }

    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".mcpdesk").join("config.toml"));
        }
        candidates.push(PathBuf::from(".").join(".mcpdesk").join("config.toml"));
        candidates
    }

    pub fn out_dir(&self) -> PathBuf {
        expand_home(&self.paths.out_dir)
    }

    fn expand_env_vars(&mut self) {
        self.paths.target = expand_env_vars_in_string(&self.paths.target);
        self.paths.out_dir = expand_env_vars_in_string(&self.paths.out_dir);
        for part in self.clipboard.command.iter_mut() {
            *part = expand_env_vars_in_string(part);
        }
        for item in self.catalog.iter_mut() {
            if let Some(command) = &item.terminal_command {
                item.terminal_command = Some(expand_env_vars_in_string(command));
            }
        }
    }
}

fn read_table(path: &Path) -> anyhow::Result<toml::Table> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let replacement = match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(next)) => {
                merge_tables(existing, next);
                None
            }
            (Some(toml::Value::Array(existing)), toml::Value::Array(next)) if key == "catalog" => {
                existing.extend(next);
                None
            }
            (_, value) => Some(value),
        };
        if let Some(value) = replacement {
            base.insert(key, value);
        }
    }
}

pub fn expand_home(input: &str) -> PathBuf {
    match input.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(input)),
        None if input == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(input)),
        None => PathBuf::from(input),
    }
}

/// `$VAR` / `${VAR}` を展開する。未定義の変数はそのまま残す。
fn expand_env_vars_in_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            output.push(ch);
            continue;
        }

        if chars.peek() == Some(&'{') {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            for next_ch in chars.by_ref() {
                if next_ch == '}' {
                    closed = true;
                    break;
                }
                name.push(next_ch);
            }
            match std::env::var(&name) {
                Ok(val) if closed && !name.is_empty() => output.push_str(&val),
                _ => {
                    output.push_str("${");
                    output.push_str(&name);
                    if closed {
                        output.push('}');
                    }
                }
            }
            continue;
        }

        let mut name = String::new();
        while let Some(&next_ch) = chars.peek() {
            if !is_env_var_char(next_ch) {
                break;
            }
            name.push(next_ch);
            chars.next();
        }
        match std::env::var(&name) {
            Ok(val) if !name.is_empty() => output.push_str(&val),
            _ => {
                output.push('$');
                output.push_str(&name);
            }
        }
    }

    output
}

fn is_env_var_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_claude_desktop() {
        let config = Config::default();
        assert_eq!(config.paths.target, DEFAULT_TARGET_PATH);
        assert_eq!(config.clipboard.method, ClipboardMethod::Osc52);
        assert_eq!(config.clipboard.command, vec!["pbcopy"]);
        assert!(config.catalog.is_empty());
    }

    #[test]
    fn load_parses_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[paths]
out_dir = "/tmp/out"

[clipboard]
method = "command"
command = ["xclip", "-selection", "clipboard"]

[[catalog]]
id = "linear"
terminal_command = "npx -y linear-mcp"
"#,
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.paths.target, DEFAULT_TARGET_PATH);
        assert_eq!(config.out_dir(), PathBuf::from("/tmp/out"));
        assert_eq!(config.clipboard.method, ClipboardMethod::Command);
        assert_eq!(config.clipboard.command.len(), 3);
        assert_eq!(config.catalog[0].id, "linear");
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "paths = [").unwrap();
        let config = Config::load_default(Some(&path));
        assert_eq!(config.paths.out_dir, ".");
    }

    #[test]
    fn later_file_overrides_per_section() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home.toml");
        let local = dir.path().join("local.toml");
        std::fs::write(
            &home,
            r#"
[paths]
out_dir = "/tmp/home-out"

[clipboard]
method = "none"

[[catalog]]
id = "linear"
"#,
        )
        .unwrap();
        std::fs::write(
            &local,
            r#"
[clipboard]
method = "command"

[[catalog]]
id = "jira"
"#,
        )
        .unwrap();
        let missing = dir.path().join("missing.toml");

        let config = Config::load_layered(&[home, missing, local]);
        assert_eq!(config.paths.out_dir, "/tmp/home-out");
        assert_eq!(config.clipboard.method, ClipboardMethod::Command);
        assert_eq!(config.clipboard.command, vec!["pbcopy"]);
        let ids: Vec<&str> = config.catalog.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["linear", "jira"]);
    }

    #[test]
    fn invalid_layer_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        let bad = dir.path().join("bad.toml");
        std::fs::write(&good, "[paths]\nout_dir = \"/tmp/good\"\n").unwrap();
        std::fs::write(&bad, "[clipboard]\nmethod = \"carrier-pigeon\"\n").unwrap();
        let config = Config::load_layered(&[good, bad]);
        assert_eq!(config.paths.out_dir, "/tmp/good");
        assert_eq!(config.clipboard.method, ClipboardMethod::Osc52);
    }

    #[test]
    fn expands_env_vars() {
        std::env::set_var("MCPDESK_TEST_DIR", "/data");
        assert_eq!(expand_env_vars_in_string("$MCPDESK_TEST_DIR/x"), "/data/x");
        assert_eq!(expand_env_vars_in_string("${MCPDESK_TEST_DIR}y"), "/datay");
        assert_eq!(expand_env_vars_in_string("$MCPDESK_UNSET_VAR"), "$MCPDESK_UNSET_VAR");
        assert_eq!(expand_env_vars_in_string("${}"), "${}");
        assert_eq!(expand_env_vars_in_string("cost $ 5"), "cost $ 5");
        assert_eq!(expand_env_vars_in_string("${MCPDESK_TEST_DIR"), "${MCPDESK_TEST_DIR");
        assert_eq!(expand_env_vars_in_string("a${"), "a${");
    }

    #[test]
    fn expand_home_only_touches_tilde_prefix() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("rel/~/x"), PathBuf::from("rel/~/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/a"), home.join("a"));
        }
    }
}
