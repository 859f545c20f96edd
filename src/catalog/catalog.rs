// Catalog module
// 追加できるMCPサーバーの一覧

use once_cell::sync::Lazy;

use crate::config::CatalogOverride;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerDescriptor {
    /// mcpServers にマージする
    Merge { command: String, args: Vec<String> },
    /// ターミナルで実行するインストールコマンド（表示のみ）
    Terminal { command: String },
}

impl ServerDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerDescriptor::Merge { .. } => "json",
            ServerDescriptor::Terminal { .. } => "terminal",
        }
    }

    pub fn command_line(&self) -> String {
        match self {
            ServerDescriptor::Merge { command, args } => {
                let mut parts = vec![command.as_str()];
                parts.extend(args.iter().map(String::as_str));
                parts.join(" ")
            }
            ServerDescriptor::Terminal { command } => command.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub descriptor: ServerDescriptor,
}

impl CatalogEntry {
    fn merge(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            descriptor: ServerDescriptor::Merge {
                command: "mcp".to_string(),
                args: vec![id.to_string()],
            },
        }
    }

    fn terminal(id: &str, name: &str, description: &str, command: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            descriptor: ServerDescriptor::Terminal {
                command: command.to_string(),
            },
        }
    }
}

static BUILTIN: Lazy<Vec<CatalogEntry>> = Lazy::new(|| {
    vec![
        CatalogEntry::merge("filesystem", "Filesystem", "Read and write files in allowed directories"),
        CatalogEntry::merge("github", "GitHub", "Repositories, issues and pull requests"),
        CatalogEntry::merge("gitlab", "GitLab", "GitLab projects and merge requests"),
        CatalogEntry::merge("git", "Git", "Inspect and manipulate local git repositories"),
        CatalogEntry::merge("memory", "Memory", "Knowledge-graph based persistent memory"),
        CatalogEntry::merge("fetch", "Fetch", "Fetch web pages and convert them to markdown"),
        CatalogEntry::merge("brave-search", "Brave Search", "Web and local search via the Brave API"),
        CatalogEntry::merge("puppeteer", "Puppeteer", "Browser automation and screenshots"),
        CatalogEntry::merge("postgres", "PostgreSQL", "Read-only database access"),
        CatalogEntry::merge("sqlite", "SQLite", "Query and analyze SQLite databases"),
        CatalogEntry::merge("slack", "Slack", "Channels and messages in a Slack workspace"),
        CatalogEntry::merge("google-maps", "Google Maps", "Geocoding, places and directions"),
        CatalogEntry::merge("sequential-thinking", "Sequential Thinking", "Structured step-by-step reasoning"),
        CatalogEntry::terminal(
            "obsidian",
            "Obsidian",
            "Search and read notes in an Obsidian vault",
            "npx -y @smithery/cli install mcp-obsidian --client claude",
        ),
        CatalogEntry::terminal(
            "todoist",
            "Todoist",
            "Manage Todoist tasks",
            "npx -y @smithery/cli install @abhiz123/todoist-mcp-server --client claude",
        ),
        CatalogEntry::terminal(
            "youtube-transcript",
            "YouTube Transcript",
            "Fetch transcripts of YouTube videos",
            "npx -y @smithery/cli install @kimtaeyoon83/mcp-server-youtube-transcript --client claude",
        ),
    ]
});

#[derive(Debug, Clone)]
pub struct ServerCatalog {
    entries: Vec<CatalogEntry>,
}

impl ServerCatalog {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN.clone(),
        }
    }

    /// 設定ファイルの `[[catalog]]` で追加・上書きする
    pub fn with_overrides(mut self, overrides: &[CatalogOverride]) -> Self {
        for item in overrides {
            let descriptor = match &item.terminal_command {
                Some(command) => ServerDescriptor::Terminal {
                    command: command.clone(),
                },
                None => ServerDescriptor::Merge {
                    command: "mcp".to_string(),
                    args: vec![item.id.clone()],
                },
            };
            let entry = CatalogEntry {
                id: item.id.clone(),
                name: item.name.clone().unwrap_or_else(|| item.id.clone()),
                description: item.description.clone().unwrap_or_default(),
                descriptor,
            };
            match self.entries.iter_mut().find(|existing| existing.id == entry.id) {
                Some(existing) => *existing = entry,
                None => self.entries.push(entry),
            }
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn ids_with_prefix(&self, prefix: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.id.starts_with(prefix))
            .map(|entry| entry.id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_are_unique() {
        let catalog = ServerCatalog::builtin();
        let mut ids: Vec<&str> = catalog.iter().map(|entry| entry.id.as_str()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn merge_entries_launch_through_mcp() {
        let catalog = ServerCatalog::builtin();
        let entry = catalog.get("filesystem").unwrap();
        assert_eq!(
            entry.descriptor,
            ServerDescriptor::Merge {
                command: "mcp".to_string(),
                args: vec!["filesystem".to_string()],
            }
        );
        assert_eq!(entry.descriptor.command_line(), "mcp filesystem");
        let obsidian = catalog.get("obsidian").unwrap();
        assert_eq!(obsidian.descriptor.kind(), "terminal");
        assert!(obsidian.descriptor.command_line().starts_with("npx "));
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn overrides_replace_and_append() {
        let overrides = vec![
            CatalogOverride {
                id: "filesystem".to_string(),
                name: None,
                description: Some("custom".to_string()),
                terminal_command: Some("brew install fs-mcp".to_string()),
            },
            CatalogOverride {
                id: "linear".to_string(),
                name: Some("Linear".to_string()),
                description: None,
                terminal_command: None,
            },
        ];
        let builtin_len = ServerCatalog::builtin().iter().count();
        let catalog = ServerCatalog::builtin().with_overrides(&overrides);
        assert_eq!(catalog.iter().count(), builtin_len + 1);

        let fs = catalog.get("filesystem").unwrap();
        assert_eq!(fs.name, "filesystem");
        assert_eq!(fs.description, "custom");
        assert_eq!(fs.descriptor.kind(), "terminal");

        let linear = catalog.get("linear").unwrap();
        assert_eq!(linear.name, "Linear");
        assert_eq!(linear.descriptor.kind(), "json");
    }

    #[test]
    fn prefix_lookup() {
        let catalog = ServerCatalog::builtin();
        assert_eq!(catalog.ids_with_prefix("git"), vec!["github", "gitlab", "git"]);
    }
}
