// Shell command rendering

pub const DEFAULT_TARGET_PATH: &str =
    "~/Library/Application\\ Support/Claude/claude_desktop_config.json";

/// 既存の設定をクリップボードへ、無ければ空の設定を作ってからコピーする
pub fn bootstrap_command(target: &str) -> String {
    format!(
        "test -f {target} && pbcopy < {target} || (echo '{{\\n  \"mcpServers\": {{}}\\n}}' | tee {target} | pbcopy)"
    )
}

/// `"` と改行だけをエスケープする。バックスラッシュはそのまま。
pub fn escape_for_double_quotes(json: &str) -> String {
    json.replace('"', "\\\"").replace('\n', "\\n")
}

pub fn apply_command(json: &str, target: &str) -> String {
    format!("echo \"{}\" > {}", escape_for_double_quotes(json), target)
}
