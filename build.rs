use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    // 再現ビルドでは SOURCE_DATE_EPOCH を優先
    let args: Vec<String> = match std::env::var("SOURCE_DATE_EPOCH") {
        Ok(epoch) if !epoch.trim().is_empty() => vec![
            "-u".to_string(),
            "-d".to_string(),
            format!("@{}", epoch.trim()),
            "+%Y-%m-%d".to_string(),
        ],
        _ => vec!["+%Y-%m-%d %H:%M".to_string()],
    };
    let build_time = Command::new("date")
        .args(&args)
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_time);
}
