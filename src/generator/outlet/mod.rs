use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// 默认文件名前缀
pub const DEFAULT_FILE_PREFIX: &str = "research_paper";

/// 以当前本地时间生成默认文件名：`research_paper_<YYYYMMDD_HHMMSS>.tex`
pub fn default_file_name() -> String {
    format!(
        "{}_{}.tex",
        DEFAULT_FILE_PREFIX,
        Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// 保存文档
///
/// 先写入同目录下的临时文件再重命名，目标文件要么是完整内容，要么保持原状。
pub fn save_document(dir: &Path, file_name: Option<&str>, text: &str) -> Result<PathBuf> {
    let file_name = match file_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => default_file_name(),
    };

    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)
            .with_context(|| format!("无法创建输出目录: {}", dir.display()))?;
    }

    let target = dir.join(&file_name);
    let staging = dir.join(format!(".{}.tmp", file_name));

    fs::write(&staging, text)
        .with_context(|| format!("无法写入临时文件: {}", staging.display()))?;
    if let Err(e) = fs::rename(&staging, &target) {
        let _ = fs::remove_file(&staging);
        return Err(e).with_context(|| format!("无法保存文档: {}", target.display()));
    }

    info!("💾 已保存文档: {}", target.display());
    Ok(target)
}
