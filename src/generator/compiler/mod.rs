//! 产物编译器
//!
//! 以显式状态机调用外部LaTeX编译器：
//! `CheckTool -> (InstallTool) -> CompilePass(1) -> CompilePass(2) -> VerifyOutput -> Cleanup`。
//! 编译只是尽力而为：任何失败都会退化为返回源文件路径，辅助文件总会被清理。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CompilerConfig;

pub mod backends;

pub use backends::{
    CommandOutput, CommandSpec, PathProbe, ProcessRunner, RunError, TokioRunner, ToolProbe,
};

/// 编译遍数，第二遍用于解析第一遍遗留的交叉引用
pub const COMPILE_PASSES: u8 = 2;

/// 编译状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
    CheckTool,
    InstallTool,
    CompilePass(u8),
    VerifyOutput,
    Cleanup,
    Done,
}

/// 中止编译序列的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("compile pass {pass} timed out after {seconds}s")]
    Timeout { pass: u8, seconds: u64 },

    #[error("compile pass {pass} could not start: {message}")]
    Launch { pass: u8, message: String },
}

/// 编译结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// 已生成PDF
    Compiled,
    /// 编译完成但未找到产物
    MissingOutput,
    /// 编译序列被中止
    Aborted(CompileError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    /// PDF路径，或退化时的源文件路径
    pub artifact: PathBuf,
    pub outcome: CompileOutcome,
    /// 依次经过的状态（不含Done）
    pub visited: Vec<CompileState>,
}

impl CompileReport {
    pub fn is_compiled(&self) -> bool {
        self.outcome == CompileOutcome::Compiled
    }
}

/// LaTeX产物编译器
#[derive(Clone)]
pub struct ArtifactCompiler {
    config: CompilerConfig,
    probe: Arc<dyn ToolProbe>,
    runner: Arc<dyn ProcessRunner>,
}

impl ArtifactCompiler {
    /// 使用系统PATH探测与tokio子进程
    pub fn new(config: CompilerConfig) -> Self {
        Self::with_backends(config, Arc::new(PathProbe), Arc::new(TokioRunner))
    }

    pub fn with_backends(
        config: CompilerConfig,
        probe: Arc<dyn ToolProbe>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            config,
            probe,
            runner,
        }
    }

    /// 编译源文件，永不失败
    pub async fn compile(&self, source: &Path) -> CompileReport {
        let job = CompileJob::new(source);
        let mut visited = Vec::new();
        let mut state = CompileState::CheckTool;
        let mut artifact = source.to_path_buf();
        let mut outcome = CompileOutcome::MissingOutput;

        while state != CompileState::Done {
            visited.push(state);
            state = match state {
                CompileState::CheckTool => {
                    if self.probe.is_available(&self.config.program) {
                        CompileState::CompilePass(1)
                    } else {
                        warn!("⚠️ 未找到 {}，尝试安装...", self.config.program);
                        CompileState::InstallTool
                    }
                }
                CompileState::InstallTool => {
                    if !self.install_tool(&job.dir).await {
                        warn!("❌ 安装失败，仍尝试编译");
                    }
                    CompileState::CompilePass(1)
                }
                CompileState::CompilePass(pass) => {
                    if pass == 1 {
                        job.remove_stale_output();
                    }
                    match self.run_pass(&job, pass).await {
                        Ok(()) if pass < COMPILE_PASSES => CompileState::CompilePass(pass + 1),
                        Ok(()) => CompileState::VerifyOutput,
                        Err(e) => {
                            warn!("❌ PDF生成中止: {}", e);
                            outcome = CompileOutcome::Aborted(e);
                            CompileState::Cleanup
                        }
                    }
                }
                CompileState::VerifyOutput => {
                    let pdf = job.output_path("pdf");
                    if pdf.exists() {
                        info!("✅ PDF生成成功: {}", pdf.display());
                        artifact = pdf;
                        outcome = CompileOutcome::Compiled;
                    } else {
                        warn!("❌ 编译后未找到PDF文件，返回LaTeX源文件");
                    }
                    CompileState::Cleanup
                }
                CompileState::Cleanup => {
                    cleanup_auxiliary_files(&job.dir, &job.stem, &self.config.auxiliary_extensions);
                    CompileState::Done
                }
                CompileState::Done => CompileState::Done,
            };
        }

        CompileReport {
            artifact,
            outcome,
            visited,
        }
    }

    /// 尽力安装编译器，任一命令失败即返回false
    async fn install_tool(&self, working_dir: &Path) -> bool {
        if !self.config.auto_install {
            info!("💡 已禁用自动安装，跳过");
            return false;
        }

        for command in &self.config.install_commands {
            let Some((program, args)) = command.split_first() else {
                continue;
            };
            let spec = CommandSpec {
                program: program.clone(),
                args: args.to_vec(),
                working_dir: working_dir.to_path_buf(),
                timeout: None,
            };
            debug!("🔧 执行安装命令: {}", spec.display());

            match self.runner.run(&spec).await {
                Ok(output) if output.success => {}
                Ok(output) => {
                    warn!(
                        "⚠️ 安装命令返回非零状态码 {:?}: {}",
                        output.code,
                        spec.display()
                    );
                    return false;
                }
                Err(e) => {
                    warn!("⚠️ 安装命令执行失败: {}", e);
                    return false;
                }
            }
        }
        true
    }

    /// 执行一遍编译；非零退出只记录日志
    async fn run_pass(&self, job: &CompileJob, pass: u8) -> Result<(), CompileError> {
        let seconds = self.config.timeout_seconds;
        let spec = CommandSpec {
            program: self.config.program.clone(),
            args: vec![
                "-interaction=nonstopmode".to_string(),
                format!("-output-directory={}", job.dir.display()),
                job.file_name.clone(),
            ],
            working_dir: job.dir.clone(),
            timeout: Some(Duration::from_secs(seconds)),
        };
        info!("🔧 第{}遍编译: {}", pass, job.file_name);

        match self.runner.run(&spec).await {
            Ok(output) => {
                if !output.success {
                    let excerpt: String = output.stderr.chars().take(200).collect();
                    warn!("⚠️ 第{}遍编译存在警告或错误: {}", pass, excerpt);
                }
                Ok(())
            }
            Err(RunError::Timeout { seconds, .. }) => Err(CompileError::Timeout { pass, seconds }),
            Err(RunError::Launch { message, .. }) => Err(CompileError::Launch { pass, message }),
        }
    }
}

/// 一次编译涉及的路径
struct CompileJob {
    dir: PathBuf,
    stem: String,
    file_name: String,
}

impl CompileJob {
    fn new(source: &Path) -> Self {
        let dir = match source.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dir = std::path::absolute(&dir).unwrap_or(dir);

        Self {
            dir,
            stem: source
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            file_name: source
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
        }
    }

    fn output_path(&self, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.stem, extension))
    }

    /// 删除上次运行遗留的PDF，使VerifyOutput只认本次产物
    fn remove_stale_output(&self) {
        let pdf = self.output_path("pdf");
        match std::fs::remove_file(&pdf) {
            Ok(()) => debug!("删除旧的PDF: {}", pdf.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("⚠️ 无法删除旧的PDF {}: {}", pdf.display(), e),
        }
    }
}

/// 删除 `<dir>/<stem>.<ext>` 辅助文件，忽略所有错误；返回实际删除的数量
pub fn cleanup_auxiliary_files(dir: &Path, stem: &str, extensions: &[String]) -> usize {
    let mut removed = 0;
    for extension in extensions {
        let path = dir.join(format!("{}.{}", stem, extension.trim_start_matches('.')));
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!("清理辅助文件失败 {}: {}", path.display(), e),
        }
    }
    removed
}
