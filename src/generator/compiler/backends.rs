//! 编译器外部依赖边界：工具探测与子进程执行

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command as TokioCommand;

/// 检测可执行文件是否存在于PATH中
pub trait ToolProbe: Send + Sync {
    fn is_available(&self, program: &str) -> bool;
}

/// 基于 `which` 的PATH查找
#[derive(Debug, Default, Clone, Copy)]
pub struct PathProbe;

impl ToolProbe for PathProbe {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// 一次子进程调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// 为None时不限制执行时间
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    /// 便于日志输出的命令行
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(|a| a.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("failed to launch `{program}`: {message}")]
    Launch { program: String, message: String },

    #[error("`{program}` timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },
}

/// 子进程执行器
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError>;
}

/// 基于tokio的子进程执行器，超时后子进程随句柄一起被终止
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioRunner;

#[async_trait]
impl ProcessRunner for TokioRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError> {
        let mut cmd = TokioCommand::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let launch_error = |e: std::io::Error| RunError::Launch {
            program: spec.program.clone(),
            message: e.to_string(),
        };

        let output = match spec.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| RunError::Timeout {
                    program: spec.program.clone(),
                    seconds: limit.as_secs(),
                })?
                .map_err(launch_error)?,
            None => cmd.output().await.map_err(launch_error)?,
        };

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_rejects_unknown_program() {
        assert!(!PathProbe.is_available("definitely-not-a-real-compiler-binary"));
    }

    #[tokio::test]
    async fn test_runner_reports_launch_failure() {
        let spec = CommandSpec {
            program: "definitely-not-a-real-compiler-binary".to_string(),
            args: vec![],
            working_dir: PathBuf::from("."),
            timeout: Some(Duration::from_secs(5)),
        };

        let err = TokioRunner.run(&spec).await.unwrap_err();
        assert!(matches!(err, RunError::Launch { .. }));
    }

    #[test]
    fn test_command_display() {
        let spec = CommandSpec {
            program: "pdflatex".to_string(),
            args: vec!["-interaction=nonstopmode".to_string(), "paper.tex".to_string()],
            working_dir: PathBuf::from("."),
            timeout: None,
        };
        assert_eq!(spec.display(), "pdflatex -interaction=nonstopmode paper.tex");
    }
}
