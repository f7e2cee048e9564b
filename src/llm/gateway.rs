//! 补全网关 - 文本生成服务的抽象边界
//!
//! 各阶段Agent只依赖该trait：输入渲染后的prompt，输出补全文本。
//! 传输失败与超时必须可区分，且都区别于"成功但为空"的补全。

use async_trait::async_trait;
use thiserror::Error;

/// 网关调用失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// 网络或服务端错误
    #[error("transport error: {0}")]
    Transport(String),

    /// 调用超过了配置的时限
    #[error("completion timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout { .. })
    }
}

/// 文本补全网关
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// 发送一次补全请求，不做任何重试
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError>;
}
