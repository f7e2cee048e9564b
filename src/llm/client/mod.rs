//! LLM客户端 - 基于rig的补全网关实现

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LLMConfig;
use crate::llm::gateway::{CompletionGateway, GatewayError};

mod providers;

use providers::ProviderClient;

/// 所有阶段共用的系统提示词，具体角色由各阶段模板给出
const SYSTEM_PREAMBLE: &str =
    "You are a meticulous academic research assistant. Follow the requested output format exactly.";

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionGateway for LLMClient {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        let agent = self
            .client
            .create_agent(SYSTEM_PREAMBLE, &self.config)
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let seconds = self.config.timeout_seconds;
        debug!(
            provider = %agent.provider(),
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "📡 调用模型服务"
        );

        match tokio::time::timeout(Duration::from_secs(seconds), agent.prompt(prompt)).await {
            Ok(Ok(completion)) => Ok(completion),
            Ok(Err(e)) => {
                warn!("❌ 调用模型服务出错: {}", e);
                Err(GatewayError::Transport(e.to_string()))
            }
            Err(_) => {
                warn!("⏱️ 调用模型服务超时 ({}秒)", seconds);
                Err(GatewayError::Timeout { seconds })
            }
        }
    }
}
