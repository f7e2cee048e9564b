//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::Prompt,
    providers::gemini::completion::gemini_api_types::{AdditionalParameters, GenerationConfig},
};

use crate::config::{LLMConfig, LLMProvider};

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    Moonshot(rig::providers::moonshot::Client),
    DeepSeek(rig::providers::deepseek::Client),
    Mistral(rig::providers::mistral::Client),
    OpenRouter(rig::providers::openrouter::Client),
    Anthropic(rig::providers::anthropic::Client),
    Gemini(rig::providers::gemini::Client),
    Ollama(rig::providers::ollama::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        match config.provider {
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
            LLMProvider::Moonshot => {
                let client = rig::providers::moonshot::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::Moonshot(client))
            }
            LLMProvider::DeepSeek => {
                let client = rig::providers::deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::DeepSeek(client))
            }
            LLMProvider::Mistral => {
                let client = rig::providers::mistral::Client::builder(&config.api_key).build();
                Ok(ProviderClient::Mistral(client))
            }
            LLMProvider::OpenRouter => {
                let client = rig::providers::openrouter::Client::builder(&config.api_key).build();
                Ok(ProviderClient::OpenRouter(client))
            }
            LLMProvider::Anthropic => {
                let client =
                    rig::providers::anthropic::ClientBuilder::new(&config.api_key).build()?;
                Ok(ProviderClient::Anthropic(client))
            }
            LLMProvider::Gemini => {
                let client = rig::providers::gemini::Client::builder(&config.api_key).build()?;
                Ok(ProviderClient::Gemini(client))
            }
            LLMProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                Ok(ProviderClient::Ollama(client))
            }
        }
    }

    /// 创建单轮对话Agent，所有provider共用同一组生成参数
    pub fn create_agent(&self, system_prompt: &str, config: &LLMConfig) -> Result<ProviderAgent> {
        macro_rules! single_turn {
            ($builder:expr) => {
                $builder
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(config.temperature)
            };
        }

        let model = config.model.as_str();
        let agent = match self {
            ProviderClient::OpenAI(client) => ProviderAgent::OpenAI(
                single_turn!(client.completion_model(model).completions_api().into_agent_builder())
                    .build(),
            ),
            ProviderClient::Moonshot(client) => {
                ProviderAgent::Moonshot(single_turn!(client.agent(model)).build())
            }
            ProviderClient::DeepSeek(client) => {
                ProviderAgent::DeepSeek(single_turn!(client.agent(model)).build())
            }
            ProviderClient::Mistral(client) => {
                ProviderAgent::Mistral(single_turn!(client.agent(model)).build())
            }
            ProviderClient::OpenRouter(client) => {
                ProviderAgent::OpenRouter(single_turn!(client.agent(model)).build())
            }
            ProviderClient::Anthropic(client) => {
                ProviderAgent::Anthropic(single_turn!(client.agent(model)).build())
            }
            ProviderClient::Gemini(client) => {
                let params = AdditionalParameters::default().with_config(GenerationConfig::default());
                ProviderAgent::Gemini(
                    single_turn!(client.agent(model))
                        .additional_params(serde_json::to_value(params)?)
                        .build(),
                )
            }
            ProviderClient::Ollama(client) => {
                ProviderAgent::Ollama(single_turn!(client.agent(model)).build())
            }
        };
        Ok(agent)
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    Mistral(Agent<rig::providers::mistral::CompletionModel>),
    OpenRouter(Agent<rig::providers::openrouter::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    Gemini(Agent<rig::providers::gemini::completion::CompletionModel>),
    Moonshot(Agent<rig::providers::moonshot::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    /// 发送单轮prompt，不保留对话历史
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        macro_rules! send {
            ($this:expr; $($variant:ident),+) => {
                match $this {
                    $(ProviderAgent::$variant(agent) => Ok(agent.prompt(prompt).await?),)+
                }
            };
        }

        send!(self; OpenAI, Moonshot, DeepSeek, Mistral, OpenRouter, Anthropic, Gemini, Ollama)
    }

    pub fn provider(&self) -> LLMProvider {
        match self {
            ProviderAgent::OpenAI(_) => LLMProvider::OpenAI,
            ProviderAgent::Moonshot(_) => LLMProvider::Moonshot,
            ProviderAgent::DeepSeek(_) => LLMProvider::DeepSeek,
            ProviderAgent::Mistral(_) => LLMProvider::Mistral,
            ProviderAgent::OpenRouter(_) => LLMProvider::OpenRouter,
            ProviderAgent::Anthropic(_) => LLMProvider::Anthropic,
            ProviderAgent::Gemini(_) => LLMProvider::Gemini,
            ProviderAgent::Ollama(_) => LLMProvider::Ollama,
        }
    }
}
