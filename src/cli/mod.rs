use crate::config::{Config, LLMProvider};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;

mod researcher;

pub use researcher::CliResearcher;

/// Research Co-Pilot - 从宽泛主题逐步生成结构化的LaTeX学术论文
#[derive(Parser, Debug)]
#[command(name = "research-copilot")]
#[command(
    about = "AI research assistant that refines a broad topic into research questions, suggests literature and methodology, and drafts a LaTeX paper."
)]
#[command(version)]
pub struct Args {
    /// 宽泛的研究主题，未提供时交互式输入
    pub topic: Option<String>,

    /// 澄清问题的回答，按问题顺序重复传入
    #[arg(long = "answer", value_name = "TEXT")]
    pub answers: Vec<String>,

    /// 选择的论文编号，从1开始，以逗号分隔（如 1,3,5）
    #[arg(long, value_name = "LIST")]
    pub select: Option<String>,

    /// 方法论偏好问题的回答，按问题顺序重复传入
    #[arg(long = "preference", value_name = "TEXT")]
    pub preferences: Vec<String>,

    /// 不进行任何交互，未提供的回答留空
    #[arg(long)]
    pub no_input: bool,

    /// 输出目录
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// 输出文件名
    #[arg(short, long)]
    pub file_name: Option<String>,

    /// 跳过PDF编译
    #[arg(long)]
    pub no_compile: bool,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// LLM Provider (openai, mistral, openrouter, anthropic, deepseek, moonshot, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 模型名称
    #[arg(short, long)]
    pub model: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 单次模型调用超时时间（秒）
    #[arg(long)]
    pub llm_timeout: Option<u64>,

    /// 每遍编译的超时时间（秒）
    #[arg(long)]
    pub compile_timeout: Option<u64>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 根据参数构建研究者交互实现
    pub fn researcher(&self) -> Result<CliResearcher> {
        let selection = self
            .select
            .as_deref()
            .map(parse_selection)
            .transpose()
            .context("无效的论文选择")?;

        Ok(CliResearcher {
            answers: self.answers.clone(),
            selection,
            preferences: self.preferences.clone(),
            interactive: !self.no_input,
        })
    }

    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(config_path) => Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path))?,
            None => Config::discover()?,
        };

        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(file_name) = self.file_name {
            config.file_name = Some(file_name);
        }
        if self.no_compile {
            config.compile = false;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!("⚠️ 警告: 未知的provider: {}，使用 {}", provider_str, config.llm.provider);
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(seconds) = self.llm_timeout {
            config.llm.timeout_seconds = seconds;
        }
        if let Some(seconds) = self.compile_timeout {
            config.compiler.timeout_seconds = seconds;
        }

        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}

/// 解析从1开始、逗号分隔的论文编号，返回从0开始的下标
pub fn parse_selection(input: &str) -> Result<Vec<usize>> {
    let mut indices = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let number: usize = part
            .parse()
            .with_context(|| format!("`{}` is not a paper number", part))?;
        if number == 0 {
            bail!("paper numbers start at 1");
        }
        indices.push(number - 1);
    }
    if indices.is_empty() {
        bail!("no paper numbers given");
    }
    Ok(indices)
}
