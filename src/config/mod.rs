use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "research-copilot.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "moonshot")]
    Moonshot,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    #[default]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Moonshot => write!(f, "moonshot"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Mistral => write!(f, "mistral"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "moonshot" => Ok(LLMProvider::Moonshot),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "mistral" => Ok(LLMProvider::Mistral),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 论文输出目录
    pub output_dir: PathBuf,

    /// 输出文件名，未指定时使用带时间戳的默认文件名
    pub file_name: Option<String>,

    /// 保存后是否尝试编译为PDF
    pub compile: bool,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 文档编译器配置
    pub compiler: CompilerConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 模型名称
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 单次调用超时时间（秒）
    pub timeout_seconds: u64,
}

/// 文档编译器配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CompilerConfig {
    /// 编译器可执行文件
    pub program: String,

    /// 每一遍编译的超时时间（秒）
    pub timeout_seconds: u64,

    /// 编译器缺失时是否尝试自动安装
    pub auto_install: bool,

    /// 安装命令序列，按顺序执行，任一失败即停止
    pub install_commands: Vec<Vec<String>>,

    /// 编译结束后需要清理的辅助文件扩展名
    pub auxiliary_extensions: Vec<String>,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 日志默认级别，`RUST_LOG` 优先
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// 从当前目录的默认配置文件加载，不存在时使用默认配置
    pub fn discover() -> Result<Self> {
        let default_config_path = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE);

        if default_config_path.exists() {
            Self::from_file(&default_config_path)
        } else {
            Ok(Self::default())
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_name: None,
            compile: true,
            llm: LLMConfig::default(),
            compiler: CompilerConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("RESEARCH_COPILOT_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://generativelanguage.googleapis.com"),
            model: String::from("gemini-1.5-flash"),
            max_tokens: 8192,
            temperature: 0.7,
            timeout_seconds: 300,
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: String::from("pdflatex"),
            timeout_seconds: 60,
            auto_install: true,
            install_commands: vec![
                vec!["sudo".to_string(), "-n".to_string(), "apt".to_string(), "update".to_string()],
                vec![
                    "sudo".to_string(),
                    "-n".to_string(),
                    "apt".to_string(),
                    "install".to_string(),
                    "-y".to_string(),
                    "texlive-full".to_string(),
                ],
            ],
            auxiliary_extensions: ["aux", "log", "out", "toc", "lof", "lot"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}
