use crate::config::Config;
use crate::generator::context::Paper;
use crate::generator::types::{Stage, StageError};
use crate::llm::LLMClient;

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

pub mod response;
pub mod session;

pub use response::StageResponse;
pub use session::{PublishReport, ResearchSession};

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<Stage, Instant>,
    phase_durations: BTreeMap<Stage, Duration>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: BTreeMap::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, stage: Stage) {
        self.phase_start_times.insert(stage, Instant::now());
    }

    /// 结束一个阶段的计时，重复执行的阶段累加耗时
    pub fn end_phase(&mut self, stage: Stage) -> Option<Duration> {
        let duration = self.phase_start_times.remove(&stage)?.elapsed();
        *self.phase_durations.entry(stage).or_default() += duration;
        Some(duration)
    }

    /// 获取总执行时间
    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 获取所有阶段的执行时间
    pub fn get_phase_durations(&self) -> &BTreeMap<Stage, Duration> {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.get_total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for (stage, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", stage, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 工作流中需要研究者参与的决策
pub trait Researcher {
    /// 回答澄清问题，键为 `q1`, `q2`, ...
    fn answer_clarifying_questions(&self, questions: &[String]) -> Result<BTreeMap<String, String>>;

    /// 阅读文献推荐后选择论文，返回从0开始的候选下标
    fn select_papers(&self, suggestions: &str, candidates: &[Paper]) -> Result<Vec<usize>>;

    /// 阅读方法论建议后回答偏好问题，键为 `pref_1` .. `pref_5`
    fn methodology_preferences(&self, suggestions: &str) -> Result<BTreeMap<String, String>>;
}

/// 第`index`个（从0开始）澄清问题的回答键
pub fn clarifying_key(index: usize) -> String {
    format!("q{}", index + 1)
}

/// 完成后的建议操作
pub fn next_steps(report: &PublishReport) -> Vec<String> {
    vec![
        format!("Review the generated LaTeX file: {}", report.source.display()),
        "Replace placeholders with your actual research results".to_string(),
        "Add your experimental data and findings".to_string(),
        format!("Compile to PDF: pdflatex {}", report.source.display()),
    ]
}

/// 启动研究工作流
pub async fn launch(config: &Config, topic: &str, researcher: &dyn Researcher) -> Result<PublishReport> {
    let client = LLMClient::new(config.llm.clone()).context("无法创建LLM客户端")?;
    let mut session = ResearchSession::from_config(config, Arc::new(client));

    run_workflow(
        &mut session,
        topic,
        researcher,
        config.file_name.as_deref(),
        config.compile,
    )
    .await
}

/// 依次执行全部阶段并发布结果
pub async fn run_workflow(
    session: &mut ResearchSession,
    topic: &str,
    researcher: &dyn Researcher,
    file_name: Option<&str>,
    compile: bool,
) -> Result<PublishReport> {
    info!("🎯 开始研究工作流: {}", topic.trim());

    info!("📋 步骤1: 主题细化");
    let refinement = session.refine_topic(topic).await.map_err(timeout_hint)?;
    for (i, question) in refinement.research_questions.iter().enumerate() {
        info!("   {}. {}", i + 1, question);
    }

    let answers = if refinement.clarifying_questions.is_empty() {
        BTreeMap::new()
    } else {
        researcher.answer_clarifying_questions(&refinement.clarifying_questions)?
    };

    info!("📚 步骤2: 文献推荐");
    let suggestions = session.suggest_literature(&answers).await.map_err(timeout_hint)?;
    let indices = researcher.select_papers(&suggestions, &Paper::candidates())?;
    session.select_papers(&indices)?;

    info!("🔬 步骤3: 方法论设计");
    let methodology = session.design_methodology().await.map_err(timeout_hint)?;
    let preferences = researcher.methodology_preferences(&methodology)?;

    info!("✍️ 步骤4: 草稿生成");
    let draft = session.draft(preferences).await?;
    if draft.is_synthesized() {
        info!("📝 草稿由内置模板生成");
    }

    info!("✨ 步骤5: 润色定稿");
    session.polish().await.map_err(timeout_hint)?;

    let report = session.publish(file_name, compile).await?;
    info!("⏱️ {}", session.timing().generate_timing_report());
    info!("🎉 研究工作流完成: {}", report.artifact().display());

    Ok(report)
}

/// 超时失败附带调整时限的提示
fn timeout_hint(error: StageError) -> anyhow::Error {
    if error.is_timeout() {
        anyhow::Error::new(error).context("模型调用超时，可通过 --llm-timeout 延长时限")
    } else {
        error.into()
    }
}

// Include tests
#[cfg(test)]
mod tests;
