use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::info;

use super::TimingScope;
use crate::config::Config;
use crate::generator::agents::{
    DraftOutcome, DraftingInput, DraftingWriter, LiteratureInput, LiteratureScout,
    MethodologyDesigner, MethodologyInput, PolishEditor, PolishInput, PolishOutcome, TopicInput,
    TopicRefiner,
};
use crate::generator::compiler::{ArtifactCompiler, CompileReport};
use crate::generator::context::{CANDIDATE_PAPER_COUNT, Paper, ResearchContext, flatten_pairs};
use crate::generator::outlet::save_document;
use crate::generator::parser::TopicRefinement;
use crate::generator::stage_agent::{StageAgent, execute};
use crate::generator::types::{Stage, StageError};
use crate::llm::gateway::CompletionGateway;

/// 发布结果
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// 已保存的LaTeX源文件
    pub source: PathBuf,
    /// 未请求编译时为None
    pub compile: Option<CompileReport>,
}

impl PublishReport {
    /// PDF路径，未编译或编译退化时为源文件路径
    pub fn artifact(&self) -> &Path {
        self.compile
            .as_ref()
            .map(|report| report.artifact.as_path())
            .unwrap_or(self.source.as_path())
    }
}

/// 一次研究工作流会话
///
/// 独占持有研究上下文并按顺序执行各阶段。阶段失败时上下文保持不变，
/// 调用方可以用相同输入重试。重新执行某阶段会使其下游阶段失效。
pub struct ResearchSession {
    gateway: Arc<dyn CompletionGateway>,
    compiler: ArtifactCompiler,
    output_dir: PathBuf,
    context: ResearchContext,
    completed: BTreeSet<Stage>,
    papers_selected: bool,
    timing: TimingScope,
}

impl ResearchSession {
    pub fn new(
        gateway: Arc<dyn CompletionGateway>,
        compiler: ArtifactCompiler,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            gateway,
            compiler,
            output_dir: output_dir.into(),
            context: ResearchContext::new(),
            completed: BTreeSet::new(),
            papers_selected: false,
            timing: TimingScope::new(),
        }
    }

    /// 按配置创建会话，编译器使用系统后端
    pub fn from_config(config: &Config, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self::new(
            gateway,
            ArtifactCompiler::new(config.compiler.clone()),
            config.output_dir.clone(),
        )
    }

    pub fn context(&self) -> &ResearchContext {
        &self.context
    }

    pub fn is_completed(&self, stage: Stage) -> bool {
        self.completed.contains(&stage)
    }

    pub fn completed_stages(&self) -> Vec<Stage> {
        self.completed.iter().copied().collect()
    }

    pub fn timing(&self) -> &TimingScope {
        &self.timing
    }

    /// 步骤1：主题细化
    pub async fn refine_topic(&mut self, topic: &str) -> Result<TopicRefinement, StageError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(StageError::input(Stage::Topic, "no topic provided"));
        }

        let input = TopicInput {
            topic: topic.to_string(),
        };
        let refinement = self.run(&TopicRefiner, &input).await?;
        info!(
            "✅ 生成了 {} 个研究问题，{} 个澄清问题",
            refinement.research_questions.len(),
            refinement.clarifying_questions.len()
        );

        self.context.topic = input.topic;
        self.context.research_questions = refinement.research_questions.clone();
        self.mark_completed(Stage::Topic);
        Ok(refinement)
    }

    /// 步骤2：文献推荐，澄清回答作为用户偏好
    pub async fn suggest_literature(
        &mut self,
        clarifying_answers: &BTreeMap<String, String>,
    ) -> Result<String, StageError> {
        self.require(Stage::Literature)?;

        let input = LiteratureInput {
            topic: self.context.topic.clone(),
            research_questions: self.context.research_questions.clone(),
            user_preferences: flatten_pairs(clarifying_answers),
        };
        let suggestions = self.run(&LiteratureScout, &input).await?;

        self.mark_completed(Stage::Literature);
        Ok(suggestions)
    }

    /// 将从0开始的下标映射到候选论文列表
    pub fn select_papers(&mut self, indices: &[usize]) -> Result<Vec<Paper>, StageError> {
        self.require(Stage::Methodology)?;
        if indices.is_empty() {
            return Err(StageError::input(Stage::Methodology, "no papers selected"));
        }

        let candidates = Paper::candidates();
        let mut selected = Vec::with_capacity(indices.len());
        for &index in indices {
            let paper = candidates.get(index).ok_or_else(|| {
                StageError::input(
                    Stage::Methodology,
                    format!(
                        "paper index {} is out of range (expected 0..{})",
                        index, CANDIDATE_PAPER_COUNT
                    ),
                )
            })?;
            selected.push(paper.clone());
        }

        info!("✅ 已选择 {} 篇论文", selected.len());
        self.context.selected_papers = selected.clone();
        self.papers_selected = true;
        Ok(selected)
    }

    /// 步骤3：方法论设计
    pub async fn design_methodology(&mut self) -> Result<String, StageError> {
        self.require(Stage::Methodology)?;
        if !self.papers_selected {
            return Err(StageError::input(
                Stage::Methodology,
                "no papers selected; select papers before designing the methodology",
            ));
        }

        let input = MethodologyInput {
            topic: self.context.topic.clone(),
            research_questions: self.context.research_questions.clone(),
            selected_papers: self.context.selected_papers.clone(),
        };
        let suggestions = self.run(&MethodologyDesigner, &input).await?;

        self.mark_completed(Stage::Methodology);
        Ok(suggestions)
    }

    /// 步骤4：生成草稿，该阶段只会因顺序不满足而失败
    pub async fn draft(
        &mut self,
        preferences: BTreeMap<String, String>,
    ) -> Result<DraftOutcome, StageError> {
        self.require(Stage::Drafting)?;

        let input = DraftingInput {
            topic: self.context.topic.clone(),
            research_questions: self.context.research_questions.clone(),
            selected_papers: self.context.selected_papers.clone(),
            methodology_summary: flatten_pairs(&preferences),
        };
        let outcome = self.run(&DraftingWriter, &input).await?;

        self.context.methodology_preferences = preferences;
        self.context.draft_text = outcome.text.clone();
        self.mark_completed(Stage::Drafting);
        Ok(outcome)
    }

    /// 步骤5：润色定稿
    pub async fn polish(&mut self) -> Result<PolishOutcome, StageError> {
        self.require(Stage::Polish)?;

        let input = PolishInput {
            draft: self.context.draft_text.clone(),
        };
        let outcome = self.run(&PolishEditor, &input).await?;

        self.context.final_text = outcome.text.clone();
        self.mark_completed(Stage::Polish);
        Ok(outcome)
    }

    /// 保存定稿，可选编译为PDF；编译失败不会导致发布失败
    pub async fn publish(&self, file_name: Option<&str>, compile: bool) -> Result<PublishReport> {
        if !self.is_completed(Stage::Polish) || self.context.final_text.is_empty() {
            bail!("No paper generated yet");
        }

        let source = save_document(&self.output_dir, file_name, &self.context.final_text)?;
        let compile = if compile {
            Some(self.compiler.compile(&source).await)
        } else {
            None
        };

        Ok(PublishReport { source, compile })
    }

    async fn run<A: StageAgent>(
        &mut self,
        agent: &A,
        input: &A::Input,
    ) -> Result<A::Output, StageError> {
        let stage = agent.stage();
        self.timing.start_phase(stage);
        let result = execute(agent, self.gateway.as_ref(), input).await;
        self.timing.end_phase(stage);
        result
    }

    fn require(&self, stage: Stage) -> Result<(), StageError> {
        match stage.upstream() {
            Some(upstream) if !self.completed.contains(&upstream) => Err(StageError::input(
                stage,
                format!("the {} stage has not completed", upstream),
            )),
            _ => Ok(()),
        }
    }

    fn mark_completed(&mut self, stage: Stage) {
        self.completed.retain(|done| *done < stage);
        self.completed.insert(stage);
        if stage <= Stage::Literature {
            self.papers_selected = false;
        }
    }
}
