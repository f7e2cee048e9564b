use crate::generator::context::Paper;
use crate::generator::stage_agent::{PromptTemplate, StageAgent, bullet_lines, pass_through};
use crate::generator::types::{Stage, StageError};
use crate::llm::gateway::GatewayError;

/// 方法论偏好问题，回答以 `pref_1`..`pref_5` 为键
pub const PREFERENCE_QUESTIONS: [&str; 5] = [
    "What is your preferred experiment scale? (small/medium/large)",
    "What type of experiments do you prefer? (empirical/theoretical/hybrid)",
    "What are your computational resource constraints?",
    "Do you have access to specific datasets?",
    "What is your timeline for experiments?",
];

/// 第`index`个（从0开始）偏好问题的键
pub fn preference_key(index: usize) -> String {
    format!("pref_{}", index + 1)
}

pub struct MethodologyInput {
    pub topic: String,
    pub research_questions: Vec<String>,
    pub selected_papers: Vec<Paper>,
}

/// 推荐数据集、评估指标与实验设计
#[derive(Default)]
pub struct MethodologyDesigner;

impl StageAgent for MethodologyDesigner {
    type Input = MethodologyInput;
    type Output = String;

    fn stage(&self) -> Stage {
        Stage::Methodology
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate::new(
            "You are an expert research methodology specialist. Based on the research questions and selected papers, suggest appropriate methodologies.",
            r#"Topic: {topic}
Research Questions:
{research_questions}
Selected Papers:
{selected_papers}

Your task:
1. Suggest appropriate datasets for this research
2. Recommend evaluation metrics
3. Propose experimental design
4. Ask about user preferences for scale and type of experiments

Format your response as:
DATASET_SUGGESTIONS:
- [Dataset 1]: [Description and why it's suitable]
- [Dataset 2]: [Description and why it's suitable]

EVALUATION_METRICS:
- [Metric 1]: [Description and importance]
- [Metric 2]: [Description and importance]

EXPERIMENTAL_DESIGN:
[Detailed experimental design proposal]

USER_PREFERENCES_QUESTIONS:
- [Question about experiment scale]
- [Question about experiment type]
- [Question about computational resources]"#,
        )
    }

    fn bindings(&self, input: &MethodologyInput) -> Vec<(&'static str, String)> {
        let titles: Vec<&str> = input
            .selected_papers
            .iter()
            .map(|paper| paper.title.as_str())
            .collect();

        vec![
            ("topic", input.topic.clone()),
            ("research_questions", bullet_lines(&input.research_questions)),
            ("selected_papers", bullet_lines(&titles)),
        ]
    }

    fn interpret(
        &self,
        _input: &MethodologyInput,
        completion: Result<String, GatewayError>,
    ) -> Result<String, StageError> {
        pass_through(self.stage(), completion)
    }
}
