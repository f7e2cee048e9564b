use crate::generator::stage_agent::{PromptTemplate, StageAgent, bullet_lines, pass_through};
use crate::generator::types::{Stage, StageError};
use crate::llm::gateway::GatewayError;

pub struct LiteratureInput {
    pub topic: String,
    pub research_questions: Vec<String>,
    /// 澄清问题的回答，已展开为 `key: value` 文本
    pub user_preferences: String,
}

/// 根据研究问题推荐相关论文
#[derive(Default)]
pub struct LiteratureScout;

impl StageAgent for LiteratureScout {
    type Input = LiteratureInput;
    type Output = String;

    fn stage(&self) -> Stage {
        Stage::Literature
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate::new(
            "You are an expert literature review specialist. Based on the research questions and topic, suggest relevant papers and provide summaries.",
            r#"Topic: {topic}
Research Questions:
{research_questions}
User Preferences: {user_preferences}

Your task:
1. Identify 5-8 highly relevant papers
2. Provide brief summaries (2-3 sentences each)
3. Explain why each paper is relevant
4. Ask the user which papers they want to focus on

Format your response as:
PAPER_SUGGESTIONS:
Paper 1: [Title]
Authors: [Authors]
Summary: [Brief summary]
Relevance: [Why it's relevant]

Paper 2: [Title]
Authors: [Authors]
Summary: [Brief summary]
Relevance: [Why it's relevant]

[Continue for all papers...]

SELECTION_GUIDE:
[Ask user to select 3-5 papers they want to focus on, explaining the selection criteria]"#,
        )
    }

    fn bindings(&self, input: &LiteratureInput) -> Vec<(&'static str, String)> {
        vec![
            ("topic", input.topic.clone()),
            ("research_questions", bullet_lines(&input.research_questions)),
            ("user_preferences", input.user_preferences.clone()),
        ]
    }

    fn interpret(
        &self,
        _input: &LiteratureInput,
        completion: Result<String, GatewayError>,
    ) -> Result<String, StageError> {
        pass_through(self.stage(), completion)
    }
}
