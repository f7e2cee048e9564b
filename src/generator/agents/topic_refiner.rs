use crate::generator::parser::{TopicRefinement, parse_topic_response};
use crate::generator::stage_agent::{PromptTemplate, StageAgent, pass_through};
use crate::generator::types::{Stage, StageError};
use crate::llm::gateway::GatewayError;

pub struct TopicInput {
    pub topic: String,
}

/// 将宽泛主题细化为具体研究问题，并提出澄清问题
#[derive(Default)]
pub struct TopicRefiner;

impl StageAgent for TopicRefiner {
    type Input = TopicInput;
    type Output = TopicRefinement;

    fn stage(&self) -> Stage {
        Stage::Topic
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate::new(
            "You are an expert research topic refinement specialist. Given a broad research topic, help refine it into 3-5 specific, focused research questions.",
            r#"Broad Topic: {topic}

Your task:
1. Analyze the broad topic
2. Identify key areas that need research
3. Formulate 3-5 specific, answerable research questions
4. Ask 2-3 clarifying questions to better understand the user's research goals

Format your response as:
RESEARCH_QUESTIONS:
- [Question 1]
- [Question 2]
- [Question 3]
- [Question 4]
- [Question 5]

CLARIFYING_QUESTIONS:
- [Question 1]
- [Question 2]
- [Question 3]

ANALYSIS:
[Brief analysis of why these questions are important and how they relate to the topic]"#,
        )
    }

    fn bindings(&self, input: &TopicInput) -> Vec<(&'static str, String)> {
        vec![("topic", input.topic.clone())]
    }

    fn interpret(
        &self,
        _input: &TopicInput,
        completion: Result<String, GatewayError>,
    ) -> Result<TopicRefinement, StageError> {
        let text = pass_through(self.stage(), completion)?;
        Ok(parse_topic_response(&text))
    }
}
