use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::generator::context::Paper;
use crate::generator::stage_agent::{PromptTemplate, StageAgent, bullet_lines};
use crate::generator::synthesizer::{DOCUMENT_MARKER, synthesize_document};
use crate::generator::types::{Stage, StageError};
use crate::llm::gateway::GatewayError;

pub struct DraftingInput {
    pub topic: String,
    pub research_questions: Vec<String>,
    pub selected_papers: Vec<Paper>,
    /// 方法论偏好展开后的摘要
    pub methodology_summary: String,
}

/// 通过结构校验的草稿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDraft(String);

impl ValidatedDraft {
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// 生成内容被弃用的原因
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DraftRejection {
    #[error("completion does not start with the document marker")]
    MissingDocumentMarker,

    #[error("completion request failed: {0}")]
    Upstream(String),
}

/// 草稿来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftSource {
    Generated,
    Synthesized { rejection: DraftRejection },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOutcome {
    pub text: String,
    pub source: DraftSource,
}

impl DraftOutcome {
    pub fn is_synthesized(&self) -> bool {
        matches!(self.source, DraftSource::Synthesized { .. })
    }
}

/// 校验补全文本：去除首尾空白后必须以文档起始标记开头
pub fn validate_draft(
    completion: Result<String, GatewayError>,
) -> Result<ValidatedDraft, DraftRejection> {
    let text = completion.map_err(|e| DraftRejection::Upstream(e.to_string()))?;
    let trimmed = text.trim();
    if trimmed.starts_with(DOCUMENT_MARKER) {
        Ok(ValidatedDraft(trimmed.to_string()))
    } else {
        Err(DraftRejection::MissingDocumentMarker)
    }
}

/// 生成LaTeX论文草稿，校验失败时由合成器兜底
#[derive(Default)]
pub struct DraftingWriter;

impl DraftingWriter {
    /// 合成器输出，是所有校验失败的唯一恢复路径
    pub fn synthesize(&self, input: &DraftingInput) -> String {
        synthesize_document(
            &input.topic,
            &input.research_questions,
            &input.selected_papers,
            &input.methodology_summary,
        )
    }
}

impl StageAgent for DraftingWriter {
    type Input = DraftingInput;
    type Output = DraftOutcome;

    fn stage(&self) -> Stage {
        Stage::Drafting
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate::new(
            r#"You are an expert academic writer specializing in LaTeX document preparation.
Create a comprehensive LaTeX research paper skeleton for the given topic and methodology.

The LaTeX document should include:
1. Proper document class and packages for academic papers
2. Title, author, abstract, and keywords
3. Well-structured sections with proper LaTeX commands
4. Placeholder content that guides the researcher
5. Professional academic formatting
6. Proper citation formatting
7. References section structure

Use proper LaTeX syntax and academic paper structure. Respond with the LaTeX source only, starting with \documentclass."#,
            r#"Topic: {topic}
Research Questions:
{research_questions}
Selected Papers:
{selected_papers}
Methodology: {methodology}

Create a complete LaTeX research paper skeleton with proper academic structure."#,
        )
    }

    fn bindings(&self, input: &DraftingInput) -> Vec<(&'static str, String)> {
        let papers: Vec<String> = input
            .selected_papers
            .iter()
            .map(|paper| format!("{} ({}): {}", paper.title, paper.authors, paper.summary))
            .collect();

        vec![
            ("topic", input.topic.clone()),
            ("research_questions", bullet_lines(&input.research_questions)),
            ("selected_papers", bullet_lines(&papers)),
            ("methodology", input.methodology_summary.clone()),
        ]
    }

    /// 该阶段永远不会失败
    fn interpret(
        &self,
        input: &DraftingInput,
        completion: Result<String, GatewayError>,
    ) -> Result<DraftOutcome, StageError> {
        let outcome = match validate_draft(completion) {
            Ok(draft) => {
                info!("✅ 已采用模型生成的LaTeX草稿");
                DraftOutcome {
                    text: draft.into_inner(),
                    source: DraftSource::Generated,
                }
            }
            Err(rejection) => {
                warn!("⚠️ 生成的草稿未通过校验 ({})，使用合成器兜底", rejection);
                DraftOutcome {
                    text: self.synthesize(input),
                    source: DraftSource::Synthesized { rejection },
                }
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> DraftingInput {
        DraftingInput {
            topic: "reinforcement learning".to_string(),
            research_questions: vec!["Q1".to_string(), "Q2".to_string()],
            selected_papers: Paper::candidates()[..3].to_vec(),
            methodology_summary: "pref_1: small".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_marker_after_whitespace() {
        let draft = validate_draft(Ok("\n  \\documentclass{article}\nbody\n\n".to_string())).unwrap();
        assert_eq!(draft.into_inner(), "\\documentclass{article}\nbody");
    }

    #[test]
    fn test_validate_rejects_missing_marker() {
        assert_eq!(
            validate_draft(Ok("```latex\n\\documentclass{article}```".to_string())),
            Err(DraftRejection::MissingDocumentMarker)
        );
        assert_eq!(
            validate_draft(Ok(String::new())),
            Err(DraftRejection::MissingDocumentMarker)
        );
    }

    #[test]
    fn test_validate_rejects_gateway_failure() {
        let rejection = validate_draft(Err(GatewayError::Transport("boom".to_string()))).unwrap_err();
        assert!(matches!(rejection, DraftRejection::Upstream(ref msg) if msg.contains("boom")));
    }

    #[test]
    fn test_interpret_falls_back_to_synthesizer() {
        let writer = DraftingWriter;
        let input = input();

        let outcome = writer
            .interpret(&input, Ok("Sure! Here is your paper.".to_string()))
            .unwrap();

        assert!(outcome.is_synthesized());
        assert_eq!(outcome.text, writer.synthesize(&input));
    }

    #[test]
    fn test_interpret_gateway_failure_never_errors() {
        let writer = DraftingWriter;
        let input = input();

        let outcome = writer
            .interpret(&input, Err(GatewayError::Timeout { seconds: 1 }))
            .unwrap();

        assert_eq!(outcome.text, writer.synthesize(&input));
        assert!(matches!(
            outcome.source,
            DraftSource::Synthesized {
                rejection: DraftRejection::Upstream(_)
            }
        ));
    }

    #[test]
    fn test_interpret_keeps_valid_generation() {
        let writer = DraftingWriter;
        let outcome = writer
            .interpret(&input(), Ok("\\documentclass{article}\n".to_string()))
            .unwrap();

        assert_eq!(outcome.source, DraftSource::Generated);
        assert_eq!(outcome.text, "\\documentclass{article}");
    }

    #[test]
    fn test_prompt_carries_all_inputs() {
        let prompt = DraftingWriter.render_prompt(&input());

        assert!(prompt.contains("Topic: reinforcement learning"));
        assert!(prompt.contains("- Q1\n- Q2"));
        assert!(prompt.contains("- Relevant Paper 1 (Author 1): Summary 1"));
        assert!(prompt.contains("Methodology: pref_1: small"));
    }
}
