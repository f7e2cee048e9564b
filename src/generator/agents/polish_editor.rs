use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::generator::stage_agent::{PromptTemplate, StageAgent, pass_through};
use crate::generator::synthesizer::{DOCUMENT_MARKER, PLACEHOLDER_MARKER};
use crate::generator::types::{Stage, StageError};
use crate::llm::gateway::GatewayError;

pub struct PolishInput {
    pub draft: String,
}

/// 润色结果的结构审计
///
/// 润色结果总是原样采用，审计只用于告警，不会触发回退。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolishAudit {
    pub has_document_marker: bool,
    pub placeholders_before: usize,
    pub placeholders_after: usize,
}

impl PolishAudit {
    pub fn inspect(draft: &str, polished: &str) -> Self {
        Self {
            has_document_marker: polished.trim_start().starts_with(DOCUMENT_MARKER),
            placeholders_before: draft.matches(PLACEHOLDER_MARKER).count(),
            placeholders_after: polished.matches(PLACEHOLDER_MARKER).count(),
        }
    }

    pub fn placeholders_preserved(&self) -> bool {
        self.placeholders_after >= self.placeholders_before
    }

    pub fn is_intact(&self) -> bool {
        self.has_document_marker && self.placeholders_preserved()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolishOutcome {
    pub text: String,
    pub audit: PolishAudit,
}

/// 以正式学术语气润色草稿并规范参考文献格式
#[derive(Default)]
pub struct PolishEditor;

impl StageAgent for PolishEditor {
    type Input = PolishInput;
    type Output = PolishOutcome;

    fn stage(&self) -> Stage {
        Stage::Polish
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate::new(
            "You are an expert academic writing editor. Polish the LaTeX draft to ensure formal academic tone and proper formatting.",
            r#"LaTeX Draft:
{latex_draft}

Your task:
1. Review and improve the academic writing style
2. Ensure formal, professional tone throughout
3. Format references properly (APA/IEEE style)
4. Improve clarity and coherence
5. Add any missing academic elements

Important:
- Maintain all placeholders
- Keep the LaTeX structure intact
- Improve only the writing quality and formatting
- Ensure publication-ready academic standards

Return the polished LaTeX document:"#,
        )
    }

    fn bindings(&self, input: &PolishInput) -> Vec<(&'static str, String)> {
        vec![("latex_draft", input.draft.clone())]
    }

    fn interpret(
        &self,
        input: &PolishInput,
        completion: Result<String, GatewayError>,
    ) -> Result<PolishOutcome, StageError> {
        let text = pass_through(self.stage(), completion)?;
        let audit = PolishAudit::inspect(&input.draft, &text);

        if !audit.has_document_marker {
            warn!("⚠️ 润色结果不以 {} 开头，仍按原样采用", DOCUMENT_MARKER);
        }
        if !audit.placeholders_preserved() {
            warn!(
                "⚠️ 润色后占位符数量减少 ({} -> {})，请人工核对",
                audit.placeholders_before, audit.placeholders_after
            );
        }

        Ok(PolishOutcome { text, audit })
    }
}
