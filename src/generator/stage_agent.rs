use tracing::{info, warn};

use crate::generator::types::{Stage, StageError};
use crate::llm::gateway::{CompletionGateway, GatewayError};

/// Prompt模板
///
/// `{name}` 形式的占位符在渲染时被原样替换，未绑定的占位符保持不变。
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 角色与任务说明
    pub system_prompt: String,
    /// 带占位符的正文
    pub body: String,
}

impl PromptTemplate {
    pub fn new(system_prompt: &str, body: &str) -> Self {
        Self {
            system_prompt: system_prompt.to_string(),
            body: body.to_string(),
        }
    }

    /// 渲染完整prompt：系统说明 + 替换后的正文
    pub fn render(&self, bindings: &[(&str, String)]) -> String {
        let body = substitute(&self.body, bindings);
        if self.system_prompt.is_empty() {
            body
        } else {
            format!("{}\n\n{}", self.system_prompt, body)
        }
    }
}

/// 单遍替换，插入的文本不会再被扫描
fn substitute(template: &str, bindings: &[(&str, String)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        let binding = after_open.find('}').and_then(|close| {
            let name = &after_open[..close];
            bindings
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, value))
        });

        match binding {
            Some((close, value)) => {
                output.push_str(value);
                rest = &after_open[close + 1..];
            }
            None => {
                output.push('{');
                rest = after_open;
            }
        }
    }

    output.push_str(rest);
    output
}

/// 列表渲染为 `- item` 行
pub fn bullet_lines<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 阶段Agent
///
/// 每个Agent只声明模板、输入绑定以及如何解释网关结果；
/// 渲染和调用由 [`execute`] 统一完成，且每次只调用网关一次。
pub trait StageAgent {
    type Input;
    type Output;

    fn stage(&self) -> Stage;

    fn prompt_template(&self) -> PromptTemplate;

    /// 模板占位符绑定
    fn bindings(&self, input: &Self::Input) -> Vec<(&'static str, String)>;

    /// 解释网关返回
    fn interpret(
        &self,
        input: &Self::Input,
        completion: Result<String, GatewayError>,
    ) -> Result<Self::Output, StageError>;

    fn render_prompt(&self, input: &Self::Input) -> String {
        self.prompt_template().render(&self.bindings(input))
    }
}

/// 执行一个阶段：渲染模板、调用网关、解释结果
pub async fn execute<A>(
    agent: &A,
    gateway: &dyn CompletionGateway,
    input: &A::Input,
) -> Result<A::Output, StageError>
where
    A: StageAgent,
{
    let stage = agent.stage();
    let prompt = agent.render_prompt(input);
    info!("🤖 执行 {} 阶段...", stage);

    let completion = gateway.complete(&prompt).await;
    match &completion {
        Err(e) if e.is_timeout() => warn!("⏱️ {} 阶段网关调用超时: {}", stage, e),
        Err(e) => warn!("⚠️ {} 阶段网关调用失败: {}", stage, e),
        Ok(_) => {}
    }

    agent.interpret(input, completion)
}

/// 直接透传补全文本，失败即上游错误
pub fn pass_through(
    stage: Stage,
    completion: Result<String, GatewayError>,
) -> Result<String, StageError> {
    completion.map_err(|e| StageError::upstream(stage, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_bindings_verbatim() {
        let template = PromptTemplate::new("System.", "Topic: {topic}\nQuestions:\n{questions}");
        let rendered = template.render(&[
            ("topic", "quantum & co".to_string()),
            ("questions", "- a\n- b".to_string()),
        ]);

        assert_eq!(rendered, "System.\n\nTopic: quantum & co\nQuestions:\n- a\n- b");
    }

    #[test]
    fn test_render_does_not_rescan_inserted_text() {
        let template = PromptTemplate::new("", "{a} and {b}");
        let rendered = template.render(&[("a", "{b}".to_string()), ("b", "B".to_string())]);

        assert_eq!(rendered, "{b} and B");
    }

    #[test]
    fn test_render_keeps_unknown_and_unbalanced_braces() {
        let template = PromptTemplate::new("", r"\begin{document} {unknown} {topic} {");
        let rendered = template.render(&[("topic", "x".to_string())]);

        assert_eq!(rendered, r"\begin{document} {unknown} x {");
    }

    #[test]
    fn test_render_repeated_placeholder() {
        let template = PromptTemplate::new("", "{t}/{t}");
        assert_eq!(template.render(&[("t", "v".to_string())]), "v/v");
    }

    #[test]
    fn test_bullet_lines() {
        assert_eq!(bullet_lines(&["a", "b"]), "- a\n- b");
        assert_eq!(bullet_lines::<String>(&[]), "");
    }

    #[test]
    fn test_pass_through_maps_failure_to_upstream() {
        let err = pass_through(Stage::Literature, Err(GatewayError::Timeout { seconds: 5 }))
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Literature);
        assert_eq!(err.kind(), crate::generator::types::FailureKind::Upstream);

        assert_eq!(
            pass_through(Stage::Polish, Ok(String::new())).unwrap(),
            String::new()
        );
    }

    #[test]
    fn test_timeout_is_distinguished_from_transport() {
        let timeout = GatewayError::Timeout { seconds: 5 };
        let transport = GatewayError::Transport("connection reset".to_string());
        assert!(timeout.is_timeout());
        assert!(!transport.is_timeout());

        let err = pass_through(Stage::Methodology, Err(timeout)).unwrap_err();
        assert!(err.is_timeout());
        let err = pass_through(Stage::Methodology, Err(transport)).unwrap_err();
        assert!(!err.is_timeout());
        assert!(!StageError::input(Stage::Topic, "empty").is_timeout());
    }
}
