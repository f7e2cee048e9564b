#[cfg(test)]
mod tests {
    use crate::config::CompilerConfig;
    use crate::generator::agents::{DraftRejection, DraftSource};
    use crate::generator::compiler::{
        ArtifactCompiler, CommandOutput, CommandSpec, ProcessRunner, RunError, ToolProbe,
    };
    use crate::generator::context::{Paper, ResearchContext};
    use crate::generator::synthesizer::synthesize_document;
    use crate::generator::types::{FailureKind, Stage, StageError};
    use crate::generator::workflow::*;
    use crate::llm::gateway::{CompletionGateway, GatewayError};
    use async_trait::async_trait;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    const TOPIC_RESPONSE: &str = "RESEARCH_QUESTIONS:\n- How does reward shaping affect sample efficiency?\n- Can offline data bootstrap exploration?\n- Which policy classes transfer across tasks?\n\nCLARIFYING_QUESTIONS:\n- Which domains interest you?\n- Do you have compute limits?\n\nANALYSIS:\nThese questions cover\nthe main open problems.";

    /// 按顺序返回预设补全，并记录收到的prompt
    struct ScriptedGateway {
        replies: Mutex<VecDeque<Result<String, GatewayError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGateway {
        fn new(replies: Vec<Result<String, GatewayError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn prompt(&self, index: usize) -> String {
            self.prompts.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl CompletionGateway for ScriptedGateway {
        async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Transport("script exhausted".to_string())))
        }
    }

    struct MissingTool;

    impl ToolProbe for MissingTool {
        fn is_available(&self, _program: &str) -> bool {
            false
        }
    }

    struct FailingRunner;

    #[async_trait]
    impl ProcessRunner for FailingRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError> {
            Err(RunError::Launch {
                program: spec.program.clone(),
                message: "not found".to_string(),
            })
        }
    }

    fn offline_compiler() -> ArtifactCompiler {
        ArtifactCompiler::with_backends(
            CompilerConfig::default(),
            Arc::new(MissingTool),
            Arc::new(FailingRunner),
        )
    }

    fn session(gateway: Arc<ScriptedGateway>, dir: &TempDir) -> ResearchSession {
        ResearchSession::new(gateway, offline_compiler(), dir.path())
    }

    fn ok(text: &str) -> Result<String, GatewayError> {
        Ok(text.to_string())
    }

    fn preferences() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("pref_1".to_string(), "public benchmarks".to_string()),
            ("pref_2".to_string(), "return".to_string()),
        ])
    }

    /// 运行到草稿阶段之前
    async fn session_ready_for_drafting(
        replies: Vec<Result<String, GatewayError>>,
        dir: &TempDir,
    ) -> (ResearchSession, Arc<ScriptedGateway>) {
        let mut all = vec![ok(TOPIC_RESPONSE), ok("PAPER_SUGGESTIONS:\n..."), ok("DATASET_SUGGESTIONS:\n...")];
        all.extend(replies);
        let gateway = ScriptedGateway::new(all);
        let mut session = session(gateway.clone(), dir);

        session.refine_topic("reinforcement learning").await.unwrap();
        session.suggest_literature(&BTreeMap::new()).await.unwrap();
        session.select_papers(&[0, 2]).unwrap();
        session.design_methodology().await.unwrap();
        (session, gateway)
    }

    #[tokio::test]
    async fn test_refine_topic_populates_context() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![ok(TOPIC_RESPONSE)]);
        let mut session = session(gateway.clone(), &dir);

        let refinement = session.refine_topic("  reinforcement learning ").await.unwrap();

        assert_eq!(refinement.research_questions.len(), 3);
        assert_eq!(refinement.clarifying_questions.len(), 2);
        assert_eq!(refinement.analysis, "These questions cover the main open problems.");
        assert_eq!(session.context().topic, "reinforcement learning");
        assert_eq!(session.context().research_questions, refinement.research_questions);
        assert!(session.is_completed(Stage::Topic));
        assert!(gateway.prompt(0).contains("Broad Topic: reinforcement learning"));
    }

    #[tokio::test]
    async fn test_empty_topic_rejected_without_gateway_call() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![ok(TOPIC_RESPONSE)]);
        let mut session = session(gateway.clone(), &dir);

        let err = session.refine_topic("   ").await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Input);
        assert_eq!(err.stage(), Stage::Topic);
        assert_eq!(gateway.calls(), 0);
        assert!(session.completed_stages().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_context_unchanged() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![
            Err(GatewayError::Timeout { seconds: 5 }),
            ok(TOPIC_RESPONSE),
        ]);
        let mut session = session(gateway.clone(), &dir);

        let err = session.refine_topic("reinforcement learning").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Upstream);
        assert_eq!(session.context(), &ResearchContext::default());
        assert!(!session.is_completed(Stage::Topic));

        // 相同输入可以重试
        session.refine_topic("reinforcement learning").await.unwrap();
        assert_eq!(session.context().research_questions.len(), 3);
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_stage_ordering_is_enforced() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![]);
        let mut session = session(gateway.clone(), &dir);

        let err = session.suggest_literature(&BTreeMap::new()).await.unwrap_err();
        assert_eq!(err.stage(), Stage::Literature);
        assert_eq!(err.kind(), FailureKind::Input);

        assert!(session.select_papers(&[0]).is_err());
        assert!(session.design_methodology().await.is_err());
        assert!(session.draft(BTreeMap::new()).await.is_err());
        assert!(session.polish().await.is_err());
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_methodology_requires_paper_selection() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![ok(TOPIC_RESPONSE), ok("papers")]);
        let mut session = session(gateway.clone(), &dir);
        session.refine_topic("reinforcement learning").await.unwrap();
        session.suggest_literature(&BTreeMap::new()).await.unwrap();

        let err = session.design_methodology().await.unwrap_err();

        assert_eq!(err.stage(), Stage::Methodology);
        assert_eq!(err.kind(), FailureKind::Input);
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_clarifying_answers_become_user_preferences() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![ok(TOPIC_RESPONSE), ok("papers")]);
        let mut session = session(gateway.clone(), &dir);
        session.refine_topic("reinforcement learning").await.unwrap();

        let answers = BTreeMap::from([
            (clarifying_key(0), "robotics".to_string()),
            (clarifying_key(1), "one GPU".to_string()),
        ]);
        let suggestions = session.suggest_literature(&answers).await.unwrap();

        assert_eq!(suggestions, "papers");
        assert!(gateway.prompt(1).contains("User Preferences: q1: robotics q2: one GPU"));
    }

    #[tokio::test]
    async fn test_select_papers_out_of_range() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![ok(TOPIC_RESPONSE), ok("papers")]);
        let mut session = session(gateway, &dir);
        session.refine_topic("reinforcement learning").await.unwrap();
        session.suggest_literature(&BTreeMap::new()).await.unwrap();

        let err = session.select_papers(&[1, 8]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Input);
        assert!(session.context().selected_papers.is_empty());

        let papers = session.select_papers(&[7, 1]).unwrap();
        assert_eq!(papers, vec![Paper::placeholder(7), Paper::placeholder(1)]);
        assert_eq!(session.context().selected_papers, papers);
    }

    #[tokio::test]
    async fn test_empty_selection_does_not_unlock_methodology() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![ok(TOPIC_RESPONSE), ok("papers"), ok("methods")]);
        let mut session = session(gateway.clone(), &dir);
        session.refine_topic("reinforcement learning").await.unwrap();
        session.suggest_literature(&BTreeMap::new()).await.unwrap();

        let err = session.select_papers(&[]).unwrap_err();
        assert_eq!(err.stage(), Stage::Methodology);
        assert_eq!(err.kind(), FailureKind::Input);
        assert!(session.context().selected_papers.is_empty());

        let err = session.design_methodology().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Input);
        assert_eq!(gateway.calls(), 2);

        session.select_papers(&[3]).unwrap();
        session.design_methodology().await.unwrap();
        assert!(gateway.prompt(2).contains("Selected Papers:\n- Relevant Paper 4"));
    }

    #[tokio::test]
    async fn test_drafting_gateway_failure_uses_synthesizer() {
        let dir = TempDir::new().unwrap();
        let (mut session, _gateway) = session_ready_for_drafting(
            vec![Err(GatewayError::Transport("connection reset".to_string()))],
            &dir,
        )
        .await;

        let outcome = session.draft(preferences()).await.unwrap();

        let expected = synthesize_document(
            "reinforcement learning",
            &session.context().research_questions,
            &[Paper::placeholder(0), Paper::placeholder(2)],
            "pref_1: public benchmarks pref_2: return",
        );
        assert_eq!(outcome.text, expected);
        assert!(matches!(
            outcome.source,
            DraftSource::Synthesized {
                rejection: DraftRejection::Upstream(_)
            }
        ));
        assert_eq!(session.context().draft_text, expected);
        assert_eq!(session.context().methodology_preferences, preferences());
        assert!(session.is_completed(Stage::Drafting));
    }

    #[tokio::test]
    async fn test_drafting_invalid_completion_uses_synthesizer() {
        let dir = TempDir::new().unwrap();
        let (mut session, _gateway) =
            session_ready_for_drafting(vec![ok("Here is a draft you might like.")], &dir).await;

        let outcome = session.draft(preferences()).await.unwrap();

        assert!(outcome.is_synthesized());
        assert!(outcome.text.starts_with("\\documentclass"));
        assert!(outcome.text.contains("pref\\_1: public benchmarks"));
    }

    #[tokio::test]
    async fn test_polish_accepts_completion_verbatim() {
        let dir = TempDir::new().unwrap();
        let (mut session, gateway) = session_ready_for_drafting(
            vec![ok("\\documentclass{article}\n[PLACEHOLDER: x]"), ok("polished, not latex")],
            &dir,
        )
        .await;
        session.draft(preferences()).await.unwrap();

        let outcome = session.polish().await.unwrap();

        assert_eq!(outcome.text, "polished, not latex");
        assert!(!outcome.audit.is_intact());
        assert_eq!(session.context().final_text, "polished, not latex");
        assert!(gateway.prompt(4).contains("[PLACEHOLDER: x]"));
    }

    #[tokio::test]
    async fn test_rerunning_topic_invalidates_downstream_stages() {
        let dir = TempDir::new().unwrap();
        let (mut session, _gateway) =
            session_ready_for_drafting(vec![ok(TOPIC_RESPONSE)], &dir).await;
        assert!(session.is_completed(Stage::Methodology));

        session.refine_topic("offline reinforcement learning").await.unwrap();

        assert_eq!(session.completed_stages(), vec![Stage::Topic]);
        assert!(session.draft(BTreeMap::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_publish_requires_final_text() {
        let dir = TempDir::new().unwrap();
        let session = session(ScriptedGateway::new(vec![]), &dir);

        let err = session.publish(Some("paper.tex"), false).await.unwrap_err();
        assert!(err.to_string().contains("No paper generated yet"));
    }

    #[tokio::test]
    async fn test_publish_writes_named_file_and_degrades_compile() {
        let dir = TempDir::new().unwrap();
        let (mut session, _gateway) = session_ready_for_drafting(
            vec![ok("\\documentclass{article}"), ok("\\documentclass{article}\nfinal")],
            &dir,
        )
        .await;
        session.draft(preferences()).await.unwrap();
        session.polish().await.unwrap();

        let report = session.publish(Some("paper.tex"), true).await.unwrap();

        assert_eq!(report.source, dir.path().join("paper.tex"));
        assert_eq!(
            std::fs::read_to_string(&report.source).unwrap(),
            "\\documentclass{article}\nfinal"
        );
        assert_eq!(report.artifact(), report.source.as_path());
        assert!(!report.compile.unwrap().is_compiled());
    }

    struct FixedResearcher;

    impl Researcher for FixedResearcher {
        fn answer_clarifying_questions(&self, questions: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
            Ok(questions
                .iter()
                .enumerate()
                .map(|(i, _)| (clarifying_key(i), format!("answer {}", i + 1)))
                .collect())
        }

        fn select_papers(&self, _suggestions: &str, candidates: &[Paper]) -> anyhow::Result<Vec<usize>> {
            assert_eq!(candidates.len(), 8);
            Ok(vec![0, 1, 2])
        }

        fn methodology_preferences(&self, _suggestions: &str) -> anyhow::Result<BTreeMap<String, String>> {
            Ok(preferences())
        }
    }

    #[tokio::test]
    async fn test_run_workflow_end_to_end() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![
            ok(TOPIC_RESPONSE),
            ok("PAPER_SUGGESTIONS:\nPaper 1: ..."),
            ok("DATASET_SUGGESTIONS:\n- D4RL"),
            ok("no marker here"),
            ok("\\documentclass{article}\npolished"),
        ]);
        let mut session = session(gateway.clone(), &dir);

        let report = run_workflow(
            &mut session,
            "reinforcement learning",
            &FixedResearcher,
            Some("rl.tex"),
            false,
        )
        .await
        .unwrap();

        assert_eq!(gateway.calls(), 5);
        assert_eq!(report.source, dir.path().join("rl.tex"));
        assert!(report.compile.is_none());
        assert_eq!(session.completed_stages(), Stage::ALL.to_vec());
        assert_eq!(session.context().selected_papers.len(), 3);
        assert!(gateway.prompt(1).contains("q1: answer 1 q2: answer 2"));
        assert_eq!(session.timing().get_phase_durations().len(), 5);

        let steps = next_steps(&report);
        assert_eq!(steps.len(), 4);
        assert!(steps[0].contains("rl.tex"));
    }

    #[tokio::test]
    async fn test_run_workflow_stops_on_upstream_failure() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![
            ok(TOPIC_RESPONSE),
            Err(GatewayError::Transport("503".to_string())),
        ]);
        let mut session = session(gateway.clone(), &dir);

        let result = run_workflow(&mut session, "rl", &FixedResearcher, None, false).await;

        assert!(result.is_err());
        assert_eq!(session.completed_stages(), vec![Stage::Topic]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_run_workflow_timeout_suggests_longer_limit() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![Err(GatewayError::Timeout { seconds: 60 })]);
        let mut session = session(gateway, &dir);

        let err = run_workflow(&mut session, "rl", &FixedResearcher, None, false)
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("--llm-timeout"));
        let stage_error = err.downcast_ref::<StageError>().unwrap();
        assert!(stage_error.is_timeout());
        assert_eq!(stage_error.stage(), Stage::Topic);
    }

    #[tokio::test]
    async fn test_run_workflow_transport_failure_has_no_timeout_hint() {
        let dir = TempDir::new().unwrap();
        let gateway = ScriptedGateway::new(vec![Err(GatewayError::Transport("503".to_string()))]);
        let mut session = session(gateway, &dir);

        let err = run_workflow(&mut session, "rl", &FixedResearcher, None, false)
            .await
            .unwrap_err();

        assert!(!format!("{:#}", err).contains("--llm-timeout"));
        assert!(!err.downcast_ref::<StageError>().unwrap().is_timeout());
    }

    #[test]
    fn test_timing_scope_accumulates_reruns() {
        let mut timing = TimingScope::new();

        timing.start_phase(Stage::Topic);
        std::thread::sleep(Duration::from_millis(2));
        let first = timing.end_phase(Stage::Topic).unwrap();
        timing.start_phase(Stage::Topic);
        let second = timing.end_phase(Stage::Topic).unwrap();

        assert_eq!(timing.get_phase_durations()[&Stage::Topic], first + second);
        assert!(timing.end_phase(Stage::Polish).is_none());

        let report = timing.generate_timing_report();
        assert!(report.contains("总执行时间"));
        assert!(report.contains("- topic:"));
    }
}
