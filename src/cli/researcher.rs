use std::collections::BTreeMap;

use anyhow::{Context, Result};
use inquire::{InquireError, Text};

use super::parse_selection;
use crate::generator::agents::{PREFERENCE_QUESTIONS, preference_key};
use crate::generator::context::Paper;
use crate::generator::workflow::{Researcher, clarifying_key};

/// 非交互模式下未指定选择时使用的论文数量
const DEFAULT_SELECTION_COUNT: usize = 3;

/// 命令行研究者：优先使用参数给出的回答，缺失时交互式询问
#[derive(Debug, Clone, Default)]
pub struct CliResearcher {
    pub answers: Vec<String>,
    /// 从0开始的候选下标
    pub selection: Option<Vec<usize>>,
    pub preferences: Vec<String>,
    pub interactive: bool,
}

impl CliResearcher {
    fn ask(&self, prompt: &str) -> Result<String> {
        if !self.interactive {
            return Ok(String::new());
        }
        match Text::new(prompt).prompt() {
            Ok(answer) => Ok(answer.trim().to_string()),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                anyhow::bail!("⚠️ 已取消输入")
            }
            Err(e) => Err(e).context("读取输入失败"),
        }
    }

    /// 逐个回答问题，参数中已提供的回答直接使用
    fn answer_all<Q: AsRef<str>>(
        &self,
        questions: &[Q],
        provided: &[String],
        key: fn(usize) -> String,
    ) -> Result<BTreeMap<String, String>> {
        let mut answers = BTreeMap::new();
        for (i, question) in questions.iter().enumerate() {
            let answer = match provided.get(i) {
                Some(answer) => answer.trim().to_string(),
                None => {
                    println!("\n{}. {}", i + 1, question.as_ref());
                    self.ask("Your answer:")?
                }
            };
            answers.insert(key(i), answer);
        }
        Ok(answers)
    }
}

impl Researcher for CliResearcher {
    fn answer_clarifying_questions(&self, questions: &[String]) -> Result<BTreeMap<String, String>> {
        if self.interactive && self.answers.len() < questions.len() {
            println!("\n📝 请回答以下澄清问题:");
        }
        self.answer_all(questions, &self.answers, clarifying_key)
    }

    fn select_papers(&self, suggestions: &str, candidates: &[Paper]) -> Result<Vec<usize>> {
        if let Some(selection) = &self.selection {
            return Ok(selection.clone());
        }
        if !self.interactive {
            return Ok((0..DEFAULT_SELECTION_COUNT.min(candidates.len())).collect());
        }

        println!("\n📚 推荐论文:\n{}", suggestions);
        println!("\n📋 请选择3-5篇希望重点关注的论文（输入以逗号分隔的编号）:");
        loop {
            let input = self.ask("Your selection (e.g., 1,3,5):")?;
            match parse_selection(&input) {
                Ok(indices) if indices.iter().all(|i| *i < candidates.len()) => return Ok(indices),
                Ok(_) => println!("编号超出范围，请输入 1 到 {} 之间的数字。", candidates.len()),
                Err(e) => println!("输入无效: {}", e),
            }
        }
    }

    fn methodology_preferences(&self, suggestions: &str) -> Result<BTreeMap<String, String>> {
        if self.interactive && self.preferences.len() < PREFERENCE_QUESTIONS.len() {
            println!("\n🔬 方法论建议:\n{}", suggestions);
            println!("\n⚙️ 请回答以下方法论偏好问题:");
        }
        self.answer_all(&PREFERENCE_QUESTIONS[..], &self.preferences, preference_key)
    }
}
