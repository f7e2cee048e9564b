//! 结构化文本解析器
//!
//! 将主题阶段的补全文本解析为研究问题、澄清问题与分析说明。
//! 解析是按行推进的状态机：遇到完全匹配的段落标题时切换游标，
//! 其余行按当前游标归类。缺失的段落得到空值，解析本身永远不会失败。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 列表项前缀
const BULLET_PREFIX: &str = "- ";

/// 已知的段落标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionLabel {
    Questions,
    Clarifying,
    Analysis,
}

impl SectionLabel {
    pub const ALL: [SectionLabel; 3] = [
        SectionLabel::Questions,
        SectionLabel::Clarifying,
        SectionLabel::Analysis,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            SectionLabel::Questions => "RESEARCH_QUESTIONS:",
            SectionLabel::Clarifying => "CLARIFYING_QUESTIONS:",
            SectionLabel::Analysis => "ANALYSIS:",
        }
    }

    fn from_header(line: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.header() == line)
    }
}

/// 解析过程中的临时结构：段落标签 -> 按原顺序提取的行
#[derive(Debug, Default)]
pub struct ParsedSections {
    sections: HashMap<SectionLabel, Vec<String>>,
}

impl ParsedSections {
    pub fn parse(text: &str) -> Self {
        let mut parsed = Self::default();
        let mut cursor: Option<SectionLabel> = None;

        for raw_line in text.lines() {
            let line = raw_line.trim();

            if let Some(label) = SectionLabel::from_header(line) {
                cursor = Some(label);
                continue;
            }

            match cursor {
                Some(label @ (SectionLabel::Questions | SectionLabel::Clarifying)) => {
                    if let Some(item) = line.strip_prefix(BULLET_PREFIX) {
                        parsed.push(label, item);
                    }
                }
                Some(SectionLabel::Analysis) => {
                    if !line.is_empty() {
                        parsed.push(SectionLabel::Analysis, line);
                    }
                }
                None => {}
            }
        }

        parsed
    }

    fn push(&mut self, label: SectionLabel, line: &str) {
        self.sections
            .entry(label)
            .or_default()
            .push(line.to_string());
    }

    pub fn lines(&self, label: SectionLabel) -> &[String] {
        self.sections
            .get(&label)
            .map(|lines| lines.as_slice())
            .unwrap_or_default()
    }

    pub fn into_refinement(mut self) -> TopicRefinement {
        let mut analysis = String::new();
        for line in self.lines(SectionLabel::Analysis) {
            analysis.push_str(line);
            analysis.push(' ');
        }

        TopicRefinement {
            research_questions: self
                .sections
                .remove(&SectionLabel::Questions)
                .unwrap_or_default(),
            clarifying_questions: self
                .sections
                .remove(&SectionLabel::Clarifying)
                .unwrap_or_default(),
            analysis: analysis.trim().to_string(),
        }
    }
}

/// 主题细化结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRefinement {
    pub research_questions: Vec<String>,
    pub clarifying_questions: Vec<String>,
    pub analysis: String,
}

/// 解析主题阶段的补全文本
pub fn parse_topic_response(text: &str) -> TopicRefinement {
    ParsedSections::parse(text).into_refinement()
}
