use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 候选论文数量
pub const CANDIDATE_PAPER_COUNT: usize = 8;

/// 论文条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub authors: String,
    pub summary: String,
}

impl Paper {
    /// 第`index`个（从0开始）候选占位论文
    pub fn placeholder(index: usize) -> Self {
        Self {
            title: format!("Relevant Paper {}", index + 1),
            authors: format!("Author {}", index + 1),
            summary: format!("Summary {}", index + 1),
        }
    }

    /// 供用户挑选的候选列表
    ///
    /// 候选内容是占位数据而非检索结果，文献阶段的真实推荐只以文本形式展示给用户。
    pub fn candidates() -> Vec<Paper> {
        (0..CANDIDATE_PAPER_COUNT).map(Paper::placeholder).collect()
    }
}

/// 一次工作流运行中的研究状态
///
/// 每个阶段只写自己负责的字段；由会话独占持有，不支持并发修改。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchContext {
    pub topic: String,
    pub research_questions: Vec<String>,
    pub selected_papers: Vec<Paper>,
    pub methodology_preferences: BTreeMap<String, String>,
    pub draft_text: String,
    pub final_text: String,
}

impl ResearchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 将偏好映射展开为 `key: value` 并以空格连接
    pub fn methodology_summary(&self) -> String {
        flatten_pairs(&self.methodology_preferences)
    }
}

/// `key: value` 形式展开键值对，以单个空格连接
pub fn flatten_pairs(pairs: &BTreeMap<String, String>) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_are_numbered_from_one() {
        let candidates = Paper::candidates();
        assert_eq!(candidates.len(), CANDIDATE_PAPER_COUNT);
        assert_eq!(candidates[0].title, "Relevant Paper 1");
        assert_eq!(candidates[7].authors, "Author 8");
        assert_eq!(candidates[3].summary, "Summary 4");
    }

    #[test]
    fn test_new_context_is_empty() {
        let context = ResearchContext::new();
        assert!(context.topic.is_empty());
        assert!(context.research_questions.is_empty());
        assert!(context.selected_papers.is_empty());
        assert!(context.methodology_preferences.is_empty());
        assert!(context.draft_text.is_empty());
        assert!(context.final_text.is_empty());
    }

    #[test]
    fn test_methodology_summary_flattens_pairs() {
        let mut context = ResearchContext::new();
        context
            .methodology_preferences
            .insert("pref_2".to_string(), "empirical".to_string());
        context
            .methodology_preferences
            .insert("pref_1".to_string(), "small".to_string());

        assert_eq!(context.methodology_summary(), "pref_1: small pref_2: empirical");
    }

    #[test]
    fn test_methodology_summary_empty() {
        assert_eq!(ResearchContext::new().methodology_summary(), "");
    }
}
