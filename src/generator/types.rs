use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

use crate::llm::gateway::GatewayError;

/// 工作流阶段，按执行顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Topic,
    Literature,
    Methodology,
    Drafting,
    Polish,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Topic,
        Stage::Literature,
        Stage::Methodology,
        Stage::Drafting,
        Stage::Polish,
    ];

    /// 必须先完成的上游阶段
    pub fn upstream(&self) -> Option<Stage> {
        match self {
            Stage::Topic => None,
            Stage::Literature => Some(Stage::Topic),
            Stage::Methodology => Some(Stage::Literature),
            Stage::Drafting => Some(Stage::Methodology),
            Stage::Polish => Some(Stage::Drafting),
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            Stage::Topic => "topic",
            Stage::Literature => "literature",
            Stage::Methodology => "methodology",
            Stage::Drafting => "drafting",
            Stage::Polish => "polish",
        };
        write!(f, "{}", str)
    }
}

/// 阶段失败的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 补全服务传输失败或超时
    Upstream,
    /// 输入缺失或阶段顺序不满足
    Input,
}

/// 对调用方可见的阶段失败
///
/// 校验失败（草稿缺少文档头）与编译失败都在本地恢复，不会出现在这里。
#[derive(Debug, Clone, Error)]
pub enum StageError {
    #[error("{stage} stage failed upstream: {source}")]
    Upstream {
        stage: Stage,
        #[source]
        source: GatewayError,
    },

    #[error("{stage} stage rejected input: {reason}")]
    Input { stage: Stage, reason: String },
}

impl StageError {
    pub fn upstream(stage: Stage, source: GatewayError) -> Self {
        StageError::Upstream { stage, source }
    }

    pub fn input(stage: Stage, reason: impl Into<String>) -> Self {
        StageError::Input {
            stage,
            reason: reason.into(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            StageError::Upstream { stage, .. } | StageError::Input { stage, .. } => *stage,
        }
    }

    /// 是否由网关超时导致
    pub fn is_timeout(&self) -> bool {
        matches!(self, StageError::Upstream { source, .. } if source.is_timeout())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            StageError::Upstream { .. } => FailureKind::Upstream,
            StageError::Input { .. } => FailureKind::Input,
        }
    }
}
