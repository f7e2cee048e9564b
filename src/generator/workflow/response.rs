use serde::Serialize;

use crate::generator::types::{FailureKind, Stage, StageError};

/// 面向前端的阶段结果
///
/// 成功时携带 `result`，失败时携带错误描述与失败分类。
#[derive(Debug, Clone, Serialize)]
pub struct StageResponse<T> {
    pub success: bool,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
}

impl<T> StageResponse<T> {
    pub fn from_result(stage: Stage, result: Result<T, StageError>) -> Self {
        match result {
            Ok(value) => Self {
                success: true,
                stage,
                result: Some(value),
                error: None,
                failure_kind: None,
            },
            Err(e) => Self {
                success: false,
                stage: e.stage(),
                result: None,
                error: Some(e.to_string()),
                failure_kind: Some(e.kind()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::gateway::GatewayError;

    #[test]
    fn test_success_response_serialization() {
        let response = StageResponse::from_result(Stage::Literature, Ok("papers".to_string()));
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["stage"], "literature");
        assert_eq!(value["result"], "papers");
        assert!(value.get("error").is_none());
        assert!(value.get("failure_kind").is_none());
    }

    #[test]
    fn test_failure_response_carries_kind() {
        let response: StageResponse<String> = StageResponse::from_result(
            Stage::Polish,
            Err(StageError::upstream(Stage::Polish, GatewayError::Timeout { seconds: 30 })),
        );
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["stage"], "polish");
        assert_eq!(value["failure_kind"], "upstream");
        assert!(value["error"].as_str().unwrap().contains("polish"));
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_input_failure_kind() {
        let response: StageResponse<()> =
            StageResponse::from_result(Stage::Topic, Err(StageError::input(Stage::Topic, "empty")));

        assert!(!response.success);
        assert_eq!(response.failure_kind, Some(FailureKind::Input));
    }
}
