//! 윈도우 모니터 에러 타입
//!
//! [`MonitorError`]는 모니터 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<MonitorError> for LogwardError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logward_core::error::{LogwardError, PipelineError};

/// 윈도우 모니터 도메인 에러
///
/// 탐지 패턴 컴파일, 전송 계층 연결, 피드 스트리밍, 설정 검증 등
/// 파이프라인 내부의 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// 탐지 패턴 컴파일 실패
    #[error("pattern error: '{name}': {reason}")]
    Pattern {
        /// 패턴 이름
        name: String,
        /// 실패 사유
        reason: String,
    },

    /// 전송 계층 연결 실패 (Docker 소켓 등)
    #[error("transport error: {0}")]
    Transport(String),

    /// 소스 피드 에러 (스트림 획득/수신 실패)
    #[error("feed error: {source_name}: {reason}")]
    Feed {
        /// 소스 식별자
        source_name: String,
        /// 에러 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파이프라인 조립 실패
    #[error("init error: {0}")]
    Init(String),
}

impl From<MonitorError> for LogwardError {
    fn from(err: MonitorError) -> Self {
        LogwardError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_error_display() {
        let err = MonitorError::Pattern {
            name: "curl_pipe_bash".to_owned(),
            reason: "unclosed group".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("curl_pipe_bash"));
        assert!(msg.contains("unclosed group"));
    }

    #[test]
    fn feed_error_display() {
        let err = MonitorError::Feed {
            source_name: "bug_service".to_owned(),
            reason: "container not found".to_owned(),
        };
        assert!(err.to_string().contains("bug_service"));
    }

    #[test]
    fn converts_to_logward_error() {
        let err = MonitorError::Transport("socket unreachable".to_owned());
        let logward_err: LogwardError = err.into();
        assert!(matches!(logward_err, LogwardError::Pipeline(_)));
    }
}
