//! 에러 타입 — 도메인별 에러 정의

/// Logward 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogwardError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중인 모듈을 다시 시작하려 함
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아닌 모듈을 정지하려 함
    #[error("pipeline not running")]
    NotRunning,

    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = LogwardError::from(ConfigError::InvalidValue {
            field: "monitor.window_secs".to_owned(),
            reason: "must be 1-3600".to_owned(),
        });
        let msg = err.to_string();
        assert!(msg.contains("monitor.window_secs"));
        assert!(msg.contains("must be 1-3600"));
    }

    #[test]
    fn pipeline_error_display() {
        let err = LogwardError::from(PipelineError::AlreadyRunning);
        assert!(err.to_string().contains("already running"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LogwardError = io.into();
        assert!(matches!(err, LogwardError::Io(_)));
    }
}
