//! 윈도우 모니터 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`MonitorConfig`](logward_core::config::MonitorConfig)를
//! 기반으로 파이프라인 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logward_core::config::LogwardConfig;
//! use logward_monitor::config::PipelineConfig;
//!
//! let core_config = LogwardConfig::default();
//! let config = PipelineConfig::from_core(&core_config.monitor);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// 윈도우 모니터 파이프라인 설정
///
/// core의 `MonitorConfig`에서 파생되며, 파이프라인 내부에서
/// 사용하는 추가 설정을 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 모니터링 대상 소스 목록 (리포트 순서 = 이 목록 순서)
    pub sources: Vec<String>,
    /// follow 모드 — 백로그 이후에도 스트리밍 지속
    pub follow: bool,
    /// 소스당 초기 백로그 요청 라인 수
    pub tail: u64,
    /// Docker 소켓 경로 (빈 문자열 = 플랫폼 기본값)
    pub docker_socket: String,
    /// 플러시 윈도우 길이 (초)
    pub window_secs: u64,
    /// 플러시 주기 확인 간격 (밀리초)
    pub poll_interval_ms: u64,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 리포트 채널 용량 (내부 채널 생성 시)
    pub report_channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let core = logward_core::config::MonitorConfig::default();
        Self {
            enabled: core.enabled,
            sources: core.sources,
            follow: core.follow,
            tail: core.tail,
            docker_socket: core.docker_socket,
            window_secs: core.window_secs,
            poll_interval_ms: core.poll_interval_ms,
            report_channel_capacity: 64,
        }
    }
}

impl PipelineConfig {
    /// core의 `MonitorConfig`에서 파이프라인 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &logward_core::config::MonitorConfig) -> Self {
        Self {
            enabled: core.enabled,
            sources: core.sources.clone(),
            follow: core.follow,
            tail: core.tail,
            docker_socket: core.docker_socket.clone(),
            window_secs: core.window_secs,
            poll_interval_ms: core.poll_interval_ms,
            ..Self::default()
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), MonitorError> {
        const MAX_WINDOW_SECS: u64 = 3600; // 1 hour
        const MAX_TAIL_LINES: u64 = 10_000;

        if self.window_secs == 0 || self.window_secs > MAX_WINDOW_SECS {
            return Err(MonitorError::Config {
                field: "window_secs".to_owned(),
                reason: format!("must be 1-{MAX_WINDOW_SECS}"),
            });
        }

        if self.poll_interval_ms == 0 || self.poll_interval_ms > self.window_secs * 1000 {
            return Err(MonitorError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: "must be at least 1 and no longer than the window".to_owned(),
            });
        }

        if self.tail > MAX_TAIL_LINES {
            return Err(MonitorError::Config {
                field: "tail".to_owned(),
                reason: format!("must not exceed {MAX_TAIL_LINES}"),
            });
        }

        if self.report_channel_capacity == 0 {
            return Err(MonitorError::Config {
                field: "report_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.enabled {
            if self.sources.is_empty() {
                return Err(MonitorError::Config {
                    field: "sources".to_owned(),
                    reason: "at least one source must be configured when enabled".to_owned(),
                });
            }
            if self.sources.iter().any(|s| s.trim().is_empty()) {
                return Err(MonitorError::Config {
                    field: "sources".to_owned(),
                    reason: "source names must not be empty".to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 활성화 여부를 설정합니다.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// 모니터링 대상 소스를 설정합니다.
    pub fn sources(mut self, sources: Vec<String>) -> Self {
        self.config.sources = sources;
        self
    }

    /// follow 모드를 설정합니다.
    pub fn follow(mut self, follow: bool) -> Self {
        self.config.follow = follow;
        self
    }

    /// 초기 백로그 라인 수를 설정합니다.
    pub fn tail(mut self, tail: u64) -> Self {
        self.config.tail = tail;
        self
    }

    /// Docker 소켓 경로를 설정합니다.
    pub fn docker_socket(mut self, socket: impl Into<String>) -> Self {
        self.config.docker_socket = socket.into();
        self
    }

    /// 플러시 윈도우 길이(초)를 설정합니다.
    pub fn window_secs(mut self, secs: u64) -> Self {
        self.config.window_secs = secs;
        self
    }

    /// 플러시 주기 확인 간격(밀리초)을 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 리포트 채널 용량을 설정합니다.
    pub fn report_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.report_channel_capacity = capacity;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, MonitorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
