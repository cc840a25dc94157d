//! 설정 관리 — logward.toml 파싱 및 런타임 설정
//!
//! [`LogwardConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGWARD_MONITOR_WINDOW_SECS=10` 형식)
//! 3. 설정 파일 (`logward.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logward_core::error::LogwardError> {
//! use logward_core::config::LogwardConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogwardConfig::load("logward.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogwardConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogwardError};

/// Logward 통합 설정
///
/// `logward.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogwardConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 윈도우 모니터 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl LogwardConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogwardError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일이 있으면 로드하고, 없으면 기본값을 사용합니다.
    ///
    /// 어느 쪽이든 환경변수 오버라이드와 유효성 검증은 적용됩니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, LogwardError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path).await?
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogwardError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogwardError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogwardError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogwardError> {
        toml::from_str(toml_str).map_err(|e| {
            LogwardError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGWARD_{SECTION}_{FIELD}`
    /// 예: `LOGWARD_MONITOR_WINDOW_SECS=30`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGWARD_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGWARD_GENERAL_LOG_FORMAT");

        // Monitor
        override_bool(&mut self.monitor.enabled, "LOGWARD_MONITOR_ENABLED");
        override_csv(&mut self.monitor.sources, "LOGWARD_MONITOR_SOURCES");
        override_bool(&mut self.monitor.follow, "LOGWARD_MONITOR_FOLLOW");
        override_u64(&mut self.monitor.tail, "LOGWARD_MONITOR_TAIL");
        override_string(
            &mut self.monitor.docker_socket,
            "LOGWARD_MONITOR_DOCKER_SOCKET",
        );
        override_u64(&mut self.monitor.window_secs, "LOGWARD_MONITOR_WINDOW_SECS");
        override_u64(
            &mut self.monitor.poll_interval_ms,
            "LOGWARD_MONITOR_POLL_INTERVAL_MS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogwardError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        const MAX_WINDOW_SECS: u64 = 3600; // 1 hour
        const MAX_TAIL_LINES: u64 = 10_000;

        if self.monitor.window_secs == 0 || self.monitor.window_secs > MAX_WINDOW_SECS {
            return Err(ConfigError::InvalidValue {
                field: "monitor.window_secs".to_owned(),
                reason: format!("must be 1-{MAX_WINDOW_SECS}"),
            }
            .into());
        }

        if self.monitor.poll_interval_ms == 0
            || self.monitor.poll_interval_ms > self.monitor.window_secs * 1000
        {
            return Err(ConfigError::InvalidValue {
                field: "monitor.poll_interval_ms".to_owned(),
                reason: "must be at least 1 and no longer than the window".to_owned(),
            }
            .into());
        }

        if self.monitor.tail > MAX_TAIL_LINES {
            return Err(ConfigError::InvalidValue {
                field: "monitor.tail".to_owned(),
                reason: format!("must not exceed {MAX_TAIL_LINES}"),
            }
            .into());
        }

        if self.monitor.enabled {
            if self.monitor.sources.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "monitor.sources".to_owned(),
                    reason: "at least one source must be configured when enabled".to_owned(),
                }
                .into());
            }
            if self.monitor.sources.iter().any(|s| s.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: "monitor.sources".to_owned(),
                    reason: "source names must not be empty".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 윈도우 모니터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 모니터링 대상 소스 (컨테이너 이름) 목록
    pub sources: Vec<String>,
    /// follow 모드 — 백로그 이후에도 스트리밍을 지속
    pub follow: bool,
    /// 소스당 초기 백로그 요청 라인 수
    pub tail: u64,
    /// Docker 소켓 경로 (빈 문자열 = 플랫폼 기본값)
    pub docker_socket: String,
    /// 플러시 윈도우 길이 (초)
    pub window_secs: u64,
    /// 플러시 주기 확인 간격 (밀리초)
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sources: vec![
                "good_service".to_owned(),
                "bug_service".to_owned(),
                "suspicious_service".to_owned(),
                "noisy_service".to_owned(),
            ],
            follow: true,
            tail: 50,
            docker_socket: String::new(),
            window_secs: 10,
            poll_interval_ms: 250,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}
