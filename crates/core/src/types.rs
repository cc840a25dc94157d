//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 파싱된 로그 이벤트, 윈도우 피처 요약, 룰 히트, 그리고 플러시 리포트까지
//! 모니터 파이프라인을 흐르는 모든 데이터 구조를 정의합니다.

use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// 로그 레벨
///
/// 원시 로그 라인에서 인식하는 다섯 가지 레벨 토큰에 대응합니다.
/// 파서가 레벨을 식별하지 못한 경우 기본값인 `Info`로 강등됩니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    /// 디버그
    Debug,
    /// 정보성 (기본값)
    #[default]
    Info,
    /// 경고
    Warn,
    /// 에러
    Error,
    /// 상세 추적
    Trace,
}

impl LogLevel {
    /// 대문자 레벨 토큰에서 로그 레벨을 파싱합니다.
    ///
    /// 로그 라인의 `[LEVEL]` 자리에 오는 다섯 토큰만 인식하며,
    /// 그 외에는 `None`을 반환합니다.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    /// 레벨 토큰 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 파싱된 로그 이벤트
///
/// 하나의 원시 로그 라인에서 생성되며, 해당 소스의 윈도우 버퍼에만
/// 보관되다가 플러시 시점에 소비된 뒤 폐기됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// 발생 소스 식별자 (예: 컨테이너 이름)
    pub source: String,
    /// UTC 타임스탬프 (파싱 실패 시 처리 시각)
    pub timestamp: SystemTime,
    /// 로그 레벨
    pub level: LogLevel,
    /// 정리된 메시지 본문
    pub message: String,
    /// 원본 라인 (개행만 제거)
    pub raw: String,
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.source, self.message)
    }
}

/// 윈도우 피처 요약
///
/// 한 소스의 한 윈도우 분량 이벤트에서 추출된 고정 형태의 통계입니다.
/// `keyword_hits`와 `pattern_hits`는 설정된 모든 키를 0으로 채워 담고
/// 있으므로, 소비자는 존재 여부를 검사할 필요가 없습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowFeatures {
    /// 소스 식별자
    pub source: String,
    /// 윈도우 내 전체 이벤트 수
    pub total: usize,
    /// DEBUG 이벤트 수
    pub debug: u32,
    /// INFO 이벤트 수 (미분류 레벨 포함)
    pub info: u32,
    /// WARN 이벤트 수
    pub warn: u32,
    /// ERROR 이벤트 수
    pub error: u32,
    /// 고유 메시지 비율 (0.0~1.0, 소수점 4자리)
    pub uniq_ratio: f64,
    /// 반복 메시지 비율 (`1 - uniq_ratio`, total==0이면 0)
    pub repeat_ratio: f64,
    /// 키워드별 매칭 이벤트 수 (이벤트당 키워드당 최대 1)
    pub keyword_hits: BTreeMap<String, u32>,
    /// 패턴별 매칭 이벤트 수 (이벤트당 패턴당 최대 1)
    pub pattern_hits: BTreeMap<String, u32>,
}

impl WindowFeatures {
    /// 키워드 히트 수를 반환합니다. 없는 키는 0으로 취급합니다.
    pub fn keyword(&self, name: &str) -> u32 {
        self.keyword_hits.get(name).copied().unwrap_or(0)
    }

    /// 패턴 히트 수를 반환합니다. 없는 이름은 0으로 취급합니다.
    pub fn pattern(&self, name: &str) -> u32 {
        self.pattern_hits.get(name).copied().unwrap_or(0)
    }
}

impl fmt::Display for WindowFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: total={} err={} warn={} repeat={}",
            self.source, self.total, self.error, self.warn, self.repeat_ratio,
        )
    }
}

/// 심각도 레벨
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Low < Medium < High`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 낮은 심각도
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도 — 우선 검토 필요
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MED"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// 탐지 이슈 유형
///
/// 룰 테이블의 고정된 여덟 가지 판정 결과에 대응합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// 크래시 루프 또는 설정 오류 의심 (높은 반복률 + 에러)
    CrashLoopOrMisconfig,
    /// 일반적인 서비스 에러 다발
    ServiceErrors,
    /// 의심스러운 명령 실행 흔적 (curl 파이프 등)
    SuspiciousCommand,
    /// 인코딩된 페이로드 활동 (base64 디코드)
    EncodedPayloadActivity,
    /// 리버스 셸 지표
    ReverseShellIndicator,
    /// 무차별 대입 시도
    BruteforceAttempts,
    /// 포트 스캔 활동
    PortScanActivity,
    /// 의존 서비스 다운 또는 네트워크 장애
    DependencyDownOrNetwork,
}

impl IssueType {
    /// 이슈 유형의 식별자 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrashLoopOrMisconfig => "crash_loop_or_misconfig",
            Self::ServiceErrors => "service_errors",
            Self::SuspiciousCommand => "suspicious_command",
            Self::EncodedPayloadActivity => "encoded_payload_activity",
            Self::ReverseShellIndicator => "reverse_shell_indicator",
            Self::BruteforceAttempts => "bruteforce_attempts",
            Self::PortScanActivity => "port_scan_activity",
            Self::DependencyDownOrNetwork => "dependency_down_or_network",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 룰 히트
///
/// 한 윈도우에 대한 단일 룰의 양성 판정입니다. 불변 값이며,
/// `reason`에는 판정을 유발한 수치가 감사 목적으로 포함됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleHit {
    /// 이슈 유형
    pub issue_type: IssueType,
    /// 심각도
    pub severity: Severity,
    /// 판정 근거 (트리거된 수치 포함)
    pub reason: String,
}

impl fmt::Display for RuleHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.issue_type, self.reason)
    }
}

/// 단일 소스의 플러시 리포트 항목
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    /// 윈도우 피처 요약
    pub features: WindowFeatures,
    /// 발화한 룰 히트 목록 (룰 테이블 순서)
    pub hits: Vec<RuleHit>,
}

impl fmt::Display for SourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  - {}", self.features)?;

        let keywords = format_nonzero(&self.features.keyword_hits);
        if !keywords.is_empty() {
            write!(f, "\n      keyword_hits={keywords}")?;
        }
        let patterns = format_nonzero(&self.features.pattern_hits);
        if !patterns.is_empty() {
            write!(f, "\n      pattern_hits={patterns}")?;
        }

        if self.hits.is_empty() {
            write!(f, "\n      RULE none")?;
        } else {
            for hit in &self.hits {
                write!(
                    f,
                    "\n      RULE {} {}: {}",
                    hit.severity, hit.issue_type, hit.reason,
                )?;
            }
        }

        Ok(())
    }
}

/// 윈도우 플러시 리포트
///
/// 한 번의 플러시 사이클에서 비어있지 않았던 모든 소스의 요약을 담습니다.
/// 모든 소스가 비어있었다면 `entries`는 빈 목록이고 헤더만 출력됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowReport {
    /// 윈도우 길이 (초)
    pub window_secs: u64,
    /// 소스별 리포트 (설정된 소스 순서)
    pub entries: Vec<SourceReport>,
}

impl fmt::Display for WindowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window flush ({}s)", self.window_secs)?;
        for entry in &self.entries {
            write!(f, "\n{entry}")?;
        }
        Ok(())
    }
}

/// 0이 아닌 항목만 `{key: value, ...}` 형태로 렌더링합니다.
///
/// 모든 값이 0이면 빈 문자열을 반환합니다 (해당 라인 생략용).
fn format_nonzero(map: &BTreeMap<String, u32>) -> String {
    let nonzero: Vec<String> = map
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(name, count)| format!("{name}: {count}"))
        .collect();

    if nonzero.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", nonzero.join(", "))
    }
}
