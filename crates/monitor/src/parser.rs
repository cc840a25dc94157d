//! 로그 라인 파서
//!
//! 하나의 원시 텍스트 라인을 구조화된 [`LogEvent`]로 변환합니다.
//!
//! # 기대 형식
//! ```text
//! 2026-02-01T12:34:56.123Z [INFO] service: message
//! 2026-02-01T12:34:56Z [ERROR] bug_service: something
//! ```
//!
//! 형식이 맞지 않는 라인도 절대 거부하지 않습니다. 타임스탬프/레벨을
//! 식별하지 못하면 처리 시각과 `INFO` 레벨로 강등하여 이벤트를 만듭니다.
//! 예상 밖의 로그 형태가 수집을 중단시켜서는 안 되기 때문입니다.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use regex::Regex;

use logward_core::types::{LogEvent, LogLevel};

use crate::error::MonitorError;

/// 엄격한 라인 형태: `TIMESTAMP [LEVEL] rest`
///
/// TIMESTAMP는 ISO-8601 UTC (소수점 초 허용, 접미사 `Z` 필수),
/// LEVEL은 다섯 가지 대문자 토큰 중 하나여야 합니다.
const LINE_PATTERN: &str = r"^\s*(?P<ts>\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z)\s+\[(?P<lvl>INFO|WARN|ERROR|DEBUG|TRACE)\]\s+(?P<rest>.*)$";

/// 로그 라인 파서
///
/// `parse`는 총함수입니다 — 빈 문자열을 포함한 어떤 입력에 대해서도
/// 유효한 `LogEvent`를 반환하며 절대 실패하지 않습니다.
#[derive(Debug, Clone)]
pub struct LineParser {
    /// 컴파일된 라인 형태 정규식
    line_re: Regex,
}

impl LineParser {
    /// 새 파서를 생성합니다.
    ///
    /// 라인 형태 정규식을 컴파일하며, 생성 이후의 파싱은 실패하지 않습니다.
    pub fn new() -> Result<Self, MonitorError> {
        let line_re = Regex::new(LINE_PATTERN).map_err(|e| MonitorError::Pattern {
            name: "line_shape".to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self { line_re })
    }

    /// 원시 로그 라인을 `LogEvent`로 변환합니다.
    ///
    /// 엄격한 형태에 매칭되면 타임스탬프와 레벨을 추출하고,
    /// 매칭되지 않으면 폴백 정책을 적용합니다:
    /// `timestamp` = 현재 처리 시각(UTC), `level` = `INFO`,
    /// `message` = 전체 라인 트림.
    /// `raw`는 양쪽 경우 모두 개행만 제거한 원본 라인을 보존합니다.
    pub fn parse(&self, source: &str, raw_line: &str) -> LogEvent {
        let raw = raw_line.strip_suffix('\n').unwrap_or(raw_line);

        if let Some(caps) = self.line_re.captures(raw) {
            // 정규식이 형태를 보장하므로 그룹은 항상 존재
            let ts_str = caps.name("ts").map(|m| m.as_str()).unwrap_or_default();
            let lvl_str = caps.name("lvl").map(|m| m.as_str()).unwrap_or_default();
            let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or_default();

            // 형태는 맞지만 달력상 불가능한 날짜(13월 등)면 폴백으로 강등
            if let Ok(dt) = DateTime::parse_from_rfc3339(ts_str) {
                return LogEvent {
                    source: source.to_owned(),
                    timestamp: SystemTime::from(dt.with_timezone(&Utc)),
                    level: LogLevel::from_token(lvl_str).unwrap_or_default(),
                    message: rest.trim().to_owned(),
                    raw: raw.to_owned(),
                };
            }
        }

        metrics::counter!(logward_core::metrics::MONITOR_PARSE_FALLBACKS_TOTAL).increment(1);

        LogEvent {
            source: source.to_owned(),
            timestamp: SystemTime::now(),
            level: LogLevel::Info,
            message: raw.trim().to_owned(),
            raw: raw.to_owned(),
        }
    }
}
