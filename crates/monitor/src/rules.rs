//! 룰 엔진 — 윈도우 피처 요약에 대한 고정 룰 테이블 평가
//!
//! 룰은 아래 고정 순서로 평가되며 상호 배타적이지 않습니다 —
//! 해당되는 모든 룰이 발화합니다. 각 히트의 `reason`에는 판정을 유발한
//! 수치가 감사 목적으로 포함됩니다.
//!
//! 룰은 윈도우 간 상태를 갖지 않습니다. 어떤 룰도 이전 윈도우의
//! 이력을 참조하지 않으며, 임계값은 런타임에 변경할 수 없는 상수입니다.

use logward_core::types::{IssueType, RuleHit, Severity, WindowFeatures};

use crate::detect::{
    PATTERN_BASE64_DECODE, PATTERN_CURL_PIPE_BASH, PATTERN_FAILED_PASSWORD, PATTERN_PORT_SCAN,
    PATTERN_REVERSE_SHELL,
};

/// crash_loop_or_misconfig: 최소 이벤트 수
const CRASH_LOOP_MIN_TOTAL: usize = 5;
/// crash_loop_or_misconfig: 최소 에러 수
const CRASH_LOOP_MIN_ERRORS: u32 = 2;
/// crash_loop_or_misconfig: 최소 반복 비율
const CRASH_LOOP_MIN_REPEAT_RATIO: f64 = 0.6;
/// service_errors: 최소 에러 수
const SERVICE_ERRORS_MIN: u32 = 3;
/// bruteforce_attempts: 최소 로그인 실패 히트 수
const BRUTEFORCE_MIN_HITS: u32 = 2;

/// 룰 엔진
///
/// 하나의 [`WindowFeatures`]를 받아 발화한 [`RuleHit`] 목록을 반환합니다.
/// 순수 함수이며 윈도우 간 상태가 없습니다.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine;

impl RuleEngine {
    /// 새 룰 엔진을 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 고정 룰 테이블을 순서대로 평가합니다.
    pub fn evaluate(&self, feat: &WindowFeatures) -> Vec<RuleHit> {
        let mut hits = Vec::new();

        // 크래시 루프 / 설정 오류 신호: 높은 반복률 + 에러
        if feat.total >= CRASH_LOOP_MIN_TOTAL
            && feat.error >= CRASH_LOOP_MIN_ERRORS
            && feat.repeat_ratio >= CRASH_LOOP_MIN_REPEAT_RATIO
        {
            hits.push(RuleHit {
                issue_type: IssueType::CrashLoopOrMisconfig,
                severity: Severity::High,
                reason: format!(
                    "repeat_ratio={}, error={}, total={}",
                    feat.repeat_ratio, feat.error, feat.total,
                ),
            });
        }

        // 일반적인 불안정성
        if feat.error >= SERVICE_ERRORS_MIN {
            hits.push(RuleHit {
                issue_type: IssueType::ServiceErrors,
                severity: Severity::Medium,
                reason: format!("errors={}", feat.error),
            });
        }

        // 의심스러운 명령 실행 흔적
        if feat.pattern(PATTERN_CURL_PIPE_BASH) > 0 || feat.keyword("curl") > 0 {
            hits.push(RuleHit {
                issue_type: IssueType::SuspiciousCommand,
                severity: Severity::High,
                reason: "curl execution pattern observed".to_owned(),
            });
        }

        if feat.pattern(PATTERN_BASE64_DECODE) > 0 || feat.keyword("base64") > 0 {
            hits.push(RuleHit {
                issue_type: IssueType::EncodedPayloadActivity,
                severity: Severity::High,
                reason: "base64 decode pattern observed".to_owned(),
            });
        }

        if feat.pattern(PATTERN_REVERSE_SHELL) > 0 || feat.keyword("reverse shell") > 0 {
            hits.push(RuleHit {
                issue_type: IssueType::ReverseShellIndicator,
                severity: Severity::High,
                reason: "reverse shell indicator observed".to_owned(),
            });
        }

        // 무차별 대입 / 스캔 / 소음 행위
        let failed_password_hits = feat
            .pattern(PATTERN_FAILED_PASSWORD)
            .max(feat.keyword("failed password"));
        if failed_password_hits >= BRUTEFORCE_MIN_HITS {
            hits.push(RuleHit {
                issue_type: IssueType::BruteforceAttempts,
                severity: Severity::High,
                reason: format!("failed_password_hits={failed_password_hits}"),
            });
        }

        if feat.pattern(PATTERN_PORT_SCAN) > 0 || feat.keyword("portscan") > 0 {
            hits.push(RuleHit {
                issue_type: IssueType::PortScanActivity,
                severity: Severity::Medium,
                reason: "port scan indicators observed".to_owned(),
            });
        }

        // 의존 서비스 다운 / 연결 거부
        if feat.keyword("refused") > 0 || feat.keyword("timeout") > 0 {
            hits.push(RuleHit {
                issue_type: IssueType::DependencyDownOrNetwork,
                severity: Severity::Medium,
                reason: "connection refused / timeout indicators".to_owned(),
            });
        }

        hits
    }
}
