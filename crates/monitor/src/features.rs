//! 윈도우 피처 추출기
//!
//! 한 소스의 윈도우 분량 이벤트 시퀀스를 고정 형태의
//! [`WindowFeatures`] 통계 요약으로 변환합니다.
//!
//! 추출은 순수 함수입니다 — 부수 효과가 없고, 입력을 변경하지 않으며,
//! 동일 입력에 대해 항상 동일한 결과를 반환합니다.

use std::collections::{BTreeMap, HashSet};

use logward_core::types::{LogEvent, LogLevel, WindowFeatures};

use crate::detect::{KEYWORDS, PatternSet};
use crate::error::MonitorError;

/// 윈도우 피처 추출기
///
/// 레벨별 카운트, 고유/반복 메시지 비율, 키워드/패턴 히트를 계산합니다.
/// `keyword_hits`와 `pattern_hits`는 설정된 모든 키를 0으로 채워 반환하므로
/// 소비자는 존재 여부 검사 없이 바로 조회할 수 있습니다.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    /// 컴파일된 탐지 패턴
    patterns: PatternSet,
}

impl FeatureExtractor {
    /// 고정 탐지 테이블을 컴파일하여 새 추출기를 생성합니다.
    pub fn new() -> Result<Self, MonitorError> {
        Ok(Self {
            patterns: PatternSet::compile()?,
        })
    }

    /// 이벤트 시퀀스에서 윈도우 피처를 추출합니다.
    ///
    /// - 레벨 카운트: 파서와 독립적으로 한 번 더 정규화하여,
    ///   네 가지 카운트 열(DEBUG/INFO/WARN/ERROR)에 없는 레벨(TRACE)은
    ///   `info`로 집계합니다.
    /// - `uniq_ratio`: 트림 후 비어있지 않은 고유 메시지 수 / 전체
    ///   (total==0이면 0). `repeat_ratio`는 `1 - uniq_ratio` (total==0이면 0).
    /// - 키워드/패턴: 메시지 내 반복 출현과 무관하게
    ///   이벤트당 키워드당/패턴당 최대 1씩 증가합니다.
    /// - 비율은 소수점 4자리로 반올림합니다.
    pub fn extract(&self, source: &str, events: &[LogEvent]) -> WindowFeatures {
        let total = events.len();

        let mut debug = 0u32;
        let mut info = 0u32;
        let mut warn = 0u32;
        let mut error = 0u32;
        for event in events {
            match event.level {
                LogLevel::Debug => debug += 1,
                LogLevel::Warn => warn += 1,
                LogLevel::Error => error += 1,
                LogLevel::Info | LogLevel::Trace => info += 1,
            }
        }

        let uniq = events
            .iter()
            .map(|e| e.message.trim())
            .filter(|m| !m.is_empty())
            .collect::<HashSet<_>>()
            .len();

        let (uniq_ratio, repeat_ratio) = if total > 0 {
            let uniq_ratio = round4(uniq as f64 / total as f64);
            (uniq_ratio, round4(1.0 - uniq_ratio))
        } else {
            (0.0, 0.0)
        };

        let mut keyword_hits: BTreeMap<String, u32> =
            KEYWORDS.iter().map(|k| ((*k).to_owned(), 0)).collect();
        for event in events {
            let folded = event.message.to_lowercase();
            for keyword in KEYWORDS {
                if folded.contains(keyword) {
                    if let Some(count) = keyword_hits.get_mut(*keyword) {
                        *count += 1;
                    }
                }
            }
        }

        let mut pattern_hits: BTreeMap<String, u32> =
            self.patterns.names().map(|n| (n.to_owned(), 0)).collect();
        for event in events {
            for (name, regex) in self.patterns.iter() {
                if regex.is_match(&event.message) {
                    if let Some(count) = pattern_hits.get_mut(name) {
                        *count += 1;
                    }
                }
            }
        }

        WindowFeatures {
            source: source.to_owned(),
            total,
            debug,
            info,
            warn,
            error,
            uniq_ratio,
            repeat_ratio,
            keyword_hits,
            pattern_hits,
        }
    }
}

/// 소수점 4자리로 반올림합니다.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
