//! 소스별 윈도우 버퍼 — 잠금 컨테이너 및 원자적 스왑 드레인
//!
//! 피드 태스크(생산자)와 플러시 루프(소비자)가 공유하는 유일한
//! 가변 자원입니다. 소스마다 독립된 뮤텍스를 사용하므로 한 소스의
//! 드레인이 다른 소스의 수집을 막지 않습니다.
//!
//! 드레인은 제자리 clear가 아니라 빈 버퍼로의 교체(`mem::take`)로
//! 수행되어, 비동기화 공유 컨테이너에서 발생하는 갱신 유실/불일치
//! 읽기 경쟁이 원천적으로 제거됩니다.

use std::mem;
use std::sync::{Mutex, PoisonError};

use logward_core::types::LogEvent;

/// 소스별 윈도우 버퍼 집합
///
/// 버퍼 목록은 생성 시점에 고정되며, 설정에 없는 소스로의 추가는
/// 거부됩니다. 소스 순회 순서는 설정된 순서를 따릅니다.
pub struct SourceBuffers {
    /// (소스 이름, 이벤트 버퍼) — 설정 순서 유지
    buffers: Vec<(String, Mutex<Vec<LogEvent>>)>,
}

impl SourceBuffers {
    /// 지정된 소스 목록으로 버퍼 집합을 생성합니다.
    pub fn new(sources: &[String]) -> Self {
        let buffers = sources
            .iter()
            .map(|name| (name.clone(), Mutex::new(Vec::new())))
            .collect();
        Self { buffers }
    }

    /// 이벤트를 해당 소스의 버퍼에 추가합니다 (도착 순서 보존).
    ///
    /// 알 수 없는 소스면 `false`를 반환하고 이벤트를 버립니다.
    pub fn push(&self, source: &str, event: LogEvent) -> bool {
        match self.find(source) {
            Some(buffer) => {
                let mut guard = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                guard.push(event);
                true
            }
            None => {
                tracing::warn!(source, "dropping event for unknown source");
                false
            }
        }
    }

    /// 해당 소스의 버퍼를 빈 버퍼로 원자적으로 교체하고,
    /// 기존 내용을 반환합니다.
    ///
    /// 알 수 없는 소스면 빈 Vec을 반환합니다.
    pub fn swap(&self, source: &str) -> Vec<LogEvent> {
        match self.find(source) {
            Some(buffer) => {
                let mut guard = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                mem::take(&mut *guard)
            }
            None => Vec::new(),
        }
    }

    /// 해당 소스에 현재 버퍼링된 이벤트 수를 반환합니다.
    pub fn buffered(&self, source: &str) -> usize {
        self.find(source)
            .map(|buffer| {
                buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len()
            })
            .unwrap_or(0)
    }

    /// 전체 소스에 걸쳐 버퍼링된 이벤트 수를 반환합니다.
    pub fn total_buffered(&self) -> usize {
        self.buffers
            .iter()
            .map(|(_, buffer)| {
                buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len()
            })
            .sum()
    }

    /// 소스 이름을 설정된 순서로 순회합니다.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.buffers.iter().map(|(name, _)| name.as_str())
    }

    /// 등록된 소스 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// 소스가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// 소스 이름으로 버퍼를 찾습니다.
    ///
    /// 소스 수는 적으므로 선형 탐색으로 충분합니다.
    fn find(&self, source: &str) -> Option<&Mutex<Vec<LogEvent>>> {
        self.buffers
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, buffer)| buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logward_core::types::LogLevel;
    use std::sync::Arc;
    use std::time::SystemTime;

    fn sources(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    fn event(source: &str, message: &str) -> LogEvent {
        LogEvent {
            source: source.to_owned(),
            timestamp: SystemTime::now(),
            level: LogLevel::Info,
            message: message.to_owned(),
            raw: message.to_owned(),
        }
    }

    #[test]
    fn push_and_swap() {
        let buffers = SourceBuffers::new(&sources(&["a", "b"]));
        assert!(buffers.push("a", event("a", "one")));
        assert!(buffers.push("a", event("a", "two")));
        assert!(buffers.push("b", event("b", "three")));

        let drained = buffers.swap("a");
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "one");
        assert_eq!(drained[1].message, "two");

        // 스왑 후 버퍼는 빈 상태
        assert_eq!(buffers.buffered("a"), 0);
        assert_eq!(buffers.buffered("b"), 1);
    }

    #[test]
    fn swap_preserves_arrival_order() {
        let buffers = SourceBuffers::new(&sources(&["a"]));
        for i in 0..10 {
            buffers.push("a", event("a", &format!("msg-{i}")));
        }
        let drained = buffers.swap("a");
        for (i, evt) in drained.iter().enumerate() {
            assert_eq!(evt.message, format!("msg-{i}"));
        }
    }

    #[test]
    fn unknown_source_is_rejected() {
        let buffers = SourceBuffers::new(&sources(&["a"]));
        assert!(!buffers.push("zzz", event("zzz", "lost")));
        assert_eq!(buffers.total_buffered(), 0);
        assert!(buffers.swap("zzz").is_empty());
        assert_eq!(buffers.buffered("zzz"), 0);
    }

    #[test]
    fn swap_empty_buffer_returns_empty_vec() {
        let buffers = SourceBuffers::new(&sources(&["a"]));
        assert!(buffers.swap("a").is_empty());
    }

    #[test]
    fn source_names_follow_configured_order() {
        let buffers = SourceBuffers::new(&sources(&["web", "db", "cache"]));
        let names: Vec<&str> = buffers.source_names().collect();
        assert_eq!(names, vec!["web", "db", "cache"]);
        assert_eq!(buffers.len(), 3);
        assert!(!buffers.is_empty());
    }

    #[test]
    fn total_buffered_sums_all_sources() {
        let buffers = SourceBuffers::new(&sources(&["a", "b"]));
        buffers.push("a", event("a", "1"));
        buffers.push("b", event("b", "2"));
        buffers.push("b", event("b", "3"));
        assert_eq!(buffers.total_buffered(), 3);
    }

    #[tokio::test]
    async fn concurrent_pushes_are_not_lost() {
        let buffers = Arc::new(SourceBuffers::new(&sources(&["a", "b"])));

        let mut handles = Vec::new();
        for task in 0..8 {
            let buffers = Arc::clone(&buffers);
            let source = if task % 2 == 0 { "a" } else { "b" };
            handles.push(tokio::spawn(async move {
                for i in 0..100 {
                    buffers.push(source, event(source, &format!("{task}-{i}")));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(buffers.total_buffered(), 800);
        assert_eq!(buffers.swap("a").len(), 400);
        assert_eq!(buffers.swap("b").len(), 400);
        assert_eq!(buffers.total_buffered(), 0);
    }

    #[tokio::test]
    async fn concurrent_swap_and_push_never_duplicates() {
        let buffers = Arc::new(SourceBuffers::new(&sources(&["a"])));
        const TOTAL: usize = 2_000;

        let producer = {
            let buffers = Arc::clone(&buffers);
            tokio::spawn(async move {
                for i in 0..TOTAL {
                    buffers.push("a", event("a", &format!("{i}")));
                    if i % 256 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        };

        let consumer = {
            let buffers = Arc::clone(&buffers);
            tokio::spawn(async move {
                let mut seen = 0usize;
                while seen < TOTAL {
                    seen += buffers.swap("a").len();
                    tokio::task::yield_now().await;
                }
                seen
            })
        };

        producer.await.unwrap();
        let seen = consumer.await.unwrap();
        // 스왑 드레인은 유실도 중복도 없어야 함
        assert_eq!(seen, TOTAL);
        assert_eq!(buffers.total_buffered(), 0);
    }
}
