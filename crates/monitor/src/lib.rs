#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`parser`]: 원시 로그 라인 → [`LogEvent`](logward_core::types::LogEvent) 파서 (총함수, 실패 없음)
//! - [`detect`]: 고정 키워드 목록 및 컴파일된 탐지 패턴 테이블
//! - [`features`]: 윈도우 단위 통계/패턴 피처 추출기
//! - [`rules`]: 피처 요약에 대한 고정 룰 테이블 평가
//! - [`window`]: 소스별 잠금 버퍼 및 원자적 스왑 드레인
//! - [`feed`]: 로그 전송 계층 trait 및 Docker 구현, 소스별 피드 태스크
//! - [`pipeline`]: 전체 오케스트레이션 (Pipeline trait 구현)
//! - [`config`]: 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! Transport -> Feeds -> LineParser -> SourceBuffers -> [timer] -> FeatureExtractor -> RuleEngine -> ReportEvent
//!     |          |                        |                            |                  |
//!  Docker    per-source task      per-source Mutex + swap       keyword/pattern      fixed thresholds
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod features;
pub mod parser;
pub mod pipeline;
pub mod rules;
pub mod window;

pub mod feed;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{WindowMonitor, WindowMonitorBuilder};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::MonitorError;

// 파서
pub use parser::LineParser;

// 피처 추출
pub use features::FeatureExtractor;

// 탐지 테이블
pub use detect::{KEYWORDS, PatternSet};

// 룰 엔진
pub use rules::RuleEngine;

// 윈도우 버퍼
pub use window::SourceBuffers;

// 피드
pub use feed::{DockerLogTransport, LineStream, LogTransport};
