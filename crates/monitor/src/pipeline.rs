//! 파이프라인 오케스트레이션 — 수집/윈도우 플러시/리포트의 전체 흐름
//!
//! [`WindowMonitor`]는 core의 [`Pipeline`](logward_core::pipeline::Pipeline)
//! trait을 구현하여 데몬에서 start/stop/health_check 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! Transport -> Feeds (per-source task) -> SourceBuffers
//!                                             |
//!                        flush loop (poll tick, swap) -> Features -> Rules -> mpsc -> downstream
//! ```
//!
//! # 소스별 상태 기계
//! `Idle -> Accumulating -> Flushing -> Accumulating`
//! 버퍼가 비어있는 소스는 그 사이클에서 완전히 건너뜁니다 (0행 리포트 없음).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use logward_core::error::{LogwardError, PipelineError};
use logward_core::event::ReportEvent;
use logward_core::metrics as m;
use logward_core::pipeline::{HealthStatus, Pipeline};
use logward_core::types::{SourceReport, WindowReport};

use crate::config::PipelineConfig;
use crate::error::MonitorError;
use crate::features::FeatureExtractor;
use crate::feed::{self, LogTransport};
use crate::parser::LineParser;
use crate::rules::RuleEngine;
use crate::window::SourceBuffers;

/// 모니터 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum MonitorState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨 (재시작 불가)
    Stopped,
}

/// 윈도우 모니터 — 수집/윈도우 플러시/룰 평가의 전체 흐름을 관리합니다.
///
/// # 사용 예시
/// ```ignore
/// use logward_monitor::{DockerLogTransport, WindowMonitorBuilder};
///
/// let transport = DockerLogTransport::from_config(&config)?;
/// let (mut monitor, report_rx) = WindowMonitorBuilder::new()
///     .config(config)
///     .transport(transport)
///     .build()?;
///
/// // Pipeline trait으로 시작
/// monitor.start().await?;
/// ```
pub struct WindowMonitor<T: LogTransport> {
    /// 파이프라인 설정
    config: PipelineConfig,
    /// 현재 상태
    state: MonitorState,
    /// 로그 전송 계층
    transport: Arc<T>,
    /// 라인 파서 (피드마다 복제)
    parser: LineParser,
    /// 플러시 경로 (버퍼 + 추출기 + 룰 엔진)
    flusher: WindowFlusher,
    /// 소스별 윈도우 버퍼
    buffers: Arc<SourceBuffers>,
    /// 리포트 전송 채널 (모니터 -> downstream)
    report_tx: mpsc::Sender<ReportEvent>,
    /// 협조적 취소 토큰 (피드와 플러시 루프가 폴링)
    cancel: CancellationToken,
    /// 백그라운드 태스크 핸들
    tasks: Vec<tokio::task::JoinHandle<()>>,
    /// 플러시된 윈도우 카운터
    windows_flushed: Arc<AtomicU64>,
    /// 발화한 룰 히트 카운터
    rule_hits: Arc<AtomicU64>,
}

impl<T: LogTransport> WindowMonitor<T> {
    /// 현재 상태 이름을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            MonitorState::Initialized => "initialized",
            MonitorState::Running => "running",
            MonitorState::Stopped => "stopped",
        }
    }

    /// 지금까지 플러시된 윈도우 수를 반환합니다.
    pub fn windows_flushed(&self) -> u64 {
        self.windows_flushed.load(Ordering::Relaxed)
    }

    /// 지금까지 발화한 룰 히트 수를 반환합니다.
    pub fn rule_hits(&self) -> u64 {
        self.rule_hits.load(Ordering::Relaxed)
    }

    /// 현재 버퍼링된 이벤트 수를 반환합니다.
    pub fn buffered_events(&self) -> usize {
        self.buffers.total_buffered()
    }

    /// 파이프라인 설정에 대한 참조를 반환합니다.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl<T: LogTransport> Pipeline for WindowMonitor<T> {
    async fn start(&mut self) -> Result<(), LogwardError> {
        match self.state {
            MonitorState::Running => {
                return Err(PipelineError::AlreadyRunning.into());
            }
            MonitorState::Stopped => {
                // 취소 토큰이 이미 소모되었으므로 재시작은 지원하지 않음
                return Err(PipelineError::InitFailed(
                    "window monitor cannot be restarted after stop".to_owned(),
                )
                .into());
            }
            MonitorState::Initialized => {}
        }

        info!(
            sources = self.config.sources.len(),
            window_secs = self.config.window_secs,
            poll_interval_ms = self.config.poll_interval_ms,
            "starting window monitor"
        );

        // 소스별 피드 태스크 스폰 (병렬 생산자)
        for source in &self.config.sources {
            let task = tokio::spawn(feed::run_feed(
                Arc::clone(&self.transport),
                source.clone(),
                self.config.follow,
                self.config.tail,
                self.parser.clone(),
                Arc::clone(&self.buffers),
                self.cancel.clone(),
            ));
            self.tasks.push(task);
        }

        // 단일 플러시 루프 스폰 (단일 소비자)
        let flush_task = tokio::spawn(run_flush_loop(
            self.flusher.clone(),
            Duration::from_millis(self.config.poll_interval_ms),
            Duration::from_secs(self.config.window_secs),
            self.report_tx.clone(),
            self.cancel.clone(),
            Arc::clone(&self.windows_flushed),
            Arc::clone(&self.rule_hits),
        ));
        self.tasks.push(flush_task);

        self.state = MonitorState::Running;
        info!("window monitor started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), LogwardError> {
        if self.state != MonitorState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping window monitor");

        // 협조적 취소 — 피드와 플러시 루프가 토큰을 폴링하고 스스로 종료
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!(error = %e, "monitor task terminated abnormally");
            }
        }

        // 종료는 최선 노력 — 버퍼에 남은 이벤트는 드레인 없이 폐기
        let discarded = self.buffers.total_buffered();
        if discarded > 0 {
            info!(discarded, "discarding unflushed buffered events");
        }

        self.state = MonitorState::Stopped;
        info!("window monitor stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            MonitorState::Running => {
                if self.report_tx.is_closed() {
                    HealthStatus::Degraded("report channel closed".to_owned())
                } else {
                    HealthStatus::Healthy
                }
            }
            MonitorState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            MonitorState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 플러시 경로 — 버퍼 스왑에서 룰 평가까지
///
/// 플러시 루프 태스크가 소유하는 복제본으로 동작합니다.
#[derive(Clone)]
pub(crate) struct WindowFlusher {
    /// 소스별 윈도우 버퍼
    buffers: Arc<SourceBuffers>,
    /// 피처 추출기
    extractor: FeatureExtractor,
    /// 룰 엔진
    rules: RuleEngine,
    /// 윈도우 길이 (초, 리포트 헤더용)
    window_secs: u64,
}

impl WindowFlusher {
    /// 모든 소스를 한 번 드레인하여 리포트를 만듭니다.
    ///
    /// 각 소스의 버퍼는 빈 버퍼로 원자적으로 교체되고, 비어있던 소스는
    /// 이 사이클에서 건너뜁니다. 모든 소스가 비어있으면 항목 없는
    /// 리포트(헤더만)가 됩니다.
    pub(crate) fn flush_once(&self) -> WindowReport {
        let mut entries = Vec::new();

        let sources: Vec<String> = self.buffers.source_names().map(str::to_owned).collect();
        for source in &sources {
            let events = self.buffers.swap(source);
            if events.is_empty() {
                continue;
            }

            let features = self.extractor.extract(source, &events);
            let hits = self.rules.evaluate(&features);
            debug!(
                source = source.as_str(),
                total = features.total,
                hits = hits.len(),
                "flushed source window"
            );
            entries.push(SourceReport { features, hits });
        }

        WindowReport {
            window_secs: self.window_secs,
            entries,
        }
    }

    /// 현재 버퍼링된 이벤트 수를 반환합니다.
    fn total_buffered(&self) -> usize {
        self.buffers.total_buffered()
    }
}

/// 플러시 루프 본체
///
/// 짧은 폴링 간격으로 깨어나 마지막 플러시 이후 윈도우 길이가 지났으면
/// 전체 소스를 드레인합니다. 주기 정확도는 폴링 간격에 의해 제한됩니다.
async fn run_flush_loop(
    flusher: WindowFlusher,
    poll_interval: Duration,
    window: Duration,
    report_tx: mpsc::Sender<ReportEvent>,
    cancel: CancellationToken,
    windows_flushed: Arc<AtomicU64>,
    rule_hits: Arc<AtomicU64>,
) {
    let mut poll = tokio::time::interval(poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_flush = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("flush loop cancelled");
                break;
            }
            _ = poll.tick() => {
                if last_flush.elapsed() < window {
                    continue;
                }
                last_flush = tokio::time::Instant::now();

                let report = flusher.flush_once();
                windows_flushed.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(m::MONITOR_WINDOWS_FLUSHED_TOTAL).increment(1);

                let hit_count: u64 = report.entries.iter().map(|e| e.hits.len() as u64).sum();
                rule_hits.fetch_add(hit_count, Ordering::Relaxed);
                for entry in &report.entries {
                    for hit in &entry.hits {
                        metrics::counter!(
                            m::MONITOR_RULE_HITS_TOTAL,
                            "severity" => hit.severity.to_string()
                        )
                        .increment(1);
                    }
                }

                #[allow(clippy::cast_precision_loss)]
                metrics::gauge!(m::MONITOR_EVENTS_BUFFERED).set(flusher.total_buffered() as f64);

                info!(
                    entries = report.entries.len(),
                    hits = hit_count,
                    "window flushed"
                );

                // downstream이 사라지면 모니터 전체를 중단 (치명적)
                if report_tx.send(ReportEvent::new(report)).await.is_err() {
                    error!("report channel closed, stopping flush loop");
                    cancel.cancel();
                    break;
                }
            }
        }
    }
}

/// 윈도우 모니터 빌더
///
/// 모니터를 조립하고 필요한 채널을 생성합니다.
pub struct WindowMonitorBuilder<T: LogTransport> {
    config: PipelineConfig,
    transport: Option<Arc<T>>,
    report_tx: Option<mpsc::Sender<ReportEvent>>,
}

impl<T: LogTransport> WindowMonitorBuilder<T> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            transport: None,
            report_tx: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 로그 전송 계층을 지정합니다 (필수).
    pub fn transport(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// 외부 리포트 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn report_sender(mut self, tx: mpsc::Sender<ReportEvent>) -> Self {
        self.report_tx = Some(tx);
        self
    }

    /// 모니터를 빌드합니다.
    ///
    /// # Returns
    /// - `WindowMonitor`: 모니터 인스턴스
    /// - `Option<mpsc::Receiver<ReportEvent>>`: 리포트 수신 채널
    ///   (외부 report_sender를 설정한 경우 None)
    #[allow(clippy::type_complexity)]
    pub fn build(
        self,
    ) -> Result<(WindowMonitor<T>, Option<mpsc::Receiver<ReportEvent>>), MonitorError> {
        self.config.validate()?;

        let transport = self
            .transport
            .ok_or_else(|| MonitorError::Init("log transport is required".to_owned()))?;

        let (report_tx, report_rx) = match self.report_tx {
            Some(tx) => (tx, None),
            None => {
                let (tx, rx) = mpsc::channel(self.config.report_channel_capacity);
                (tx, Some(rx))
            }
        };

        let parser = LineParser::new()?;
        let extractor = FeatureExtractor::new()?;
        let buffers = Arc::new(SourceBuffers::new(&self.config.sources));

        let flusher = WindowFlusher {
            buffers: Arc::clone(&buffers),
            extractor,
            rules: RuleEngine::new(),
            window_secs: self.config.window_secs,
        };

        let monitor = WindowMonitor {
            config: self.config,
            state: MonitorState::Initialized,
            transport,
            parser,
            flusher,
            buffers,
            report_tx,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
            windows_flushed: Arc::new(AtomicU64::new(0)),
            rule_hits: Arc::new(AtomicU64::new(0)),
        };

        Ok((monitor, report_rx))
    }
}

impl<T: LogTransport> Default for WindowMonitorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::LineStream;
    use futures_util::stream;
    use logward_core::types::{IssueType, LogEvent, LogLevel};
    use std::time::SystemTime;

    /// 아무 라인도 공급하지 않는 전송
    struct NullTransport;

    impl LogTransport for NullTransport {
        async fn stream_lines(
            &self,
            _source: &str,
            _follow: bool,
            _tail: u64,
        ) -> Result<LineStream, MonitorError> {
            Ok(Box::pin(stream::empty::<Result<String, MonitorError>>()))
        }
    }

    fn event(source: &str, level: LogLevel, message: &str) -> LogEvent {
        LogEvent {
            source: source.to_owned(),
            timestamp: SystemTime::now(),
            level,
            message: message.to_owned(),
            raw: message.to_owned(),
        }
    }

    fn test_flusher(sources: &[&str], window_secs: u64) -> WindowFlusher {
        let names: Vec<String> = sources.iter().map(|s| (*s).to_owned()).collect();
        WindowFlusher {
            buffers: Arc::new(SourceBuffers::new(&names)),
            extractor: FeatureExtractor::new().unwrap(),
            rules: RuleEngine::new(),
            window_secs,
        }
    }

    #[test]
    fn builder_creates_monitor() {
        let (monitor, report_rx) = WindowMonitorBuilder::new()
            .transport(NullTransport)
            .build()
            .unwrap();
        assert_eq!(monitor.state_name(), "initialized");
        assert!(report_rx.is_some());
    }

    #[test]
    fn builder_with_external_report_sender() {
        let (report_tx, _report_rx) = mpsc::channel(8);
        let (_monitor, rx) = WindowMonitorBuilder::new()
            .transport(NullTransport)
            .report_sender(report_tx)
            .build()
            .unwrap();
        // 외부 sender를 쓰면 내부 receiver는 없음
        assert!(rx.is_none());
    }

    #[test]
    fn builder_requires_transport() {
        let result = WindowMonitorBuilder::<NullTransport>::new().build();
        assert!(matches!(result, Err(MonitorError::Init(_))));
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let config = PipelineConfig {
            window_secs: 0,
            ..Default::default()
        };
        let result = WindowMonitorBuilder::new()
            .config(config)
            .transport(NullTransport)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn monitor_accessors_start_at_zero() {
        let (monitor, _rx) = WindowMonitorBuilder::new()
            .transport(NullTransport)
            .build()
            .unwrap();
        assert_eq!(monitor.windows_flushed(), 0);
        assert_eq!(monitor.rule_hits(), 0);
        assert_eq!(monitor.buffered_events(), 0);
    }

    #[tokio::test]
    async fn stop_before_start_fails() {
        let (mut monitor, _rx) = WindowMonitorBuilder::new()
            .transport(NullTransport)
            .build()
            .unwrap();
        assert!(monitor.stop().await.is_err());
    }

    #[tokio::test]
    async fn double_start_fails() {
        let (mut monitor, _rx) = WindowMonitorBuilder::new()
            .transport(NullTransport)
            .build()
            .unwrap();
        monitor.start().await.unwrap();
        assert!(monitor.start().await.is_err());
        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn restart_after_stop_fails() {
        let (mut monitor, _rx) = WindowMonitorBuilder::new()
            .transport(NullTransport)
            .build()
            .unwrap();
        monitor.start().await.unwrap();
        monitor.stop().await.unwrap();
        assert!(monitor.start().await.is_err());
    }

    #[tokio::test]
    async fn health_follows_lifecycle() {
        let (mut monitor, _rx) = WindowMonitorBuilder::new()
            .transport(NullTransport)
            .build()
            .unwrap();
        assert!(monitor.health_check().await.is_unhealthy());

        monitor.start().await.unwrap();
        assert!(monitor.health_check().await.is_healthy());

        monitor.stop().await.unwrap();
        assert!(monitor.health_check().await.is_unhealthy());
        assert_eq!(monitor.state_name(), "stopped");
    }

    #[test]
    fn flush_once_skips_empty_sources() {
        let flusher = test_flusher(&["a", "b"], 10);
        flusher
            .buffers
            .push("a", event("a", LogLevel::Info, "hello"));

        let report = flusher.flush_once();
        assert_eq!(report.window_secs, 10);
        // 비어있던 b는 항목이 없어야 함
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].features.source, "a");
    }

    #[test]
    fn flush_once_empty_everywhere_yields_header_only_report() {
        let flusher = test_flusher(&["a"], 10);
        let report = flusher.flush_once();
        assert!(report.entries.is_empty());
        assert_eq!(report.to_string(), "window flush (10s)");
    }

    #[test]
    fn flush_once_clears_buffers() {
        let flusher = test_flusher(&["a"], 10);
        flusher.buffers.push("a", event("a", LogLevel::Info, "x"));
        let _ = flusher.flush_once();
        assert_eq!(flusher.total_buffered(), 0);

        // 두 번째 플러시는 빈 리포트
        let second = flusher.flush_once();
        assert!(second.entries.is_empty());
    }

    #[test]
    fn flush_once_evaluates_rules() {
        let flusher = test_flusher(&["svc"], 10);
        for _ in 0..2 {
            flusher.buffers.push(
                "svc",
                event("svc", LogLevel::Warn, "Failed password for root"),
            );
        }

        let report = flusher.flush_once();
        let hits = &report.entries[0].hits;
        assert!(
            hits.iter()
                .any(|h| h.issue_type == IssueType::BruteforceAttempts)
        );
    }

    #[test]
    fn flush_once_preserves_configured_source_order() {
        let flusher = test_flusher(&["zeta", "alpha"], 10);
        flusher
            .buffers
            .push("alpha", event("alpha", LogLevel::Info, "a"));
        flusher
            .buffers
            .push("zeta", event("zeta", LogLevel::Info, "z"));

        let report = flusher.flush_once();
        // 알파벳순이 아니라 설정 순서
        assert_eq!(report.entries[0].features.source, "zeta");
        assert_eq!(report.entries[1].features.source, "alpha");
    }
}
