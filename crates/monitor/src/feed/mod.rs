//! 피드 계층 — 전송 trait 및 소스별 수집 태스크
//!
//! 전송(transport)은 소스별 원시 텍스트 라인 스트림을 공급하는 외부
//! 협력자입니다. 전달 순서/보장은 "피드가 건강한 동안의 소스별 삽입
//! 순서" 이상을 가정하지 않습니다.
//!
//! # 장애 격리
//! 한 소스의 피드가 실패하면 해당 소스에 합성 ERROR 이벤트 하나를
//! 남기고 그 피드만 종료합니다. 다른 소스의 피드와 플러시 루프는
//! 영향을 받지 않으며, 실패한 피드의 재시도는 수행하지 않습니다.

pub mod docker;

pub use docker::DockerLogTransport;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::SystemTime;

use futures_util::Stream;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use logward_core::metrics as m;
use logward_core::types::{LogEvent, LogLevel};

use crate::error::MonitorError;
use crate::parser::LineParser;
use crate::window::SourceBuffers;

/// 소스별 원시 라인 스트림
///
/// 각 항목은 개행이 제거된 한 줄의 UTF-8 텍스트이거나,
/// 스트림 중단을 알리는 에러입니다.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, MonitorError>> + Send>>;

/// 로그 전송 trait
///
/// 소스 식별자에 대한 라인 스트림을 제공합니다. 프로덕션 구현은
/// [`DockerLogTransport`]이며, 테스트는 스크립트된 구현을 사용합니다.
pub trait LogTransport: Send + Sync + 'static {
    /// 해당 소스의 로그 라인 스트림을 엽니다.
    ///
    /// `follow`가 참이면 초기 백로그(`tail` 라인) 이후에도 새 라인을
    /// 계속 전달하고, 거짓이면 백로그만 전달하고 스트림을 종료합니다.
    fn stream_lines(
        &self,
        source: &str,
        follow: bool,
        tail: u64,
    ) -> impl Future<Output = Result<LineStream, MonitorError>> + Send;
}

/// 소스별 피드 태스크 본체
///
/// 전송에서 스트림을 얻어 라인마다 파싱하고 해당 소스의 버퍼에
/// 추가합니다. 취소 토큰은 협조적으로 폴링되며, 스트림 종료/실패
/// 시 태스크가 끝납니다.
pub(crate) async fn run_feed<T: LogTransport>(
    transport: Arc<T>,
    source: String,
    follow: bool,
    tail: u64,
    parser: LineParser,
    buffers: Arc<SourceBuffers>,
    cancel: CancellationToken,
) {
    let mut stream = tokio::select! {
        _ = cancel.cancelled() => return,
        result = transport.stream_lines(&source, follow, tail) => match result {
            Ok(stream) => stream,
            Err(e) => {
                record_feed_failure(&buffers, &source, &e);
                return;
            }
        },
    };

    debug!(source = source.as_str(), follow, tail, "log feed started");
    let lines_counter =
        metrics::counter!(m::MONITOR_LINES_INGESTED_TOTAL, "source" => source.clone());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(source = source.as_str(), "log feed cancelled");
                break;
            }
            next = stream.next() => match next {
                Some(Ok(line)) => {
                    let event = parser.parse(&source, &line);
                    buffers.push(&source, event);
                    lines_counter.increment(1);
                }
                Some(Err(e)) => {
                    record_feed_failure(&buffers, &source, &e);
                    break;
                }
                None => {
                    debug!(source = source.as_str(), "log stream ended");
                    break;
                }
            }
        }
    }
}

/// 피드 실패를 합성 ERROR 이벤트 하나로 기록합니다.
fn record_feed_failure(buffers: &SourceBuffers, source: &str, error: &MonitorError) {
    warn!(
        source,
        error = %error,
        "log feed failed, emitting synthetic error event"
    );
    metrics::counter!(m::MONITOR_FEED_FAILURES_TOTAL, "source" => source.to_owned())
        .increment(1);

    let message = format!("log feed failed: {error}");
    let event = LogEvent {
        source: source.to_owned(),
        timestamp: SystemTime::now(),
        level: LogLevel::Error,
        message: message.clone(),
        raw: message,
    };
    buffers.push(source, event);
}
