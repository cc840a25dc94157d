use anyhow::Result;
use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};

use logward_core::config::LogwardConfig;
use logward_core::pipeline::Pipeline;
use logward_monitor::{DockerLogTransport, PipelineConfig, WindowMonitorBuilder};

use logward_daemon::cli::DaemonCli;
use logward_daemon::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // 설정 로드 (파일이 없으면 기본값) + CLI 오버라이드
    let mut config = LogwardConfig::load_or_default(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    // 로깅 초기화
    logging::init_tracing(&config.general)?;
    tracing::info!("logward-daemon starting");

    if !config.monitor.enabled {
        tracing::warn!("monitor is disabled in configuration, nothing to do");
        return Ok(());
    }

    // 윈도우 모니터 빌드
    let pipeline_config = PipelineConfig::from_core(&config.monitor);
    let transport = DockerLogTransport::from_config(&pipeline_config)
        .map_err(|e| anyhow::anyhow!("failed to create docker transport: {}", e))?;

    let (mut monitor, report_rx) = WindowMonitorBuilder::new()
        .config(pipeline_config)
        .transport(transport)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build window monitor: {}", e))?;
    let mut report_rx =
        report_rx.ok_or_else(|| anyhow::anyhow!("report receiver was not created"))?;

    // 모니터 시작
    monitor
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("failed to start window monitor: {}", e))?;
    tracing::info!("window monitor started — streaming logs");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    // 리포트 싱크 루프 — 플러시 리포트를 stdout에 출력
    let mut monitor_failed = false;
    loop {
        tokio::select! {
            maybe_report = report_rx.recv() => match maybe_report {
                Some(event) => {
                    tracing::debug!(
                        report_id = %event.id,
                        entries = event.report.entries.len(),
                        "report received"
                    );
                    println!("\n{}", event.report);
                }
                None => {
                    tracing::error!("report channel closed unexpectedly");
                    monitor_failed = true;
                    break;
                }
            },
            _ = sigterm.recv() => {
                tracing::info!(signal = "SIGTERM", "shutdown signal received");
                break;
            }
            _ = sigint.recv() => {
                tracing::info!(signal = "SIGINT", "shutdown signal received");
                break;
            }
        }
    }

    // 우아한 종료 — 버퍼에 남은 이벤트는 드레인 없이 폐기 (최선 노력)
    if let Err(e) = monitor.stop().await {
        tracing::error!(error = %e, "failed to stop window monitor");
    }

    if monitor_failed {
        return Err(anyhow::anyhow!("window monitor terminated unexpectedly"));
    }

    tracing::info!("logward-daemon shut down");
    Ok(())
}
