//! Docker 로그 전송 구현
//!
//! [`DockerLogTransport`]는 bollard를 통해 Docker 데몬에 연결하여
//! 컨테이너별 로그 스트림(stdout + stderr)을 라인 단위로 공급합니다.
//!
//! 수신 청크는 UTF-8로 손실 허용 디코딩되며, 한 청크에 여러 라인이
//! 들어올 수 있으므로 분할 후 공백뿐인 라인은 건너뜁니다.

use std::sync::Arc;

use bollard::container::{LogOutput, LogsOptions};
use futures_util::StreamExt;
use futures_util::stream;

use crate::config::PipelineConfig;
use crate::error::MonitorError;

use super::{LineStream, LogTransport};

/// Docker 로그 전송
///
/// 내부적으로 `Arc<bollard::Docker>`를 사용하여 여러 피드 태스크가
/// 하나의 연결을 안전하게 공유합니다.
#[derive(Debug, Clone)]
pub struct DockerLogTransport {
    docker: Arc<bollard::Docker>,
}

impl DockerLogTransport {
    /// 플랫폼 기본 로컬 소켓으로 Docker에 연결합니다.
    pub fn connect_local() -> Result<Self, MonitorError> {
        let docker = bollard::Docker::connect_with_local_defaults().map_err(|e| {
            MonitorError::Transport(format!("failed to connect to docker: {e}"))
        })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// 지정된 소켓 경로로 Docker에 연결합니다.
    pub fn connect_with_socket(socket_path: &str) -> Result<Self, MonitorError> {
        let docker =
            bollard::Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| {
                    MonitorError::Transport(format!(
                        "failed to connect to docker at {socket_path}: {e}"
                    ))
                })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// 파이프라인 설정에 따라 연결합니다.
    ///
    /// `docker_socket`이 비어있으면 플랫폼 기본값을 사용합니다.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, MonitorError> {
        if config.docker_socket.is_empty() {
            Self::connect_local()
        } else {
            Self::connect_with_socket(&config.docker_socket)
        }
    }
}

impl LogTransport for DockerLogTransport {
    async fn stream_lines(
        &self,
        source: &str,
        follow: bool,
        tail: u64,
    ) -> Result<LineStream, MonitorError> {
        let options = LogsOptions::<String> {
            follow,
            stdout: true,
            stderr: true,
            tail: tail.to_string(),
            ..Default::default()
        };

        let source_name = source.to_owned();
        let lines = self
            .docker
            .logs(source, Some(options))
            .map(move |chunk| match chunk {
                Ok(output) => Ok(chunk_lines(output)),
                Err(e) => Err(MonitorError::Feed {
                    source_name: source_name.clone(),
                    reason: format!("docker log stream error: {e}"),
                }),
            })
            .flat_map(|result| match result {
                Ok(lines) => stream::iter(
                    lines
                        .into_iter()
                        .map(Ok)
                        .collect::<Vec<Result<String, MonitorError>>>(),
                ),
                Err(e) => stream::iter(vec![Err(e)]),
            });

        Ok(Box::pin(lines))
    }
}

/// 로그 청크를 라인 목록으로 분할합니다.
///
/// 공백뿐인 라인은 건너뜁니다.
fn chunk_lines(output: LogOutput) -> Vec<String> {
    let bytes = output.into_bytes();
    let text = String::from_utf8_lossy(&bytes);
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_owned())
        .collect()
}
