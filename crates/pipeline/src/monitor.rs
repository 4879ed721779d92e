//! 처리량 모니터 -- 시작 배리어부터 완료까지의 벽시계 시간을 측정합니다.
//!
//! 세 가지 이벤트를 소비합니다: 소스 시작 전의 [`MonitorEvent::Start`],
//! 시퀀서가 종료 시점에 보고하는 [`MonitorEvent::Total`], 싱크가
//! 플러시를 마친 뒤의 [`MonitorEvent::Finished`]. 시작 시각과
//! (총 라인 수 또는 완료) 가 모두 알려질 때마다 레코드를 만들어
//! 결과 파일을 통째로 덮어씁니다 — 나중 레코드가 이전 것을 대체합니다.

use std::path::PathBuf;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info};

use gatewatch_core::types::ThroughputRecord;

use crate::error::PipelineError;

/// 모니터가 소비하는 이벤트
#[derive(Debug, Clone, Copy)]
pub enum MonitorEvent {
    /// 소스 시작 직전의 시작 배리어
    Start(Instant),
    /// 입력 총 라인 수 (시퀀서의 종료 보고)
    Total(u64),
    /// 침입 스트림의 종료 (싱크 플러시 완료)
    Finished,
}

/// 처리량 측정 상태
///
/// 연산자 태스크와 분리된 순수 상태 기계입니다.
pub struct ThroughputMonitor {
    start: Option<Instant>,
    total: Option<u64>,
    finished: bool,
}

impl ThroughputMonitor {
    /// 새 모니터를 생성합니다.
    pub fn new() -> Self {
        Self {
            start: None,
            total: None,
            finished: false,
        }
    }

    /// 이벤트를 관찰하고, 기록할 수 있으면 레코드를 반환합니다.
    ///
    /// 시작 시각과 (총 라인 수 또는 완료)가 모두 알려진 경우에만
    /// 레코드가 나옵니다. 경과 시간은 관찰 시점 기준입니다.
    pub fn observe(&mut self, event: MonitorEvent) -> Option<ThroughputRecord> {
        match event {
            MonitorEvent::Start(at) => self.start = Some(at),
            MonitorEvent::Total(lines) => self.total = Some(lines),
            MonitorEvent::Finished => self.finished = true,
        }

        let start = self.start?;
        if self.total.is_none() && !self.finished {
            return None;
        }

        let elapsed_secs = start.elapsed().as_secs_f64();
        let total_lines = self.total.unwrap_or(0);
        let throughput = if elapsed_secs > 0.0 {
            total_lines as f64 / elapsed_secs
        } else {
            0.0
        };
        Some(ThroughputRecord {
            elapsed_secs,
            total_lines,
            throughput,
        })
    }
}

impl Default for ThroughputMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// 모니터 태스크를 실행합니다. 마지막으로 기록한 레코드를 반환합니다.
///
/// 레코드가 나올 때마다 결과 파일을 덮어쓰고 플러시합니다.
/// 모든 송신자가 닫히면 종료합니다.
pub async fn run_monitor(
    mut rx: mpsc::Receiver<MonitorEvent>,
    path: PathBuf,
) -> Result<Option<ThroughputRecord>, PipelineError> {
    let mut monitor = ThroughputMonitor::new();
    let mut last = None;

    while let Some(event) = rx.recv().await {
        if let Some(record) = monitor.observe(event) {
            debug!(record = %record, "throughput record");
            tokio::fs::write(&path, format!("{record}\n"))
                .await
                .map_err(|e| PipelineError::Sink {
                    path: path.display().to_string(),
                    reason: format!("write failed: {e}"),
                })?;
            last = Some(record);
        }
    }

    if let Some(record) = &last {
        info!(
            elapsed_secs = record.elapsed_secs,
            total_lines = record.total_lines,
            throughput = record.throughput,
            "throughput measured"
        );
    }
    Ok(last)
}
