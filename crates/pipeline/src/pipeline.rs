//! 파이프라인 오케스트레이션 -- 채널 배선, 태스크 스폰, 완료 대기.
//!
//! [`Pipeline::run`]은 연산자마다 하나의 tokio 태스크를 스폰하고
//! 유한 용량 mpsc 채널로 연결합니다 (가득 차면 생산자가 대기하는
//! 백프레셔). 데이터플로는 비순환이므로 교착은 없습니다.
//!
//! ```text
//! Source -> Sequencer -> [parse xP + merge] -> Classifier -+-> Resequencer -> [parse xP + merge] -> SuspectFinder -+
//!                                                          |                                                       v
//!                                                          +-> Success ------------------------------------> Correlator -> Sink
//! ```
//!
//! 종료는 펑추에이션 전파입니다: 각 연산자는 입력의 Eos를 받으면
//! 마지막 출력을 내보내고 Eos를 전달한 뒤 끝납니다. 실패한 태스크는
//! 자기 출력 채널을 닫는 것으로 다운스트림에 종료를 전파합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::info;

use gatewatch_core::stream::Numbered;

use crate::classify::run_classifier;
use crate::config::PipelineConfig;
use crate::correlate::run_correlator;
use crate::error::PipelineError;
use crate::fanout::spawn_parse_region;
use crate::monitor::{MonitorEvent, run_monitor};
use crate::parser::{parse_failure, parse_log_line};
use crate::sequencer::run_sequencer;
use crate::sink::run_sink;
use crate::source::LineSource;
use crate::window::run_suspect_finder;

/// 모니터 이벤트 채널 용량 — 이벤트는 세 종류뿐이다
const MONITOR_CHANNEL_CAPACITY: usize = 16;

/// 한 번의 배치 실행 결과 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 입력 총 라인 수
    pub total_lines: u64,
    /// 인증 실패 라인 수
    pub failures: u64,
    /// 성공 로그인 수
    pub successes: u64,
    /// 방출된 의심 계정 수
    pub suspects: u64,
    /// 탐지된 침입 수
    pub breakins: u64,
    /// 파싱 실패로 건너뛴 레코드 수
    pub skipped: u64,
    /// 전체 실행 시간
    pub elapsed: Duration,
}

/// 침입 탐지 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use gatewatch_pipeline::{Pipeline, PipelineConfigBuilder};
///
/// let config = PipelineConfigBuilder::new()
///     .input("/var/log/messages.gz")
///     .build()?;
/// let summary = Pipeline::new(config)?.run().await?;
/// println!("{} break-ins", summary.breakins);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// 설정을 검증하고 파이프라인을 생성합니다.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 현재 설정에 대한 참조를 반환합니다.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 파이프라인을 완료까지 실행합니다.
    ///
    /// 모든 태스크가 끝난 뒤 첫 번째 에러를 전파하거나
    /// 실행 요약을 반환합니다.
    pub async fn run(self) -> Result<RunSummary, PipelineError> {
        let config = self.config;
        let cap = config.channel_capacity;
        let width = config.parallelism;
        let year = config.year;

        info!(
            input = %config.input.display(),
            attempts = config.attempts,
            window_secs = config.window_secs,
            parallelism = width,
            "pipeline starting"
        );

        tokio::fs::create_dir_all(&config.output_dir)
            .await
            .map_err(|e| PipelineError::Sink {
                path: config.output_dir.display().to_string(),
                reason: format!("failed to create output dir: {e}"),
            })?;

        let skipped = Arc::new(AtomicU64::new(0));
        let failures = Arc::new(AtomicU64::new(0));
        let successes = Arc::new(AtomicU64::new(0));
        let suspects = Arc::new(AtomicU64::new(0));

        // --- 채널 배선 ---
        let (line_tx, line_rx) = mpsc::channel(cap);
        let (numbered_tx, numbered_rx) = mpsc::channel(cap);
        let (fail_tx, fail_rx) = mpsc::channel(cap);
        let (succ_tx, succ_rx) = mpsc::channel(cap);
        let (fail_numbered_tx, fail_numbered_rx) = mpsc::channel(cap);
        let (suspect_tx, suspect_rx) = mpsc::channel(cap);
        let (breakin_tx, breakin_rx) = mpsc::channel(cap);
        let (monitor_tx, monitor_rx) = mpsc::channel(MONITOR_CHANNEL_CAPACITY);

        // 시작 배리어는 소스 스폰보다 앞선다
        let monitor_handle = tokio::spawn(run_monitor(monitor_rx, config.exec_time_path()));
        let start = Instant::now();
        monitor_tx
            .send(MonitorEvent::Start(start))
            .await
            .map_err(|_| PipelineError::Channel("monitor closed at startup".to_owned()))?;

        // --- 병렬 파싱 구간 ---
        let (merged_rx, line_region) = spawn_parse_region(
            numbered_rx,
            width,
            cap,
            move |n: Numbered<Bytes>| parse_log_line(&n, year),
            Arc::clone(&skipped),
        );
        let (ordered_fail_rx, failure_region) = spawn_parse_region(
            fail_numbered_rx,
            width,
            cap,
            |n| parse_failure(&n),
            Arc::clone(&skipped),
        );

        // --- 연산자 태스크 ---
        let source_handle = tokio::spawn(LineSource::new(config.input.clone(), line_tx).run());
        let sequencer_handle =
            tokio::spawn(run_sequencer(line_rx, numbered_tx, Some(monitor_tx.clone())));
        let classifier_handle = tokio::spawn(run_classifier(
            merged_rx,
            fail_tx,
            succ_tx,
            Arc::clone(&failures),
            Arc::clone(&successes),
            Arc::clone(&skipped),
        ));
        let resequencer_handle = tokio::spawn(run_sequencer(fail_rx, fail_numbered_tx, None));
        let window_handle = tokio::spawn(run_suspect_finder(
            ordered_fail_rx,
            suspect_tx,
            config.attempts,
            config.window_secs,
            Arc::clone(&suspects),
        ));
        let correlator_handle = tokio::spawn(run_correlator(
            suspect_rx,
            succ_rx,
            breakin_tx,
            config.window_secs,
        ));
        let sink_handle = tokio::spawn(run_sink(
            breakin_rx,
            config.breakins_path(),
            monitor_tx.clone(),
        ));

        // 남은 모니터 송신자는 시퀀서와 싱크의 클론뿐 — 둘 다 끝나면
        // 모니터가 종료된다
        drop(monitor_tx);

        // --- 완료 대기 ---
        let mut first_error = None;

        note(&mut first_error, source_handle.await);
        let total_lines = note(&mut first_error, sequencer_handle.await).unwrap_or(0);
        for handle in line_region {
            note(&mut first_error, handle.await);
        }
        note(&mut first_error, classifier_handle.await);
        note(&mut first_error, resequencer_handle.await);
        for handle in failure_region {
            note(&mut first_error, handle.await);
        }
        note(&mut first_error, window_handle.await);
        note(&mut first_error, correlator_handle.await);
        let breakins = note(&mut first_error, sink_handle.await).unwrap_or(0);
        note(&mut first_error, monitor_handle.await);

        if let Some(error) = first_error {
            return Err(error);
        }

        let summary = RunSummary {
            total_lines,
            failures: failures.load(Ordering::Relaxed),
            successes: successes.load(Ordering::Relaxed),
            suspects: suspects.load(Ordering::Relaxed),
            breakins,
            skipped: skipped.load(Ordering::Relaxed),
            elapsed: start.elapsed(),
        };
        info!(
            total_lines = summary.total_lines,
            failures = summary.failures,
            successes = summary.successes,
            suspects = summary.suspects,
            breakins = summary.breakins,
            skipped = summary.skipped,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "pipeline finished"
        );
        Ok(summary)
    }
}

/// 태스크 조인 결과에서 값을 꺼내고, 첫 번째 에러만 기억합니다.
fn note<T>(
    first_error: &mut Option<PipelineError>,
    joined: Result<Result<T, PipelineError>, JoinError>,
) -> Option<T> {
    match joined {
        Ok(Ok(value)) => Some(value),
        Ok(Err(error)) => {
            if first_error.is_none() {
                *first_error = Some(error);
            }
            None
        }
        Err(join_error) => {
            if first_error.is_none() {
                *first_error = Some(PipelineError::Channel(format!(
                    "task panicked: {join_error}"
                )));
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfigBuilder;

    #[test]
    fn new_validates_config() {
        let config = PipelineConfig::default(); // input 비어 있음
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn new_accepts_valid_config() {
        let config = PipelineConfigBuilder::new()
            .input("/tmp/messages.gz")
            .build()
            .unwrap();
        let pipeline = Pipeline::new(config).unwrap();
        assert_eq!(pipeline.config().attempts, 5);
    }

    #[tokio::test]
    async fn run_fails_on_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfigBuilder::new()
            .input(dir.path().join("does-not-exist.gz"))
            .output_dir(dir.path())
            .build()
            .unwrap();

        let err = Pipeline::new(config).unwrap().run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Source { .. }));
    }
}
