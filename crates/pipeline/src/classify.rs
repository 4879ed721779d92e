//! 분류기 -- 병합된 로그 스트림에서 실패/성공 라인을 골라냅니다.
//!
//! 두 술어를 병합 스트림에 적용합니다:
//! - 실패: 서비스에 `sshd` 포함 AND 메시지에 `authentication failure` 포함
//! - 성공: 서비스에 `sshd` 포함 AND 메시지에 `session opened for user` 포함
//!
//! 어느 쪽도 아닌 라인은 버립니다. 실패 라인은 재시퀀서로,
//! 성공 라인은 [`Success`] 튜플로 변환되어 상관기로 갑니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use gatewatch_core::stream::StreamItem;
use gatewatch_core::types::{LogLine, Success};

use crate::error::PipelineError;
use crate::parser::parse_success;

/// 인증 실패 라인 술어
pub fn is_auth_failure(line: &LogLine) -> bool {
    line.service.contains("sshd") && line.message.contains("authentication failure")
}

/// 세션 성공 라인 술어
pub fn is_session_open(line: &LogLine) -> bool {
    line.service.contains("sshd") && line.message.contains("session opened for user")
}

/// 분류기 태스크를 실행합니다.
///
/// 실패 라인 수와 성공 튜플 수를 각각 카운터에 집계합니다.
/// 성공 술어에 걸렸지만 계정명을 추출할 수 없는 라인은
/// 건너뛰기 카운터에 집계합니다.
pub async fn run_classifier(
    mut rx: mpsc::Receiver<StreamItem<LogLine>>,
    failure_tx: mpsc::Sender<StreamItem<LogLine>>,
    success_tx: mpsc::Sender<StreamItem<Success>>,
    failures: Arc<AtomicU64>,
    successes: Arc<AtomicU64>,
    skipped: Arc<AtomicU64>,
) -> Result<(), PipelineError> {
    loop {
        match rx.recv().await {
            Some(StreamItem::Item(line)) => {
                if is_auth_failure(&line) {
                    failures.fetch_add(1, Ordering::Relaxed);
                    failure_tx
                        .send(StreamItem::Item(line))
                        .await
                        .map_err(|_| PipelineError::Channel("failure branch closed".to_owned()))?;
                } else if is_session_open(&line) {
                    match parse_success(&line) {
                        Ok(success) => {
                            successes.fetch_add(1, Ordering::Relaxed);
                            success_tx.send(StreamItem::Item(success)).await.map_err(
                                |_| PipelineError::Channel("success branch closed".to_owned()),
                            )?;
                        }
                        Err(e) => {
                            skipped.fetch_add(1, Ordering::Relaxed);
                            debug!(seqno = line.seqno, error = %e, "session line skipped");
                        }
                    }
                }
                // 어느 술어에도 해당하지 않는 라인은 버린다
            }
            Some(StreamItem::Eos) => {
                debug!(
                    failures = failures.load(Ordering::Relaxed),
                    successes = successes.load(Ordering::Relaxed),
                    "classifier reached end of stream"
                );
                failure_tx
                    .send(StreamItem::Eos)
                    .await
                    .map_err(|_| PipelineError::Channel("failure branch closed".to_owned()))?;
                success_tx
                    .send(StreamItem::Eos)
                    .await
                    .map_err(|_| PipelineError::Channel("success branch closed".to_owned()))?;
                break;
            }
            None => {
                warn!("classifier input closed without punctuation");
                break;
            }
        }
    }
    Ok(())
}
