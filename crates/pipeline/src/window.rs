//! 의심 탐지 -- 원격 호스트별 텀블링 카운트 윈도우
//!
//! 원격 호스트(`rhost`)를 파티션 키로 하여 연속 N회의 인증 실패를
//! 모읍니다. N번째 실패가 들어오면 윈도우가 발화하고 비워집니다
//! (텀블링 — 윈도우는 겹치지 않습니다). 발화 시 윈도우의 시각 범위가
//! T초 미만이면 [`Suspect`]를 방출합니다.
//!
//! 파티션은 만료되지 않습니다 — 단발성 배치 실행이므로 유휴 파티션
//! 정리는 범위 밖입니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use gatewatch_core::stream::StreamItem;
use gatewatch_core::types::{Failure, Suspect, seconds_between};

use crate::error::PipelineError;

/// 원격 호스트별 실패 윈도우
///
/// 입력은 시퀀스 순서(시각 비내림차순)로 들어온다고 가정합니다.
pub struct SuspectFinder {
    /// 발화에 필요한 실패 횟수 (N)
    attempts: u32,
    /// 윈도우 허용 시간 범위 (T, 초)
    window_secs: f64,
    /// rhost -> 진행 중인 윈도우
    partitions: HashMap<String, Vec<Failure>>,
}

impl SuspectFinder {
    /// 새 탐지기를 생성합니다.
    pub fn new(attempts: u32, window_secs: f64) -> Self {
        Self {
            attempts,
            window_secs,
            partitions: HashMap::new(),
        }
    }

    /// 실패 하나를 관찰합니다.
    ///
    /// 해당 파티션의 N번째 실패이면 윈도우를 발화·리셋하고,
    /// 시각 범위가 T 미만일 때만 [`Suspect`]를 반환합니다.
    pub fn observe(&mut self, failure: Failure) -> Option<Suspect> {
        let window = self
            .partitions
            .entry(failure.rhost.clone())
            .or_insert_with(|| Vec::with_capacity(self.attempts as usize));
        window.push(failure);

        if window.len() < self.attempts as usize {
            return None;
        }

        // N번째 도달: 발화하고 윈도우를 비운다
        let fired = std::mem::take(window);

        let min_time = fired.iter().map(|f| f.time).min()?;
        let max_time = fired.iter().map(|f| f.time).max()?;
        let diff = seconds_between(max_time, min_time);
        // 마지막 삽입 순서가 타이브레이크
        let last = fired.last()?;

        if diff < self.window_secs {
            Some(Suspect {
                diff,
                last: max_time,
                attempts: self.attempts,
                rhost: last.rhost.clone(),
                user: last.user.clone(),
            })
        } else {
            None
        }
    }

    /// 현재 열려 있는 파티션 수
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}

/// 의심 탐지 태스크를 실행합니다.
pub async fn run_suspect_finder(
    mut rx: mpsc::Receiver<StreamItem<Failure>>,
    tx: mpsc::Sender<StreamItem<Suspect>>,
    attempts: u32,
    window_secs: f64,
    suspects: Arc<AtomicU64>,
) -> Result<(), PipelineError> {
    let mut finder = SuspectFinder::new(attempts, window_secs);

    loop {
        match rx.recv().await {
            Some(StreamItem::Item(failure)) => {
                if let Some(suspect) = finder.observe(failure) {
                    suspects.fetch_add(1, Ordering::Relaxed);
                    debug!(suspect = %suspect, "suspect window fired");
                    tx.send(StreamItem::Item(suspect))
                        .await
                        .map_err(|_| PipelineError::Channel("suspect output closed".to_owned()))?;
                }
            }
            Some(StreamItem::Eos) => {
                debug!(
                    partitions = finder.partition_count(),
                    emitted = suspects.load(Ordering::Relaxed),
                    "suspect finder reached end of stream"
                );
                tx.send(StreamItem::Eos)
                    .await
                    .map_err(|_| PipelineError::Channel("suspect output closed".to_owned()))?;
                break;
            }
            None => {
                warn!("suspect finder input closed without punctuation");
                break;
            }
        }
    }
    Ok(())
}
