//! 병렬 파싱 구간 -- 분배기, P개 워커, 순서 복원 머저의 조립.
//!
//! 상태 없는 파싱을 P개 태스크로 병렬화하고, 출력 측에서
//! [`OrderedMerger`]로 전체 순서를 복원합니다:
//!
//! ```text
//!              +-> worker 0 -+
//! distributor -+-> worker 1 -+-> merger -> ordered output
//!              +-> worker .. -+
//! ```
//!
//! 워커 출력은 하나의 공유 채널로 모입니다. 채널별 FIFO는 보장되지만
//! 워커 간 인터리빙은 비결정적이므로, 머저가 시퀀스 번호로 결정적
//! 순서를 복원합니다.
//!
//! 파싱에 실패한 튜플은 카운터에 집계하고 [`WorkerItem::Skipped`]로
//! 머저에 번호만 전달합니다 — 결번이 생기면 머저가 영원히 기다리므로,
//! 건너뛰더라도 번호는 반드시 전달해야 합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use gatewatch_core::stream::{Sequenced, StreamItem};

use crate::error::PipelineError;
use crate::merge::OrderedMerger;

/// 워커가 머저로 보내는 항목
#[derive(Debug)]
enum WorkerItem<T> {
    /// 파싱 성공
    Parsed(T),
    /// 파싱 실패로 건너뛴 시퀀스 번호
    Skipped(u64),
    /// 워커 하나의 입력이 끝남 — 머저는 P개를 센다
    Eos,
}

/// 병렬 파싱 구간을 스폰합니다.
///
/// 반환값은 순서가 복원된 출력 채널과, 구간을 구성하는 모든 태스크의
/// 핸들(분배기, 워커 P개, 머저)입니다.
pub fn spawn_parse_region<I, O, F>(
    mut rx: mpsc::Receiver<StreamItem<I>>,
    width: usize,
    capacity: usize,
    parse: F,
    skipped: Arc<AtomicU64>,
) -> (
    mpsc::Receiver<StreamItem<O>>,
    Vec<JoinHandle<Result<(), PipelineError>>>,
)
where
    I: Sequenced + Send + 'static,
    O: Sequenced + Send + 'static,
    F: Fn(I) -> Result<O, PipelineError> + Clone + Send + Sync + 'static,
{
    let mut handles = Vec::with_capacity(width + 2);

    let (funnel_tx, funnel_rx) = mpsc::channel::<WorkerItem<O>>(capacity);
    let (out_tx, out_rx) = mpsc::channel::<StreamItem<O>>(capacity);

    // 워커 채널 및 워커 태스크
    let mut worker_txs = Vec::with_capacity(width);
    for worker_id in 0..width {
        let (worker_tx, mut worker_rx) = mpsc::channel::<StreamItem<I>>(capacity);
        worker_txs.push(worker_tx);

        let parse = parse.clone();
        let funnel = funnel_tx.clone();
        let skipped = Arc::clone(&skipped);
        handles.push(tokio::spawn(async move {
            loop {
                match worker_rx.recv().await {
                    Some(StreamItem::Item(input)) => {
                        let seqno = input.seqno();
                        let item = match parse(input) {
                            Ok(output) => WorkerItem::Parsed(output),
                            Err(e) => {
                                skipped.fetch_add(1, Ordering::Relaxed);
                                debug!(worker_id, seqno, error = %e, "record skipped");
                                WorkerItem::Skipped(seqno)
                            }
                        };
                        funnel.send(item).await.map_err(|_| {
                            PipelineError::Channel("merge funnel closed".to_owned())
                        })?;
                    }
                    Some(StreamItem::Eos) => {
                        funnel.send(WorkerItem::Eos).await.map_err(|_| {
                            PipelineError::Channel("merge funnel closed".to_owned())
                        })?;
                        break;
                    }
                    None => break,
                }
            }
            Ok(())
        }));
    }
    drop(funnel_tx);

    // 분배기: 라운드 로빈으로 워커에 배분
    handles.push(tokio::spawn(async move {
        let mut turn = 0usize;
        loop {
            match rx.recv().await {
                Some(StreamItem::Item(input)) => {
                    worker_txs[turn]
                        .send(StreamItem::Item(input))
                        .await
                        .map_err(|_| PipelineError::Channel("parse worker closed".to_owned()))?;
                    turn = (turn + 1) % worker_txs.len();
                }
                Some(StreamItem::Eos) => {
                    for worker in &worker_txs {
                        worker
                            .send(StreamItem::Eos)
                            .await
                            .map_err(|_| PipelineError::Channel("parse worker closed".to_owned()))?;
                    }
                    break;
                }
                None => break,
            }
        }
        Ok(())
    }));

    // 머저: 공유 채널에서 받아 순서 복원
    handles.push(tokio::spawn(merge_task(funnel_rx, out_tx, width)));

    (out_rx, handles)
}

/// 머저 태스크 — P개의 Eos를 모두 받으면 펑추에이션을 전달합니다.
async fn merge_task<O: Sequenced + Send + 'static>(
    mut funnel_rx: mpsc::Receiver<WorkerItem<O>>,
    out_tx: mpsc::Sender<StreamItem<O>>,
    width: usize,
) -> Result<(), PipelineError> {
    let mut merger = OrderedMerger::new();
    let mut eos_remaining = width;

    while let Some(item) = funnel_rx.recv().await {
        let drained = match item {
            WorkerItem::Parsed(output) => merger.push(output.seqno(), Some(output)),
            WorkerItem::Skipped(seqno) => merger.push(seqno, None),
            WorkerItem::Eos => {
                eos_remaining -= 1;
                if eos_remaining == 0 {
                    if !merger.is_drained() {
                        // 무손실 전제 위반 — 업스트림 버그
                        warn!(
                            pending = merger.pending_len(),
                            next = merger.next_expected(),
                            "merge buffer not drained at end of stream"
                        );
                    }
                    out_tx
                        .send(StreamItem::Eos)
                        .await
                        .map_err(|_| PipelineError::Channel("merge output closed".to_owned()))?;
                    return Ok(());
                }
                continue;
            }
        };

        for output in drained {
            out_tx
                .send(StreamItem::Item(output))
                .await
                .map_err(|_| PipelineError::Channel("merge output closed".to_owned()))?;
        }
    }

    // 워커가 펑추에이션 없이 사라진 비정상 종료
    debug!("merge funnel closed before all workers finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use gatewatch_core::stream::Numbered;

    fn identity_parse(
        n: Numbered<Bytes>,
    ) -> Result<Numbered<Bytes>, PipelineError> {
        Ok(n)
    }

    async fn run_region<F>(
        inputs: Vec<Bytes>,
        width: usize,
        parse: F,
    ) -> (Vec<u64>, bool, u64)
    where
        F: Fn(Numbered<Bytes>) -> Result<Numbered<Bytes>, PipelineError>
            + Clone
            + Send
            + Sync
            + 'static,
    {
        let (in_tx, in_rx) = mpsc::channel(256);
        let skipped = Arc::new(AtomicU64::new(0));
        let (mut out_rx, handles) =
            spawn_parse_region(in_rx, width, 256, parse, Arc::clone(&skipped));

        for (idx, payload) in inputs.into_iter().enumerate() {
            in_tx
                .send(StreamItem::Item(Numbered::new(idx as u64 + 1, payload)))
                .await
                .unwrap();
        }
        in_tx.send(StreamItem::Eos).await.unwrap();
        drop(in_tx);

        let mut seqnos = Vec::new();
        let mut saw_eos = false;
        while let Some(item) = out_rx.recv().await {
            match item {
                StreamItem::Item(n) => seqnos.push(n.seqno),
                StreamItem::Eos => saw_eos = true,
            }
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        (seqnos, saw_eos, skipped.load(Ordering::Relaxed))
    }

    #[tokio::test]
    async fn region_preserves_order_across_workers() {
        let inputs: Vec<Bytes> = (0..100)
            .map(|i| Bytes::from(format!("line {i}")))
            .collect();
        let (seqnos, saw_eos, skipped) = run_region(inputs, 7, identity_parse).await;

        assert_eq!(seqnos, (1..=100).collect::<Vec<u64>>());
        assert!(saw_eos);
        assert_eq!(skipped, 0);
    }

    #[tokio::test]
    async fn region_with_single_worker() {
        let inputs: Vec<Bytes> = (0..10).map(|i| Bytes::from(format!("{i}"))).collect();
        let (seqnos, saw_eos, _) = run_region(inputs, 1, identity_parse).await;
        assert_eq!(seqnos, (1..=10).collect::<Vec<u64>>());
        assert!(saw_eos);
    }

    #[tokio::test]
    async fn failed_parse_is_skipped_and_counted() {
        let inputs: Vec<Bytes> = vec![
            Bytes::from_static(b"ok"),
            Bytes::from_static(b"bad"),
            Bytes::from_static(b"ok"),
        ];
        let parse = |n: Numbered<Bytes>| {
            if n.payload.as_ref() == b"bad" {
                Err(PipelineError::Parse {
                    stage: "test",
                    reason: "bad record".to_owned(),
                })
            } else {
                Ok(n)
            }
        };
        let (seqnos, saw_eos, skipped) = run_region(inputs, 3, parse).await;

        assert_eq!(seqnos, vec![1, 3]);
        assert!(saw_eos);
        assert_eq!(skipped, 1);
    }

    #[tokio::test]
    async fn empty_input_forwards_punctuation() {
        let (seqnos, saw_eos, skipped) = run_region(Vec::new(), 4, identity_parse).await;
        assert!(seqnos.is_empty());
        assert!(saw_eos);
        assert_eq!(skipped, 0);
    }
}
