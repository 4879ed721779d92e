//! 시퀀서 -- 튜플에 1부터 시작하는 연속 시퀀스 번호를 부여합니다.
//!
//! 입력이 K개의 튜플을 생산하면 출력은 정확히 1..K 번호가 붙은
//! K개의 튜플과 종료 펑추에이션입니다. 라인 레벨 인스턴스는
//! 종료 시점에 총 개수를 처리량 모니터에 보고합니다.
//!
//! 실패 서브시퀀스의 재시퀀서도 같은 연산자입니다 — 페이로드
//! 타입만 다르고 총 개수 보고는 생략합니다.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use gatewatch_core::stream::{Numbered, StreamItem};

use crate::error::PipelineError;
use crate::monitor::MonitorEvent;

/// 시퀀서 태스크를 실행합니다. 번호를 부여한 튜플 수를 반환합니다.
///
/// `monitor_tx`가 주어지면 종료 펑추에이션 수신 시
/// [`MonitorEvent::Total`]을 보고합니다.
///
/// 업스트림이 펑추에이션 없이 채널을 닫으면 (비정상 종료)
/// 펑추에이션을 전달하지 않고 조용히 끝납니다 — 다운스트림은
/// 결과를 확정하지 않은 채 정지합니다.
pub async fn run_sequencer<T: Send + 'static>(
    mut rx: mpsc::Receiver<StreamItem<T>>,
    tx: mpsc::Sender<StreamItem<Numbered<T>>>,
    monitor_tx: Option<mpsc::Sender<MonitorEvent>>,
) -> Result<u64, PipelineError> {
    let mut seqno: u64 = 0;

    loop {
        match rx.recv().await {
            Some(StreamItem::Item(payload)) => {
                seqno += 1;
                tx.send(StreamItem::Item(Numbered::new(seqno, payload)))
                    .await
                    .map_err(|_| PipelineError::Channel("sequencer output closed".to_owned()))?;
            }
            Some(StreamItem::Eos) => {
                debug!(total = seqno, "sequencer reached end of stream");
                if let Some(monitor) = &monitor_tx {
                    // 모니터가 먼저 내려간 경우는 측정만 잃는다
                    let _ = monitor.send(MonitorEvent::Total(seqno)).await;
                }
                tx.send(StreamItem::Eos)
                    .await
                    .map_err(|_| PipelineError::Channel("sequencer output closed".to_owned()))?;
                break;
            }
            None => {
                warn!(numbered = seqno, "sequencer input closed without punctuation");
                break;
            }
        }
    }

    Ok(seqno)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// K개 입력에 대해 정확히 1..K 번호가 나오는지 확인 (연속성 계약)
    #[tokio::test]
    async fn assigns_contiguous_seqnos() {
        let (in_tx, in_rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::channel(16);

        let handle = tokio::spawn(run_sequencer(in_rx, out_tx, None));

        for word in ["a", "b", "c"] {
            in_tx.send(StreamItem::Item(word)).await.unwrap();
        }
        in_tx.send(StreamItem::Eos).await.unwrap();

        let mut seqnos = Vec::new();
        while let Some(item) = out_rx.recv().await {
            match item {
                StreamItem::Item(n) => seqnos.push(n.seqno),
                StreamItem::Eos => break,
            }
        }
        assert_eq!(seqnos, vec![1, 2, 3]);
        assert_eq!(handle.await.unwrap().unwrap(), 3);
    }

    #[tokio::test]
    async fn reports_total_to_monitor() {
        let (in_tx, in_rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let (mon_tx, mut mon_rx) = mpsc::channel(4);

        let handle = tokio::spawn(run_sequencer(in_rx, out_tx, Some(mon_tx)));

        in_tx.send(StreamItem::Item(1u32)).await.unwrap();
        in_tx.send(StreamItem::Item(2u32)).await.unwrap();
        in_tx.send(StreamItem::Eos).await.unwrap();

        while out_rx.recv().await.is_some() {}
        handle.await.unwrap().unwrap();

        match mon_rx.recv().await {
            Some(MonitorEvent::Total(total)) => assert_eq!(total, 2),
            other => panic!("expected Total event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_stream_emits_only_punctuation() {
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);

        let handle = tokio::spawn(run_sequencer::<u32>(in_rx, out_tx, None));
        in_tx.send(StreamItem::Eos).await.unwrap();

        assert!(matches!(out_rx.recv().await, Some(StreamItem::Eos)));
        assert!(out_rx.recv().await.is_none());
        assert_eq!(handle.await.unwrap().unwrap(), 0);
    }

    #[tokio::test]
    async fn closed_input_without_punctuation_is_quiescent() {
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);

        let handle = tokio::spawn(run_sequencer(in_rx, out_tx, None));
        in_tx.send(StreamItem::Item("only")).await.unwrap();
        drop(in_tx);

        // 튜플은 전달되지만 펑추에이션은 나오지 않는다
        assert!(matches!(out_rx.recv().await, Some(StreamItem::Item(_))));
        assert!(out_rx.recv().await.is_none());
        handle.await.unwrap().unwrap();
    }
}
