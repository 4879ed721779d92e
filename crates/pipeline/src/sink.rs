//! 결과 싱크 -- 침입 기록을 텍스트 파일로 씁니다.
//!
//! 한 레코드당 한 줄, `시각 원격호스트 계정명` 형식입니다.
//! 스트림 종료 시 플러시하고 처리량 모니터에 완료를 알립니다.

use std::path::PathBuf;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::{info, warn};

use gatewatch_core::stream::StreamItem;
use gatewatch_core::types::Breakin;

use crate::error::PipelineError;
use crate::monitor::MonitorEvent;

/// 침입 기록 싱크 태스크를 실행합니다. 기록한 레코드 수를 반환합니다.
pub async fn run_sink(
    mut rx: mpsc::Receiver<StreamItem<Breakin>>,
    path: PathBuf,
    monitor_tx: mpsc::Sender<MonitorEvent>,
) -> Result<u64, PipelineError> {
    let path_str = path.display().to_string();
    let file = File::create(&path).await.map_err(|e| PipelineError::Sink {
        path: path_str.clone(),
        reason: format!("failed to create: {e}"),
    })?;
    let mut writer = BufWriter::new(file);

    let mut count: u64 = 0;
    loop {
        match rx.recv().await {
            Some(StreamItem::Item(breakin)) => {
                writer
                    .write_all(format!("{breakin}\n").as_bytes())
                    .await
                    .map_err(|e| PipelineError::Sink {
                        path: path_str.clone(),
                        reason: format!("write failed: {e}"),
                    })?;
                count += 1;
            }
            Some(StreamItem::Eos) => {
                writer.flush().await.map_err(|e| PipelineError::Sink {
                    path: path_str.clone(),
                    reason: format!("flush failed: {e}"),
                })?;
                info!(path = %path_str, breakins = count, "sink flushed");
                // 모니터가 먼저 내려간 경우는 측정만 잃는다
                let _ = monitor_tx.send(MonitorEvent::Finished).await;
                break;
            }
            None => {
                warn!("sink input closed without punctuation");
                writer.flush().await.map_err(|e| PipelineError::Sink {
                    path: path_str.clone(),
                    reason: format!("flush failed: {e}"),
                })?;
                break;
            }
        }
    }
    Ok(count)
}
