//! 입력 소스 -- 압축 로그 파일을 라인 단위로 읽습니다.
//!
//! 파일 선두의 gzip 매직 바이트(`1f 8b`)를 확인하여 압축 여부를
//! 판별합니다. 확장자가 아닌 내용 기준이므로 평문 파일도 그대로
//! 처리합니다. flate2는 동기 I/O이므로 읽기 루프는
//! `spawn_blocking` 스레드에서 실행하고, 라인은 `blocking_send`로
//! 파이프라인에 전달합니다.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use bytes::Bytes;
use flate2::bufread::GzDecoder;
use tokio::sync::mpsc;
use tracing::{debug, info};

use gatewatch_core::stream::StreamItem;

use crate::error::PipelineError;

/// gzip 파일 매직 바이트
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// 라인 단위 파일 소스
///
/// 입력 파일의 각 라인을 파일 순서대로 방출하고, EOF에서
/// 스트림 종료 펑추에이션을 전달합니다. 빈 라인은 건너뜁니다.
pub struct LineSource {
    /// 입력 파일 경로
    path: PathBuf,
    /// 라인 전송 채널
    tx: mpsc::Sender<StreamItem<Bytes>>,
}

impl LineSource {
    /// 새 소스를 생성합니다.
    pub fn new(path: PathBuf, tx: mpsc::Sender<StreamItem<Bytes>>) -> Self {
        Self { path, tx }
    }

    /// 소스를 실행합니다. 읽은 라인 수를 반환합니다.
    ///
    /// 파일 열기 실패와 읽기 중간의 I/O 에러는 모두 치명적이며,
    /// 에러로 종료합니다 (다운스트림에는 Eos가 전달되지 않습니다).
    pub async fn run(self) -> Result<u64, PipelineError> {
        let path = self.path;
        let tx = self.tx;
        let path_display = path.display().to_string();

        let count = tokio::task::spawn_blocking(move || read_lines(&path, &tx))
            .await
            .map_err(|e| PipelineError::Channel(format!("source task failed: {e}")))??;

        info!(path = %path_display, lines = count, "source drained");
        Ok(count)
    }
}

/// 파일을 열고 모든 라인을 채널로 전송합니다 (블로킹).
fn read_lines(
    path: &std::path::Path,
    tx: &mpsc::Sender<StreamItem<Bytes>>,
) -> Result<u64, PipelineError> {
    let path_str = path.display().to_string();

    let file = std::fs::File::open(path).map_err(|e| PipelineError::Source {
        path: path_str.clone(),
        reason: format!("failed to open: {e}"),
    })?;

    let mut probe = BufReader::new(file);
    let head = probe.fill_buf().map_err(|e| PipelineError::Source {
        path: path_str.clone(),
        reason: format!("failed to read header: {e}"),
    })?;
    let gzipped = head.starts_with(&GZIP_MAGIC);
    debug!(path = %path_str, gzipped, "input format detected");

    let inner: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(probe))
    } else {
        Box::new(probe)
    };
    let mut reader = BufReader::new(inner);

    let mut count: u64 = 0;
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| PipelineError::Source {
                path: path_str.clone(),
                reason: format!("read failed after {count} lines: {e}"),
            })?;
        if n == 0 {
            break;
        }

        while line.last().is_some_and(|&b| b == b'\n' || b == b'\r') {
            line.pop();
        }
        if line.is_empty() {
            continue;
        }

        count += 1;
        tx.blocking_send(StreamItem::Item(Bytes::copy_from_slice(&line)))
            .map_err(|_| PipelineError::Channel("line receiver closed".to_owned()))?;
    }

    tx.blocking_send(StreamItem::Eos)
        .map_err(|_| PipelineError::Channel("line receiver closed".to_owned()))?;

    Ok(count)
}
