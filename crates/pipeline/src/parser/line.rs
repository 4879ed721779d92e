//! Syslog 라인 파서
//!
//! BSD syslog (RFC 3164) 형식의 라인을 파싱합니다:
//!
//! ```text
//! MMM DD HH:MM:SS hostname service[pid]: message
//! ```
//!
//! 공백 구분 토큰 기준으로 `[0]`=월 약어, `[1]`=일, `[2]`=시각,
//! `[3]`=호스트명, `[4]`=서비스 태그, `[5..]`=메시지입니다.
//! 라인에는 연도가 없으므로 설정에서 받은 연도를 적용합니다.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};

use gatewatch_core::stream::Numbered;
use gatewatch_core::types::LogLine;

use crate::error::PipelineError;

/// 타임스탬프 앞쪽 토큰 수 (월, 일, 시각)
const TIMESTAMP_TOKENS: usize = 3;
/// 메시지를 포함한 최소 토큰 수
const MIN_TOKENS: usize = 6;

/// 번호 붙은 원시 라인을 [`LogLine`]으로 파싱합니다.
///
/// 시퀀스 번호는 그대로 유지됩니다. 토큰 수 부족이나 타임스탬프
/// 형식 오류는 에러로 반환하며, 호출 측(병렬 구간)이 건너뛰기
/// 카운터에 집계합니다.
pub fn parse_log_line(raw: &Numbered<Bytes>, year: i32) -> Result<LogLine, PipelineError> {
    let text = String::from_utf8_lossy(&raw.payload);
    let tokens: Vec<&str> = text.split_whitespace().collect();

    if tokens.len() < MIN_TOKENS {
        return Err(PipelineError::Parse {
            stage: "logline",
            reason: format!("expected at least {MIN_TOKENS} tokens, got {}", tokens.len()),
        });
    }

    let time = parse_syslog_timestamp(tokens[0], tokens[1], tokens[2], year)?;

    Ok(LogLine {
        seqno: raw.seqno,
        time,
        hostname: tokens[TIMESTAMP_TOKENS].to_owned(),
        service: tokens[TIMESTAMP_TOKENS + 1].to_owned(),
        message: tokens[TIMESTAMP_TOKENS + 2..].join(" "),
    })
}

/// BSD syslog 타임스탬프를 파싱합니다.
///
/// 형식: `MMM DD HH:MM:SS` (예: `Jun  9 05:06:53`).
/// 연도 정보가 없으므로 설정된 연도를 적용합니다.
fn parse_syslog_timestamp(
    month: &str,
    day: &str,
    time_of_day: &str,
    year: i32,
) -> Result<DateTime<Utc>, PipelineError> {
    let with_year = format!("{year} {month} {day} {time_of_day}");

    let naive = NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M:%S").map_err(|e| {
        PipelineError::Parse {
            stage: "logline",
            reason: format!("invalid timestamp '{month} {day} {time_of_day}': {e}"),
        }
    })?;

    Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}
