//! 도메인 타입 — 파이프라인 전역에서 사용되는 튜플 정의
//!
//! 각 연산자는 이 타입들을 불변 튜플로 주고받습니다.
//! 타임스탬프는 [`DateTime<Utc>`]로 표현하며, 시간 차이는
//! [`seconds_between`]으로 부호 있는 초 단위(f64)로 계산합니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stream::Sequenced;

/// 두 시각의 차이를 부호 있는 초 단위로 반환합니다.
///
/// `a`가 `b`보다 뒤이면 양수입니다. 밀리초 정밀도로 계산합니다.
pub fn seconds_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (a - b).num_milliseconds() as f64 / 1000.0
}

/// 파싱된 syslog 라인
///
/// 시퀀서가 부여한 번호를 그대로 가지고 다니며, 병렬 파싱 후
/// 머저가 이 번호로 전체 순서를 복원합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// 입력 스트림에서의 시퀀스 번호 (1부터 연속)
    pub seqno: u64,
    /// 기록 시각
    pub time: DateTime<Utc>,
    /// 호스트명
    pub hostname: String,
    /// 서비스 태그 (예: "sshd[1234]:")
    pub service: String,
    /// 메시지 본문
    pub message: String,
}

impl Sequenced for LogLine {
    fn seqno(&self) -> u64 {
        self.seqno
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} {}: {}",
            self.seqno,
            self.time.format("%b %d %H:%M:%S"),
            self.hostname,
            self.service,
            self.message,
        )
    }
}

/// SSH 인증 실패 이벤트
///
/// 실패 서브시퀀스에서 새로 매긴 시퀀스 번호를 가집니다.
/// `user`는 메시지에 `user=` 토큰이 없으면 빈 문자열입니다 —
/// 다운스트림 매칭을 비활성화하는 센티널 값입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// 실패 서브시퀀스에서의 시퀀스 번호 (1부터 연속)
    pub seqno: u64,
    /// 실패 시각
    pub time: DateTime<Utc>,
    /// 요청한 UID
    pub uid: u32,
    /// 유효 UID
    pub euid: u32,
    /// TTY (비어 있을 수 있음)
    pub tty: String,
    /// 원격 호스트 — 윈도우 파티션 키
    pub rhost: String,
    /// 대상 계정명 (없으면 빈 문자열)
    pub user: String,
}

impl Sequenced for Failure {
    fn seqno(&self) -> u64 {
        self.seqno
    }
}

/// SSH 세션 성공(로그인) 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Success {
    /// 로그인 시각
    pub time: DateTime<Utc>,
    /// 로그인한 계정명
    pub user: String,
}

/// 의심 계정 — 한 원격 호스트에서 N회 연속 실패가 T초 안에 발생
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suspect {
    /// 윈도우 내 최대-최소 시각 차 (초)
    pub diff: f64,
    /// 윈도우 내 마지막 실패 시각
    pub last: DateTime<Utc>,
    /// 윈도우를 채운 실패 횟수 (N)
    pub attempts: u32,
    /// 실패가 발생한 원격 호스트
    pub rhost: String,
    /// 윈도우의 마지막 실패가 가리킨 계정명
    pub user: String,
}

impl fmt::Display for Suspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} attempts={} span={:.1}s",
            self.rhost, self.user, self.attempts, self.diff,
        )
    }
}

/// 침입 탐지 결과 — 의심 계정으로의 성공 로그인
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakin {
    /// 성공 로그인 시각
    pub time: DateTime<Utc>,
    /// 실패 버스트가 발생한 원격 호스트
    pub rhost: String,
    /// 계정명
    pub user: String,
}

impl fmt::Display for Breakin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.rhost,
            self.user,
        )
    }
}

/// 처리량 측정 레코드
///
/// 모니터가 시작 시각과 총 라인 수를 알게 될 때마다 갱신 기록합니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThroughputRecord {
    /// 시작 배리어 이후 경과 시간 (초)
    pub elapsed_secs: f64,
    /// 입력 총 라인 수
    pub total_lines: u64,
    /// 초당 처리 라인 수
    pub throughput: f64,
}

impl fmt::Display for ThroughputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} {} {:.1}",
            self.elapsed_secs, self.total_lines, self.throughput,
        )
    }
}
