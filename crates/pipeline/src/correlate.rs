//! 상관기 -- 의심 계정과 성공 로그인의 양방향 시간 매칭
//!
//! `Suspect(user, rhost, last)`와 `Success(user, time)`가
//! `|success.time − suspect.last| ≤ T`를 만족하면 [`Breakin`]을
//! 방출합니다. 어느 쪽이 먼저 도착하든 동작합니다: 각 핸들러는
//! `새로 도착한 시각 − 저장된 시각`이 `[0, T]`에 들면 매칭하므로,
//! 두 핸들러가 합쳐져 절대값 조건을 이룹니다.
//!
//! # 상태
//! 계정별 대기 리스트 두 개를 유지합니다. 양쪽 입력 모두 병합 이후의
//! 시간 순서로 도착하므로 리스트는 자연히 시각 오름차순입니다:
//! 꼬리에 추가, 머리부터 매칭, 오래된 접두부 일괄 제거 —
//! 양단 큐가 접근 패턴에 정확히 맞습니다.
//!
//! # 오래된 항목 제거
//! 새로 도착한 이벤트 기준으로 T초보다 오래된 저장 항목은 이후의
//! 어떤 이벤트와도 매칭될 수 없으므로 (도착이 시간 단조이므로)
//! 스캔 중 기록한 최고 수위 인덱스까지 접두부를 제거합니다.
//!
//! # 빈 계정명 센티널
//! `user == ""`인 의심 계정은 저장하지 않습니다 — 매칭 불가이며
//! 침입 기록에 빈 계정명이 나타나서는 안 됩니다. 빈 계정명의
//! 성공 로그인은 저장은 되지만 (원 구현의 폴스루를 따름) 매칭할
//! 의심 계정이 존재하지 않으므로 죽은 상태로 남습니다.

use std::collections::{HashMap, VecDeque};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use gatewatch_core::stream::StreamItem;
use gatewatch_core::types::{Breakin, Success, Suspect, seconds_between};

use crate::error::PipelineError;

/// 두 입력 스트림의 상관 조인 상태
pub struct Correlator {
    /// 매칭 허용 윈도우 (T, 초)
    window_secs: f64,
    /// 계정별 대기 중인 의심 항목 (last 오름차순)
    suspects: HashMap<String, VecDeque<Suspect>>,
    /// 계정별 대기 중인 성공 로그인 (time 오름차순)
    logins: HashMap<String, VecDeque<Success>>,
}

impl Correlator {
    /// 새 상관기를 생성합니다.
    pub fn new(window_secs: f64) -> Self {
        Self {
            window_secs,
            suspects: HashMap::new(),
            logins: HashMap::new(),
        }
    }

    /// 의심 계정 도착을 처리합니다.
    ///
    /// 대기 중인 로그인 중 가장 오래된 매칭 후보와 일대일로
    /// 매칭합니다. 매칭이 없고 계정명이 비어 있지 않으면 저장합니다.
    pub fn on_suspect(&mut self, suspect: Suspect) -> Option<Breakin> {
        if suspect.user.is_empty() {
            // 매칭 불가 센티널 — 저장하지 않고 버린다
            return None;
        }

        let mut breakin = None;
        if let Some(list) = self.logins.get_mut(&suspect.user) {
            let mut matched = None;
            let mut stale = None;

            for (idx, login) in list.iter().enumerate() {
                // 새로 도착한 쪽 빼기 저장된 쪽 — 양 핸들러가 합쳐져
                // |success.time - suspect.last| <= T 매칭을 이룬다
                let diff = seconds_between(suspect.last, login.time);
                if (0.0..=self.window_secs).contains(&diff) {
                    matched = Some(idx);
                    break;
                } else if diff > self.window_secs {
                    stale = Some(idx);
                }
            }

            if let Some(login) = matched.and_then(|idx| list.remove(idx)) {
                breakin = Some(Breakin {
                    time: login.time,
                    rhost: suspect.rhost.clone(),
                    user: suspect.user.clone(),
                });
            }
            if let Some(high_water) = stale {
                list.drain(..=high_water);
            }
            if list.is_empty() {
                self.logins.remove(&suspect.user);
            }
        }

        if breakin.is_none() {
            self.suspects
                .entry(suspect.user.clone())
                .or_default()
                .push_back(suspect);
        }
        breakin
    }

    /// 성공 로그인 도착을 처리합니다.
    ///
    /// 대기 중인 의심 항목 중 가장 오래된 매칭 후보와 일대일로
    /// 매칭합니다. 매칭이 없으면 계정명과 무관하게 저장합니다.
    pub fn on_success(&mut self, login: Success) -> Option<Breakin> {
        let mut breakin = None;
        if let Some(list) = self.suspects.get_mut(&login.user) {
            let mut matched = None;
            let mut stale = None;

            for (idx, suspect) in list.iter().enumerate() {
                let diff = seconds_between(login.time, suspect.last);
                if (0.0..=self.window_secs).contains(&diff) {
                    matched = Some(idx);
                    break;
                } else if diff > self.window_secs {
                    stale = Some(idx);
                }
            }

            if let Some(suspect) = matched.and_then(|idx| list.remove(idx)) {
                breakin = Some(Breakin {
                    time: login.time,
                    rhost: suspect.rhost,
                    user: login.user.clone(),
                });
            }
            if let Some(high_water) = stale {
                list.drain(..=high_water);
            }
            if list.is_empty() {
                self.suspects.remove(&login.user);
            }
        }

        if breakin.is_none() {
            self.logins
                .entry(login.user.clone())
                .or_default()
                .push_back(login);
        }
        breakin
    }

    /// 대기 중인 의심 항목 수 (전체 계정 합)
    pub fn pending_suspects(&self) -> usize {
        self.suspects.values().map(VecDeque::len).sum()
    }

    /// 대기 중인 로그인 수 (전체 계정 합)
    pub fn pending_logins(&self) -> usize {
        self.logins.values().map(VecDeque::len).sum()
    }
}

/// 상관기 태스크를 실행합니다.
///
/// 두 입력 채널을 한 태스크에서 select로 소비하므로 핸들러가
/// 공유 상태 위에서 동시에 실행되는 일은 없습니다. 양쪽 입력이
/// 모두 펑추에이션으로 끝난 경우에만 다운스트림에 펑추에이션을
/// 전달합니다.
pub async fn run_correlator(
    mut suspect_rx: mpsc::Receiver<StreamItem<Suspect>>,
    mut success_rx: mpsc::Receiver<StreamItem<Success>>,
    tx: mpsc::Sender<StreamItem<Breakin>>,
    window_secs: f64,
) -> Result<(), PipelineError> {
    let mut correlator = Correlator::new(window_secs);
    let mut suspects_done = false;
    let mut suspects_eos = false;
    let mut successes_done = false;
    let mut successes_eos = false;

    while !(suspects_done && successes_done) {
        let breakin = tokio::select! {
            item = suspect_rx.recv(), if !suspects_done => match item {
                Some(StreamItem::Item(suspect)) => correlator.on_suspect(suspect),
                Some(StreamItem::Eos) => {
                    suspects_done = true;
                    suspects_eos = true;
                    None
                }
                None => {
                    suspects_done = true;
                    None
                }
            },
            item = success_rx.recv(), if !successes_done => match item {
                Some(StreamItem::Item(login)) => correlator.on_success(login),
                Some(StreamItem::Eos) => {
                    successes_done = true;
                    successes_eos = true;
                    None
                }
                None => {
                    successes_done = true;
                    None
                }
            },
        };

        if let Some(breakin) = breakin {
            info!(breakin = %breakin, "break-in detected");
            tx.send(StreamItem::Item(breakin))
                .await
                .map_err(|_| PipelineError::Channel("breakin output closed".to_owned()))?;
        }
    }

    debug!(
        pending_suspects = correlator.pending_suspects(),
        pending_logins = correlator.pending_logins(),
        "correlator reached end of stream"
    );

    if suspects_eos && successes_eos {
        tx.send(StreamItem::Eos)
            .await
            .map_err(|_| PipelineError::Channel("breakin output closed".to_owned()))?;
    } else {
        warn!("correlator input closed without punctuation");
    }
    Ok(())
}
