#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`source`]: gzip/평문 로그 파일에서 라인 스트림 생성
//! - [`sequencer`]: 1부터 연속되는 시퀀스 번호 부여
//! - [`fanout`]: P개 워커의 병렬 파싱 구간 (분배 + 병합)
//! - [`merge`]: 시퀀스 번호 기반 순서 복원 머저
//! - [`parser`]: syslog 라인 및 sshd 인증 메시지 파서
//! - [`classify`]: 실패/성공 라인 분류
//! - [`window`]: 원격 호스트별 텀블링 카운트 윈도우
//! - [`correlate`]: 의심-성공 양방향 시간 상관 조인
//! - [`sink`]: 침입 기록 파일 출력
//! - [`monitor`]: 처리량 측정 사이드카
//! - [`pipeline`]: 전체 배선 및 실행
//! - [`config`]: 파이프라인 설정
//! - [`error`]: 도메인 에러 타입

pub mod classify;
pub mod config;
pub mod correlate;
pub mod error;
pub mod fanout;
pub mod merge;
pub mod monitor;
pub mod parser;
pub mod pipeline;
pub mod sequencer;
pub mod sink;
pub mod source;
pub mod window;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{Pipeline, RunSummary};

// 설정
pub use config::{BREAKINS_FILE, EXEC_TIME_FILE, PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::PipelineError;

// 연산자 코어
pub use correlate::Correlator;
pub use merge::OrderedMerger;
pub use monitor::ThroughputMonitor;
pub use window::SuspectFinder;
