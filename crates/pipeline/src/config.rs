//! 파이프라인 설정
//!
//! [`PipelineConfig`]는 탐지 파라미터(N회 실패 / T초 윈도우)와
//! 실행 파라미터(병렬 폭, 채널 용량, 출력 디렉토리)를 담습니다.
//!
//! # 사용 예시
//! ```ignore
//! use gatewatch_pipeline::PipelineConfigBuilder;
//!
//! let config = PipelineConfigBuilder::new()
//!     .input("/var/log/messages.gz")
//!     .attempts(5)
//!     .window_secs(60.0)
//!     .build()?;
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// 침입 탐지 결과 파일명
pub const BREAKINS_FILE: &str = "Breakins.txt";
/// 처리량 측정 결과 파일명
pub const EXEC_TIME_FILE: &str = "ExecTime.txt";

/// 파이프라인 설정
///
/// 기본값은 syslog 샘플 데이터 기준입니다: 5회 실패 / 60초 윈도우,
/// 파서 병렬 폭 8.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 입력 파일 경로 (gzip 또는 평문 syslog)
    pub input: PathBuf,
    /// 의심 판정에 필요한 연속 실패 횟수 (N)
    pub attempts: u32,
    /// 실패 버스트 및 상관 매칭 윈도우 (T, 초)
    pub window_secs: f64,
    /// 파서 병렬 폭 (P)
    pub parallelism: usize,
    /// 타임스탬프에 적용할 연도 — syslog 라인에는 연도가 없음
    pub year: i32,
    /// 결과 파일을 쓸 디렉토리
    pub output_dir: PathBuf,
    /// 연산자 간 채널 용량
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            attempts: 5,
            window_secs: 60.0,
            parallelism: 8,
            year: 2011,
            output_dir: PathBuf::from("."),
            channel_capacity: 1024,
        }
    }
}

impl PipelineConfig {
    /// 침입 탐지 결과 파일의 전체 경로를 반환합니다.
    pub fn breakins_path(&self) -> PathBuf {
        self.output_dir.join(BREAKINS_FILE)
    }

    /// 처리량 측정 결과 파일의 전체 경로를 반환합니다.
    pub fn exec_time_path(&self) -> PathBuf {
        self.output_dir.join(EXEC_TIME_FILE)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), PipelineError> {
        const MAX_ATTEMPTS: u32 = 1000;
        const MAX_PARALLELISM: usize = 64;

        if self.input.as_os_str().is_empty() {
            return Err(PipelineError::Config {
                field: "input".to_owned(),
                reason: "input path must not be empty".to_owned(),
            });
        }

        if self.attempts == 0 || self.attempts > MAX_ATTEMPTS {
            return Err(PipelineError::Config {
                field: "attempts".to_owned(),
                reason: format!("must be 1-{}", MAX_ATTEMPTS),
            });
        }

        if !self.window_secs.is_finite() || self.window_secs <= 0.0 {
            return Err(PipelineError::Config {
                field: "window_secs".to_owned(),
                reason: "must be a finite value greater than 0".to_owned(),
            });
        }

        if self.parallelism == 0 || self.parallelism > MAX_PARALLELISM {
            return Err(PipelineError::Config {
                field: "parallelism".to_owned(),
                reason: format!("must be 1-{}", MAX_PARALLELISM),
            });
        }

        if !(1970..=9999).contains(&self.year) {
            return Err(PipelineError::Config {
                field: "year".to_owned(),
                reason: "must be 1970-9999".to_owned(),
            });
        }

        if self.channel_capacity == 0 {
            return Err(PipelineError::Config {
                field: "channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 입력 파일 경로를 설정합니다.
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input = path.into();
        self
    }

    /// 의심 판정 실패 횟수(N)를 설정합니다.
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.config.attempts = attempts;
        self
    }

    /// 윈도우 길이(T, 초)를 설정합니다.
    pub fn window_secs(mut self, secs: f64) -> Self {
        self.config.window_secs = secs;
        self
    }

    /// 파서 병렬 폭(P)을 설정합니다.
    pub fn parallelism(mut self, width: usize) -> Self {
        self.config.parallelism = width;
        self
    }

    /// 타임스탬프 연도를 설정합니다.
    pub fn year(mut self, year: i32) -> Self {
        self.config.year = year;
        self
    }

    /// 출력 디렉토리를 설정합니다.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// 채널 용량을 설정합니다.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
