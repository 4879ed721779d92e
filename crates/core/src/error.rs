//! 에러 타입 — 도메인별 에러 정의

/// Gatewatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum GatewatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 입력 파일을 찾을 수 없음
    #[error("input file not found: {path}")]
    FileNotFound { path: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 토큰 수 부족 등 형식 불일치
    #[error("malformed record: {reason}")]
    Malformed { reason: String },

    /// 필수 필드 누락
    #[error("missing field '{field}'")]
    MissingField { field: String },

    /// 타임스탬프 파싱 실패
    #[error("invalid timestamp '{value}': {reason}")]
    Timestamp { value: String, reason: String },
}
