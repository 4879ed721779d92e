//! 파이프라인 에러 타입
//!
//! [`PipelineError`]는 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<PipelineError> for GatewatchError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use gatewatch_core::error::GatewatchError;

/// 파이프라인 도메인 에러
///
/// 소스 읽기, 파싱, 채널 통신, 싱크 쓰기 등 파이프라인 내부의
/// 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 입력 소스 에러 (파일 열기 실패, gzip 손상 등)
    #[error("source error: {path}: {reason}")]
    Source {
        /// 입력 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 레코드 파싱 실패
    #[error("parse error ({stage}): {reason}")]
    Parse {
        /// 파싱 단계 (logline, failure, success)
        stage: &'static str,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 결과 파일 쓰기 실패
    #[error("sink error: {path}: {reason}")]
    Sink {
        /// 출력 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PipelineError> for GatewatchError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Io(e) => GatewatchError::Io(e),
            PipelineError::Channel(reason) => GatewatchError::Channel(reason),
            other => GatewatchError::Pipeline(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = PipelineError::Parse {
            stage: "logline",
            reason: "expected at least 6 tokens, got 2".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("logline"));
        assert!(msg.contains("6 tokens"));
    }

    #[test]
    fn source_error_display() {
        let err = PipelineError::Source {
            path: "/var/log/messages.gz".to_owned(),
            reason: "corrupt gzip header".to_owned(),
        };
        assert!(err.to_string().contains("messages.gz"));
    }

    #[test]
    fn converts_to_gatewatch_error() {
        let err = PipelineError::Channel("receiver closed".to_owned());
        let top: GatewatchError = err.into();
        assert!(matches!(top, GatewatchError::Channel(_)));

        let err = PipelineError::Config {
            field: "attempts".to_owned(),
            reason: "must be 1-1000".to_owned(),
        };
        let top: GatewatchError = err.into();
        assert!(matches!(top, GatewatchError::Pipeline(_)));
    }

    #[test]
    fn io_error_passes_through() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let top: GatewatchError = PipelineError::from(io).into();
        assert!(matches!(top, GatewatchError::Io(_)));
    }
}
