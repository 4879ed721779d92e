//! sshd 인증 메시지 파서
//!
//! PAM이 남기는 인증 실패/세션 성공 메시지에서 필드를 추출합니다.
//!
//! 실패 메시지 예:
//! ```text
//! pam_unix(sshd:auth): authentication failure; logname= uid=0 euid=0 tty=ssh ruser= rhost=203.0.113.5  user=root
//! ```
//!
//! `user=` 토큰은 없는 경우가 있으며, 이때 빈 문자열을 넣습니다 —
//! 상관기는 이를 매칭 불가 센티널로 취급합니다. `tty=`, `rhost=`처럼
//! 값이 빌 수 있는 토큰 때문에 위치 기반 정규식은 깨지기 쉬우므로,
//! 실패 메시지는 `key=value` 토큰 스캔으로 파싱합니다.

use std::sync::LazyLock;

use regex::Regex;

use gatewatch_core::stream::Numbered;
use gatewatch_core::types::{Failure, LogLine, Success};

use crate::error::PipelineError;

/// "session opened for user <user>" — 괄호 직전까지가 계정명
/// (새 형식은 "user alice(uid=1000)"처럼 uid가 붙는다)
static RE_SESSION_USER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"session opened for user ([^\s(]+)").expect("regex"));

/// 세션 성공 라인에서 [`Success`] 튜플을 추출합니다.
pub fn parse_success(line: &LogLine) -> Result<Success, PipelineError> {
    let captures = RE_SESSION_USER
        .captures(&line.message)
        .ok_or_else(|| PipelineError::Parse {
            stage: "success",
            reason: format!("no user in session message: {}", line.message),
        })?;

    Ok(Success {
        time: line.time,
        user: captures[1].to_owned(),
    })
}

/// 인증 실패 라인에서 [`Failure`] 튜플을 추출합니다.
///
/// 시퀀스 번호는 실패 서브시퀀스에서 새로 매긴 번호입니다.
/// `uid`, `euid`, `tty`, `rhost`는 필수 토큰이고 (값은 빌 수 있음),
/// `user`는 선택 토큰입니다.
pub fn parse_failure(numbered: &Numbered<LogLine>) -> Result<Failure, PipelineError> {
    let line = &numbered.payload;

    let mut uid: Option<u32> = None;
    let mut euid: Option<u32> = None;
    let mut tty: Option<&str> = None;
    let mut rhost: Option<&str> = None;
    let mut user: Option<&str> = None;

    for token in line.message.split_whitespace() {
        if let Some(value) = token.strip_prefix("uid=") {
            uid = Some(parse_id("uid", value)?);
        } else if let Some(value) = token.strip_prefix("euid=") {
            euid = Some(parse_id("euid", value)?);
        } else if let Some(value) = token.strip_prefix("tty=") {
            tty = Some(value);
        } else if let Some(value) = token.strip_prefix("rhost=") {
            rhost = Some(value);
        } else if let Some(value) = token.strip_prefix("user=") {
            user = Some(value);
        }
    }

    Ok(Failure {
        seqno: numbered.seqno,
        time: line.time,
        uid: required("uid", uid)?,
        euid: required("euid", euid)?,
        tty: required("tty", tty)?.to_owned(),
        rhost: required("rhost", rhost)?.to_owned(),
        user: user.unwrap_or("").to_owned(),
    })
}

fn parse_id(field: &'static str, value: &str) -> Result<u32, PipelineError> {
    value.parse().map_err(|_| PipelineError::Parse {
        stage: "failure",
        reason: format!("invalid {field} value '{value}'"),
    })
}

fn required<T>(field: &'static str, value: Option<T>) -> Result<T, PipelineError> {
    value.ok_or_else(|| PipelineError::Parse {
        stage: "failure",
        reason: format!("missing '{field}=' token"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn log_line(message: &str) -> LogLine {
        LogLine {
            seqno: 1,
            time: DateTime::from_timestamp(1_000, 0).unwrap(),
            hostname: "host".to_owned(),
            service: "sshd[100]:".to_owned(),
            message: message.to_owned(),
        }
    }

    #[test]
    fn parse_failure_with_user() {
        let line = log_line(
            "pam_unix(sshd:auth): authentication failure; logname= uid=0 euid=0 tty=ssh ruser= rhost=203.0.113.5 user=root",
        );
        let failure = parse_failure(&Numbered::new(3, line)).unwrap();

        assert_eq!(failure.seqno, 3);
        assert_eq!(failure.uid, 0);
        assert_eq!(failure.euid, 0);
        assert_eq!(failure.tty, "ssh");
        assert_eq!(failure.rhost, "203.0.113.5");
        assert_eq!(failure.user, "root");
    }

    #[test]
    fn parse_failure_without_user_yields_empty_sentinel() {
        let line = log_line(
            "pam_unix(sshd:auth): authentication failure; logname= uid=0 euid=0 tty=NODEVssh ruser= rhost=10.0.0.7",
        );
        let failure = parse_failure(&Numbered::new(1, line)).unwrap();
        assert_eq!(failure.user, "");
        assert_eq!(failure.rhost, "10.0.0.7");
    }

    #[test]
    fn parse_failure_with_empty_rhost_value() {
        // 값이 빈 토큰도 "존재"로 취급한다
        let line = log_line(
            "authentication failure; logname= uid=0 euid=0 tty=ssh ruser= rhost= user=guest",
        );
        let failure = parse_failure(&Numbered::new(1, line)).unwrap();
        assert_eq!(failure.rhost, "");
        assert_eq!(failure.user, "guest");
    }

    #[test]
    fn parse_failure_missing_rhost_is_error() {
        let line = log_line("authentication failure; logname= uid=0 euid=0 tty=ssh ruser=");
        let err = parse_failure(&Numbered::new(1, line)).unwrap_err();
        assert!(err.to_string().contains("rhost"));
    }

    #[test]
    fn parse_failure_invalid_uid_is_error() {
        let line =
            log_line("authentication failure; uid=abc euid=0 tty=ssh ruser= rhost=10.0.0.1");
        let err = parse_failure(&Numbered::new(1, line)).unwrap_err();
        assert!(err.to_string().contains("uid"));
    }

    #[test]
    fn parse_failure_nonzero_ids() {
        let line = log_line(
            "authentication failure; logname= uid=1000 euid=500 tty=ssh ruser= rhost=h1 user=bob",
        );
        let failure = parse_failure(&Numbered::new(1, line)).unwrap();
        assert_eq!(failure.uid, 1000);
        assert_eq!(failure.euid, 500);
    }

    #[test]
    fn parse_success_basic() {
        let line = log_line("pam_unix(sshd:session): session opened for user alice by (uid=0)");
        let success = parse_success(&line).unwrap();
        assert_eq!(success.user, "alice");
        assert_eq!(success.time, line.time);
    }

    #[test]
    fn parse_success_with_uid_suffix() {
        let line = log_line("pam_unix(sshd:session): session opened for user alice(uid=1000) by (uid=0)");
        let success = parse_success(&line).unwrap();
        assert_eq!(success.user, "alice");
    }

    #[test]
    fn parse_success_without_user_is_error() {
        let line = log_line("pam_unix(sshd:session): session closed");
        assert!(parse_success(&line).is_err());
    }
}
