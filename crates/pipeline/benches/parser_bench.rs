//! 파서 벤치마크
//!
//! syslog 라인 파서와 인증 실패 메시지 파서의 처리량을 측정합니다.

use bytes::Bytes;
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use gatewatch_core::stream::Numbered;
use gatewatch_pipeline::parser::{parse_failure, parse_log_line, parse_success};

/// 인증 실패 라인 (user 포함)
const FAILURE_LINE: &[u8] = b"Jun 10 12:00:00 combo sshd(pam_unix)[7274]: authentication failure; logname= uid=0 euid=0 tty=NODEVssh ruser= rhost=218.188.2.4 user=root";

/// 세션 성공 라인
const SUCCESS_LINE: &[u8] =
    b"Jun 10 12:00:50 combo sshd(pam_unix)[7275]: session opened for user alice by (uid=0)";

/// 분류에서 버려지는 잡음 라인
const NOISE_LINE: &[u8] =
    b"Jun 10 04:02:01 combo su(pam_unix)[1234]: session opened for user cyrus by (uid=0)";

fn bench_log_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_log_line");
    group.throughput(Throughput::Elements(1));

    for (name, raw) in [
        ("failure", FAILURE_LINE),
        ("success", SUCCESS_LINE),
        ("noise", NOISE_LINE),
    ] {
        let numbered = Numbered::new(1, Bytes::from_static(raw));
        group.bench_function(name, |b| {
            b.iter(|| parse_log_line(black_box(&numbered), 2011).unwrap())
        });
    }
    group.finish();
}

fn bench_auth_messages(c: &mut Criterion) {
    let failure = Numbered::new(
        1,
        parse_log_line(&Numbered::new(1, Bytes::from_static(FAILURE_LINE)), 2011).unwrap(),
    );
    let success = parse_log_line(&Numbered::new(1, Bytes::from_static(SUCCESS_LINE)), 2011).unwrap();

    let mut group = c.benchmark_group("parse_auth");
    group.throughput(Throughput::Elements(1));
    group.bench_function("failure_message", |b| {
        b.iter(|| parse_failure(black_box(&failure)).unwrap())
    });
    group.bench_function("success_message", |b| {
        b.iter(|| parse_success(black_box(&success)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_log_line, bench_auth_messages);
criterion_main!(benches);
