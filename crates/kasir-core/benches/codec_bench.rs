//! Criterion benchmarks for the two per-request hot paths in kasir-core:
//! encoding an outbound notification and verifying handshake credentials.
//!
//! Run with:
//! ```bash
//! cargo bench --package kasir-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kasir_core::auth::sha256_digest;
use kasir_core::protocol::{decode_inbound, encode_server_message};
use kasir_core::{CredentialVerifier, ServerMessage, TerminalId};

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn make_welcome() -> ServerMessage {
    ServerMessage::welcome(&TerminalId::parse("5").expect("fixture id"))
}

fn make_qr_code() -> ServerMessage {
    // Typical QRIS payload length.
    ServerMessage::qr_code("0".repeat(180), "Total Rp 25.000")
}

fn make_payment_success() -> ServerMessage {
    ServerMessage::payment_success("0".repeat(180), true)
}

fn make_verifier() -> CredentialVerifier {
    let ids = (1..=50).filter_map(|n| TerminalId::parse(&n.to_string()));
    CredentialVerifier::open()
        .with_allow_list(ids)
        .with_secret_digest(sha256_digest("bench-secret"))
}

// ── Benchmark groups ──────────────────────────────────────────────────────────

/// Benchmarks `encode_server_message` for every message kind.
fn bench_encode(c: &mut Criterion) {
    let messages: &[(&str, ServerMessage)] = &[
        ("connected", make_welcome()),
        ("qr_code", make_qr_code()),
        ("payment_success", make_payment_success()),
    ];

    let mut group = c.benchmark_group("encode_server_message");
    for (name, msg) in messages {
        group.bench_with_input(BenchmarkId::new("msg", name), msg, |b, msg| {
            b.iter(|| encode_server_message(black_box(msg)).expect("encode must succeed"))
        });
    }
    group.finish();
}

/// Benchmarks parsing of a small inbound terminal frame.
fn bench_decode_inbound(c: &mut Criterion) {
    let frame = r#"{"type":"ack","qr_string":"QR123"}"#;
    c.bench_function("decode_inbound", |b| {
        b.iter(|| decode_inbound(black_box(frame)).expect("decode must succeed"))
    });
}

/// Benchmarks the three handshake outcomes the verifier can reach.
fn bench_authenticate(c: &mut Criterion) {
    let verifier = make_verifier();
    let cases: &[(&str, Option<&str>, Option<&str>)] = &[
        ("accepted", Some("25"), Some("bench-secret")),
        ("not_allowed", Some("999"), Some("bench-secret")),
        ("bad_secret", Some("25"), Some("wrong")),
    ];

    let mut group = c.benchmark_group("authenticate");
    for (name, id, secret) in cases {
        group.bench_function(*name, |b| {
            b.iter(|| verifier.authenticate(black_box(*id), black_box(*secret)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode_inbound, bench_authenticate);
criterion_main!(benches);
