mod common;

use std::time::{Duration, Instant};

use common::{TestPki, init_tracing, round_trip, spawn_silent_server, spawn_tls_echo_server};
use tether_client::prelude::*;

fn trusting(pki: &TestPki) -> TlsSettings {
    TlsSettings::new().with_trust(TrustAnchors::Custom(vec![pki.ca_der.to_vec()]))
}

fn params() -> ParamSet {
    ParamSet::new().with_connect_timeout(Duration::from_secs(5))
}

#[test]
fn sentinel_connect_returns_new_secure_handle() {
    init_tracing();
    let pki = TestPki::generate();
    let (port, server) = spawn_tls_echo_server(pki.server_config(&[b"h2"]));
    let factory = TlsSocketFactory::new(trusting(&pki).with_alpn(["h2"])).expect("factory");

    let Connected { mut handle, provenance } = factory
        .connect_socket(None, "localhost", port, None, &params())
        .expect("TLS connect");

    let Provenance::Wrapped { base } = provenance else {
        panic!("layering must wrap, got {provenance:?}");
    };
    assert_ne!(base, handle.id());
    assert!(handle.is_secure());
    assert_eq!(handle.state(), HandleState::Connected);
    assert_eq!(handle.alpn_protocol(), Some(&b"h2"[..]));
    assert_eq!(round_trip(&mut handle, b"hello over tls"), b"hello over tls");

    let probe = handle.release_probe();
    assert_eq!(probe.live_sockets(), 1);
    handle.close().expect("close_notify");
    assert!(probe.is_released());
    server.join().expect("TLS echo server");
}

#[test]
fn given_handle_is_consumed_and_wrapped() {
    let pki = TestPki::generate();
    let (port, server) = spawn_tls_echo_server(pki.server_config(&[]));
    let factory = TlsSocketFactory::new(trusting(&pki)).expect("factory");

    let handle = factory.create_socket().expect("create socket");
    let given = handle.id();
    let probe = handle.release_probe();

    let connected = factory
        .connect_socket(Some(handle), "localhost", port, None, &params())
        .expect("TLS connect");

    assert_eq!(connected.provenance, Provenance::Wrapped { base: given });
    assert_ne!(connected.handle.id(), given);
    assert_eq!(connected.handle.alpn_protocol(), None);

    drop(connected);
    assert!(probe.is_released());
    server.join().expect("TLS echo server");
}

#[test]
fn layer_over_connected_plain_handle() {
    let pki = TestPki::generate();
    let (port, server) = spawn_tls_echo_server(pki.server_config(&[]));

    let plain = PlainSocketFactory
        .connect_socket(None, "127.0.0.1", port, None, &params())
        .expect("plain connect")
        .into_handle();
    let plain_id = plain.id();

    let factory = TlsSocketFactory::new(trusting(&pki)).expect("factory");
    let mut secure = factory
        .layer(plain, "localhost", port, &params())
        .expect("layer");

    assert_ne!(secure.id(), plain_id);
    assert_eq!(round_trip(&mut secure, b"tunnelled"), b"tunnelled");
    drop(secure);
    server.join().expect("TLS echo server");
}

#[test]
fn untrusted_certificate_fails_handshake_and_releases() {
    let pki = TestPki::generate();
    let (port, server) = spawn_tls_echo_server(pki.server_config(&[]));
    let factory = TlsSocketFactory::new(TlsSettings::new()).expect("webpki factory");

    let handle = factory.create_socket().expect("create socket");
    let probe = handle.release_probe();
    let closer = handle.closer();

    let err = factory
        .connect_socket(Some(handle), "localhost", port, None, &params())
        .expect_err("test CA is not a webpki root");

    assert!(err.is_secure_handshake(), "unexpected error: {err}");
    assert!(probe.is_released());
    assert!(closer.is_closed());
    server.join().expect("TLS echo server");
}

#[test]
fn pem_roots_are_accepted() {
    let pki = TestPki::generate();
    let (port, server) = spawn_tls_echo_server(pki.server_config(&[]));
    let settings = TlsSettings::new()
        .with_pem_roots(pki.ca_pem.as_bytes())
        .expect("PEM roots");
    assert_eq!(settings, trusting(&pki));

    let factory = TlsSocketFactory::new(settings).expect("factory");
    let mut handle = factory
        .connect_socket(None, "localhost", port, None, &params())
        .expect("TLS connect")
        .into_handle();
    assert_eq!(round_trip(&mut handle, b"pem"), b"pem");
    drop(handle);
    server.join().expect("TLS echo server");
}

#[test]
fn silent_server_times_out_during_handshake() {
    let port = spawn_silent_server(Duration::from_secs(3));
    let factory = TlsSocketFactory::new(TlsSettings::new().with_trust(TrustAnchors::AcceptAny))
        .expect("factory");
    let params = ParamSet::new().with_connect_timeout(Duration::from_millis(300));

    let handle = factory.create_socket().expect("create socket");
    let probe = handle.release_probe();

    let started = Instant::now();
    let err = factory
        .connect_socket(Some(handle), "127.0.0.1", port, None, &params)
        .expect_err("server never answers the ClientHello");

    assert!(err.is_timeout(), "unexpected error: {err}");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(probe.is_released());
}

#[tokio::test]
async fn tls_connect_from_inside_a_runtime() {
    let pki = TestPki::generate();
    let (port, server) = spawn_tls_echo_server(pki.server_config(&[]));
    let factory = TlsSocketFactory::new(trusting(&pki)).expect("factory");

    let mut handle = factory
        .connect_socket(None, "localhost", port, None, &params())
        .expect("TLS connect inside a runtime")
        .into_handle();

    assert!(handle.is_secure());
    assert_eq!(round_trip(&mut handle, b"async caller"), b"async caller");
    drop(handle);
    server.join().expect("TLS echo server");
}
