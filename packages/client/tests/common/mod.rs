#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, Issuer, KeyPair, SanType};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ServerConfig, ServerConnection, StreamOwned};

/// Address that silently drops SYNs on most networks.
pub const BLACK_HOLE: &str = "10.255.255.1";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Echo every byte of one accepted connection back until EOF.
pub fn spawn_echo_server() -> (u16, JoinHandle<()>) {
    spawn_echo_server_for(1)
}

/// Echo server for `connections` connections, each served on its own thread.
pub fn spawn_echo_server_for(connections: usize) -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind echo listener");
    let port = listener.local_addr().expect("listener address").port();
    let server = thread::spawn(move || {
        let workers: Vec<_> = (0..connections)
            .map_while(|_| listener.accept().ok())
            .map(|(stream, _)| thread::spawn(move || echo(stream)))
            .collect();
        for worker in workers {
            worker.join().expect("echo worker");
        }
    });
    (port, server)
}

/// A loopback port nobody listens on.
pub fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("listener address").port()
}

fn echo<S: Read + Write>(mut stream: S) {
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if stream.write_all(&buf[..n]).and_then(|()| stream.flush()).is_err() {
                    break;
                }
            }
        }
    }
}

/// Accept one connection and hold it open without ever answering.
pub fn spawn_silent_server(hold: Duration) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind silent listener");
    let port = listener.local_addr().expect("listener address").port();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            thread::sleep(hold);
            drop(stream);
        }
    });
    port
}

/// A test CA and a `localhost` server certificate signed by it.
pub struct TestPki {
    pub ca_der: CertificateDer<'static>,
    pub ca_pem: String,
    pub server_chain: Vec<CertificateDer<'static>>,
    pub server_key: PrivatePkcs8KeyDer<'static>,
}

impl TestPki {
    pub fn generate() -> Self {
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).expect("CA params");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "tether test CA");
        let ca_key = KeyPair::generate().expect("CA key");
        let ca_cert = ca_params.clone().self_signed(&ca_key).expect("CA certificate");
        let issuer = Issuer::new(ca_params, ca_key);

        let mut server_params =
            CertificateParams::new(vec!["localhost".to_string()]).expect("server params");
        server_params
            .subject_alt_names
            .push(SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        let server_key = KeyPair::generate().expect("server key");
        let server_cert = server_params
            .signed_by(&server_key, &issuer)
            .expect("server certificate");

        Self {
            ca_der: ca_cert.der().clone(),
            ca_pem: ca_cert.pem(),
            server_chain: vec![server_cert.der().clone(), ca_cert.der().clone()],
            server_key: PrivatePkcs8KeyDer::from(server_key.serialize_der()),
        }
    }

    pub fn server_config(&self, alpn: &[&[u8]]) -> Arc<ServerConfig> {
        let mut config = ServerConfig::builder_with_provider(
            rustls::crypto::ring::default_provider().into(),
        )
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_no_client_auth()
        .with_single_cert(
            self.server_chain.clone(),
            PrivateKeyDer::Pkcs8(self.server_key.clone_key()),
        )
        .expect("server certificate");
        config.alpn_protocols = alpn.iter().map(|p| p.to_vec()).collect();
        Arc::new(config)
    }
}

/// TLS echo server for one connection.
pub fn spawn_tls_echo_server(config: Arc<ServerConfig>) -> (u16, JoinHandle<()>) {
    spawn_tls_echo_server_for(config, 1)
}

/// TLS echo server for `connections` connections, each on its own thread.
pub fn spawn_tls_echo_server_for(
    config: Arc<ServerConfig>,
    connections: usize,
) -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind TLS listener");
    let port = listener.local_addr().expect("listener address").port();
    let server = thread::spawn(move || {
        let workers: Vec<_> = (0..connections)
            .map_while(|_| listener.accept().ok())
            .map(|(stream, _)| {
                let conn = ServerConnection::new(Arc::clone(&config)).expect("server connection");
                thread::spawn(move || echo(StreamOwned::new(conn, stream)))
            })
            .collect();
        for worker in workers {
            worker.join().expect("TLS echo worker");
        }
    });
    (port, server)
}

/// Number of open file descriptors of this process.
#[cfg(target_os = "linux")]
pub fn open_fds() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .expect("list /proc/self/fd")
        .count()
}

/// Write `payload` and read the same number of bytes back.
pub fn round_trip<S: Read + Write>(stream: &mut S, payload: &[u8]) -> Vec<u8> {
    stream.write_all(payload).expect("write payload");
    stream.flush().expect("flush payload");
    let mut echoed = vec![0u8; payload.len()];
    stream.read_exact(&mut echoed).expect("read echo");
    echoed
}
