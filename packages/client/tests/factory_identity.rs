use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use tether_client::prelude::*;
use tether_client::AnySocketFactory;

fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn tls(settings: TlsSettings) -> TlsSocketFactory {
    TlsSocketFactory::new(settings).expect("factory")
}

#[test]
fn plain_factories_are_all_equal() {
    let a = PlainSocketFactory;
    let b = PlainSocketFactory::new();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_eq!(a.identity(), b.identity());
}

#[test]
fn plain_and_tls_are_never_equal() {
    let plain: &dyn SocketFactory = &PlainSocketFactory;
    let layered: &dyn SocketFactory = &tls(TlsSettings::new());
    assert!(plain != layered);
    assert_ne!(plain.identity(), layered.identity());
}

#[test]
fn tls_factories_equal_iff_settings_equal() {
    let h2 = || TlsSettings::new().with_alpn(["h2"]);
    let a = tls(h2());
    let b = tls(h2());
    let c = tls(TlsSettings::new().with_alpn(["http/1.1"]));

    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_ne!(a, c);
    assert_eq!(a.identity(), FactoryIdentity::Layered(h2()));
}

#[test]
fn hashes_agree_across_views() {
    let factory = tls(TlsSettings::new());
    let as_dyn: &dyn SocketFactory = &factory;
    let as_any = AnySocketFactory::from(factory.clone());

    assert_eq!(hash_of(&factory), hash_of(as_dyn));
    assert_eq!(hash_of(&factory), hash_of(&factory.identity()));
    assert_eq!(as_any.identity(), factory.identity());
}

#[test]
fn identities_partition_pools() {
    let identities: HashSet<FactoryIdentity> = [
        PlainSocketFactory.identity(),
        PlainSocketFactory::new().identity(),
        tls(TlsSettings::new()).identity(),
        tls(TlsSettings::new()).identity(),
        tls(TlsSettings::new().with_sni(false)).identity(),
    ]
    .into_iter()
    .collect();

    assert_eq!(identities.len(), 3);
}
