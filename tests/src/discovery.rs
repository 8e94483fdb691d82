use std::net::Ipv4Addr;
use std::sync::Arc;

use hostsweep_common::config::ScanConfig;
use hostsweep_common::error::ScanError;
use hostsweep_core::engine::Engine;

use crate::support::{
    FakeFactory, FakeNetwork, FixedInterfaces, IFF_BROADCAST, IFF_LOOPBACK, IFF_UP, create_mock_interface,
};

fn host_table() -> FixedInterfaces {
    FixedInterfaces(vec![
        create_mock_interface("lo", &[([127, 0, 0, 1], 8)], IFF_UP | IFF_LOOPBACK),
        create_mock_interface("eth0", &[([192, 168, 50, 10], 28)], IFF_UP | IFF_BROADCAST),
        create_mock_interface(
            "eth1",
            &[([10, 20, 0, 1], 30), ([10, 30, 0, 1], 29)],
            IFF_UP | IFF_BROADCAST,
        ),
        create_mock_interface("eth2", &[([172, 20, 0, 1], 16)], IFF_UP | IFF_BROADCAST),
        create_mock_interface("wlan0", &[([10, 40, 0, 1], 24)], IFF_BROADCAST),
    ])
}

fn engine(net: FakeNetwork) -> Engine {
    Engine::with_factory(ScanConfig::default(), Arc::new(FakeFactory(Arc::new(net))))
        .unwrap()
        .with_interface_source(Arc::new(host_table()))
}

#[tokio::test]
async fn scan_all_sweeps_every_viable_interface() {
    let net = FakeNetwork::with_live([Ipv4Addr::new(192, 168, 50, 1), Ipv4Addr::new(10, 30, 0, 3)]);
    let report = engine(net).scan_all().await.unwrap();

    let names: Vec<&String> = report.results.keys().collect();
    assert_eq!(names, vec!["eth0", "eth1"]);
    assert_eq!(report.total_candidates, 14 + 2 + 6);
    assert_eq!(report.active_count(), 2);

    let eth1 = report.get("eth1").unwrap();
    assert_eq!(eth1.interface.addresses().len(), 2);
    let eth1 = eth1.outcome.as_ref().unwrap();
    assert_eq!(eth1.all_hosts.len(), 8);
    assert_eq!(eth1.active_hosts, vec![Ipv4Addr::new(10, 30, 0, 3)]);
}

#[tokio::test]
async fn named_scan_finds_the_interface() {
    let net = FakeNetwork::with_live([Ipv4Addr::new(192, 168, 50, 11)]);
    let (lan, report) = engine(net).scan_interface_named("eth0").await.unwrap();

    assert_eq!(lan.name, "eth0");
    assert_eq!(report.all_hosts.len(), 14);
    assert_eq!(report.sorted_active(), vec![Ipv4Addr::new(192, 168, 50, 11)]);
}

#[tokio::test]
async fn named_scan_rejects_unknown_and_oversized_interfaces() {
    for name in ["wlan0", "eth2", "tun0"] {
        let result = engine(FakeNetwork::default()).scan_interface_named(name).await;
        assert!(
            matches!(result, Err(ScanError::InterfaceNotFound(ref missing)) if missing == name),
            "{name}"
        );
    }
}

#[tokio::test]
async fn narrowing_to_one_interface_sweeps_only_it() {
    let net = Arc::new(FakeNetwork::with_live([Ipv4Addr::new(10, 20, 0, 2)]));
    let engine = Engine::with_factory(ScanConfig::default(), Arc::new(FakeFactory(net.clone())))
        .unwrap()
        .with_interface_source(Arc::new(host_table()));

    let eth1 = engine.find_interface("eth1").unwrap();
    let report = engine.scan_interfaces(std::slice::from_ref(&eth1)).await;

    assert_eq!(report.results.keys().collect::<Vec<_>>(), vec!["eth1"]);
    assert_eq!(report.total_candidates, 8);
    assert_eq!(report.active_count(), 1);
    assert_eq!(net.probed().len(), 8);
    assert!(matches!(
        engine.find_interface("eth2"),
        Err(ScanError::InterfaceNotFound(ref missing)) if missing == "eth2"
    ));
}
