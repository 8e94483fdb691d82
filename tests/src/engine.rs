use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use hostsweep_common::config::ScanConfig;
use hostsweep_common::error::ScanError;
use hostsweep_common::network::interface::LanInterface;
use hostsweep_core::engine::Engine;

use crate::support::{FakeFactory, FakeNetwork};

fn engine(net: &Arc<FakeNetwork>, max_in_flight: usize) -> Engine {
    let cfg = ScanConfig { max_in_flight, ..ScanConfig::default() };
    Engine::with_factory(cfg, Arc::new(FakeFactory(net.clone()))).unwrap()
}

fn lan(name: &str, addr: [u8; 4], prefix: u8) -> LanInterface {
    LanInterface::new(name, None).with_address(Ipv4Addr::from(addr), prefix)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn admission_gate_bounds_probes_across_interfaces() {
    let net = Arc::new(FakeNetwork::silent());
    let interfaces = vec![
        lan("eth0", [10, 0, 0, 1], 26),
        lan("eth1", [10, 0, 1, 1], 26),
        lan("eth2", [10, 0, 2, 1], 26),
    ];

    let report = engine(&net, 5).scan_interfaces(&interfaces).await;

    assert_eq!(net.probed().len(), 62 * 3);
    assert!(net.peak() <= 5, "peak in flight {}", net.peak());
    assert_eq!(report.total_candidates, 62 * 3);
}

#[tokio::test]
async fn gate_of_one_serializes_probes() {
    let net = Arc::new(FakeNetwork::with_live([Ipv4Addr::new(192, 168, 0, 2)]));
    let report = engine(&net, 1)
        .scan_interfaces(&[lan("eth0", [192, 168, 0, 1], 29)])
        .await;

    assert_eq!(net.peak(), 1);
    let scan = report.get("eth0").unwrap().outcome.as_ref().unwrap();
    assert_eq!(scan.active_hosts, vec![Ipv4Addr::new(192, 168, 0, 2)]);
}

#[tokio::test]
async fn broken_interface_does_not_affect_siblings() {
    let mut net = FakeNetwork::with_live([Ipv4Addr::new(10, 1, 0, 5), Ipv4Addr::new(10, 3, 0, 9)]);
    net.broken_interfaces.insert(String::from("eth1"));
    let net = Arc::new(net);

    let interfaces = vec![
        lan("eth0", [10, 1, 0, 1], 28),
        lan("eth1", [10, 2, 0, 1], 28),
        lan("eth2", [10, 3, 0, 1], 28),
    ];
    let report = engine(&net, 16).scan_interfaces(&interfaces).await;

    assert_eq!(report.results.len(), 3);
    assert!(matches!(
        report.get("eth1").unwrap().outcome,
        Err(ScanError::LinkChannel { ref interface, .. }) if interface == "eth1"
    ));

    let eth0 = report.get("eth0").unwrap().outcome.as_ref().unwrap();
    let eth2 = report.get("eth2").unwrap().outcome.as_ref().unwrap();
    assert_eq!(eth0.active_hosts, vec![Ipv4Addr::new(10, 1, 0, 5)]);
    assert_eq!(eth2.active_hosts, vec![Ipv4Addr::new(10, 3, 0, 9)]);
    assert!(eth0.is_complete() && eth2.is_complete());

    // Nothing on the broken interface was probed.
    assert!(net.probed().iter().all(|addr| addr.octets()[1] != 2));
}

#[tokio::test]
async fn active_hosts_are_a_deduplicated_subset_of_candidates() {
    let live: Vec<Ipv4Addr> = (1..=20).map(|i| Ipv4Addr::new(172, 16, 4, i)).collect();
    let net = Arc::new(FakeNetwork::with_live(live));

    // Overlapping subnets on one interface.
    let interface = LanInterface::new("br0", None)
        .with_address(Ipv4Addr::new(172, 16, 4, 1), 27)
        .with_address(Ipv4Addr::new(172, 16, 4, 2), 28);
    let point_to_point = lan("p2p0", [10, 9, 9, 1], 32);
    let report = engine(&net, 8).scan_interfaces(&[interface, point_to_point]).await;
    let scan = report.get("br0").unwrap().outcome.as_ref().unwrap();

    let all: HashSet<Ipv4Addr> = scan.all_hosts.iter().copied().collect();
    let active: HashSet<Ipv4Addr> = scan.active_hosts.iter().copied().collect();
    assert_eq!(all.len(), scan.all_hosts.len());
    assert_eq!(active.len(), scan.active_hosts.len());
    assert!(active.is_subset(&all));
    assert_eq!(scan.all_hosts.len(), 30);
    assert_eq!(scan.active_hosts.len(), 20);
    assert_eq!(net.probed().len(), 30);
    assert_eq!(report.total_candidates, 30);
    assert!(report.get("p2p0").unwrap().outcome.as_ref().unwrap().all_hosts.is_empty());

    let sorted = scan.sorted_active();
    assert_eq!(sorted.first(), Some(&Ipv4Addr::new(172, 16, 4, 1)));
    assert_eq!(sorted.last(), Some(&Ipv4Addr::new(172, 16, 4, 20)));
    assert_eq!(scan.inactive_hosts().len(), 10);
}

#[tokio::test]
async fn probe_errors_keep_the_first_and_count_the_rest() {
    let mut net = FakeNetwork::with_live([Ipv4Addr::new(10, 9, 0, 2)]);
    net.failing = (3..=5).map(|i| Ipv4Addr::new(10, 9, 0, i)).collect();
    let net = Arc::new(net);

    let report = engine(&net, 4)
        .scan_interfaces(&[lan("eth0", [10, 9, 0, 1], 29)])
        .await;
    let scan = report.get("eth0").unwrap().outcome.as_ref().unwrap();

    assert!(matches!(scan.first_error, Some(ScanError::Probe(_))));
    assert_eq!(scan.suppressed_errors, 2);
    assert_eq!(scan.active_hosts, vec![Ipv4Addr::new(10, 9, 0, 2)]);
    assert_eq!(scan.all_hosts.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn interfaces_are_swept_concurrently() {
    let mut net = FakeNetwork::silent();
    net.latency = Duration::from_millis(100);
    let net = Arc::new(net);

    let interfaces = vec![lan("eth0", [10, 0, 0, 1], 30), lan("eth1", [10, 0, 1, 1], 30)];
    let report = engine(&net, 64).scan_interfaces(&interfaces).await;

    // Four probes of 100ms each, all admitted at once.
    assert!(report.elapsed < Duration::from_millis(200), "elapsed {:?}", report.elapsed);
    assert_eq!(net.probed().len(), 4);
}
