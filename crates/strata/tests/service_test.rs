use futures::StreamExt;
use futures::executor::block_on;
use strata::{DiagramEvent, Error, LayoutAction, LayoutConfig, LayoutService, ServiceConfig};

fn slow_window() -> ServiceConfig {
    ServiceConfig {
        debounce_ms: 1_000,
        ..ServiceConfig::default()
    }
}

#[test]
fn events_inside_the_window_are_coalesced_into_one_pass() {
    let (service, mut batches) =
        LayoutService::spawn(LayoutConfig::default(), slow_window()).unwrap();

    service.submit(DiagramEvent::node("A", 100.0, 50.0)).unwrap();
    service.submit(DiagramEvent::node("B", 100.0, 50.0)).unwrap();
    service
        .submit(DiagramEvent::connector("e1", "B", "A"))
        .unwrap();
    block_on(service.flush().unwrap()).unwrap();

    let batch = block_on(batches.next()).unwrap();
    assert_eq!(batch.events.len(), 3);
    let actions = batch.outcome.unwrap();
    assert_eq!(
        actions
            .iter()
            .filter(|a| matches!(a, LayoutAction::MoveNode { .. }))
            .count(),
        2
    );
}

#[test]
fn a_failed_batch_is_reported_and_the_service_keeps_running() {
    let (service, mut batches) =
        LayoutService::spawn(LayoutConfig::default(), slow_window()).unwrap();

    service
        .submit(DiagramEvent::NodeRemoved {
            node: "ghost".into(),
        })
        .unwrap();
    block_on(service.flush().unwrap()).unwrap();
    let failed = block_on(batches.next()).unwrap();
    assert!(matches!(failed.outcome, Err(Error::UnknownNode { .. })));

    service.submit(DiagramEvent::node("A", 100.0, 50.0)).unwrap();
    block_on(service.flush().unwrap()).unwrap();
    let ok = block_on(batches.next()).unwrap();
    assert_eq!(ok.outcome.unwrap().len(), 1);
}

#[test]
fn batches_arrive_in_submission_order() {
    let (service, mut batches) =
        LayoutService::spawn(LayoutConfig::default(), ServiceConfig::default()).unwrap();
    let handle = service.handle();

    for i in 0..5 {
        handle
            .submit(DiagramEvent::node(format!("n{i}"), 10.0, 10.0))
            .unwrap();
        block_on(handle.flush().unwrap()).unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..5 {
        let batch = block_on(batches.next()).unwrap();
        for event in batch.events {
            if let DiagramEvent::NodeAdded { node, .. } = event {
                seen.push(node.to_string());
            }
        }
    }
    assert_eq!(seen, vec!["n0", "n1", "n2", "n3", "n4"]);
}

#[test]
fn max_batch_splits_a_burst() {
    let config = ServiceConfig {
        debounce_ms: 1_000,
        max_batch: 2,
        ..ServiceConfig::default()
    };
    let (service, mut batches) = LayoutService::spawn(LayoutConfig::default(), config).unwrap();

    for i in 0..3 {
        service
            .submit(DiagramEvent::node(format!("n{i}"), 10.0, 10.0))
            .unwrap();
    }
    block_on(service.flush().unwrap()).unwrap();

    assert_eq!(block_on(batches.next()).unwrap().events.len(), 2);
    assert_eq!(block_on(batches.next()).unwrap().events.len(), 1);
}

#[test]
fn shutdown_processes_queued_events_then_closes() {
    let (mut service, mut batches) =
        LayoutService::spawn(LayoutConfig::default(), slow_window()).unwrap();
    let handle = service.handle();

    handle.submit(DiagramEvent::node("A", 100.0, 50.0)).unwrap();
    service.shutdown();

    let batch = block_on(batches.next()).unwrap();
    assert_eq!(batch.events.len(), 1);
    assert!(block_on(batches.next()).is_none());

    assert!(matches!(
        handle.submit(DiagramEvent::node("B", 1.0, 1.0)),
        Err(Error::ServiceClosed)
    ));
    assert!(matches!(handle.flush(), Err(Error::ServiceClosed)));
}
