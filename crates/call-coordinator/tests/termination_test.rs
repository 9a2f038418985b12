//! Termination behaviour: every trigger converges on one teardown
//!
//! Whatever ends the session (stream completion, stream failure, terminate(),
//! stop() or dropping the coordinator), observers are told exactly once and
//! every tracked resource is released.

mod common;

use std::sync::Arc;

use rvoip_call_coordinator::{
    ChatMessage, CoordinatorError, CoordinatorEvent, CoordinatorState, ErrorInfo,
    SessionCoordinator, TerminationCause,
};

use common::{
    collect_until_terminated, start_coordinator, tagged_bodies, wait_connected, RecordingObserver,
    RecordingSession,
};

#[tokio::test]
async fn completed_stream_produces_ordered_log_and_single_termination() {
    let (session, events) = RecordingSession::new();
    let observer = RecordingObserver::new();
    let coordinator = start_coordinator(session.clone(), observer.clone());

    events.connected();
    events.chat(ChatMessage::from_peer("m1"));
    events.chat(ChatMessage::from_peer("m2"));
    events.complete();

    coordinator.wait_for_termination().await.unwrap();
    coordinator.stop().await.unwrap();

    assert_eq!(
        tagged_bodies(&coordinator.messages()),
        vec!["system:Start", "opp:m1", "opp:m2", "system:Terminated"]
    );
    assert_eq!(coordinator.state(), CoordinatorState::Terminated);
    assert_eq!(observer.terminations(), vec![None]);
    assert_eq!(coordinator.live_resources(), 0);

    // The session ended on its own; nothing to hang up.
    assert_eq!(session.terminate_calls(), 0);
}

#[tokio::test]
async fn failure_is_reported_with_its_error() {
    let (session, events) = RecordingSession::new();
    let observer = RecordingObserver::new();
    let coordinator = start_coordinator(session.clone(), observer.clone());

    events.connected();
    events.fail(ErrorInfo::new("ICE connection failed").with_code(503));

    coordinator.wait_for_termination().await.unwrap();
    coordinator.stop().await.unwrap();

    let terminations = observer.terminations();
    assert_eq!(terminations.len(), 1);
    let error = terminations[0].clone().expect("failure should carry an error");
    assert_eq!(error.message, "ICE connection failed");
    assert_eq!(error.code, Some(503));
    assert_eq!(session.terminate_calls(), 0);
}

#[tokio::test]
async fn failure_before_connect_skips_start_notice() {
    let (session, events) = RecordingSession::new();
    let observer = RecordingObserver::new();
    let coordinator = start_coordinator(session, observer.clone());

    events.fail("busy");
    coordinator.wait_for_termination().await.unwrap();
    coordinator.stop().await.unwrap();

    assert_eq!(tagged_bodies(&coordinator.messages()), vec!["system:Terminated"]);
    assert_eq!(observer.states(), vec![CoordinatorState::Terminated]);
    assert_eq!(observer.terminations(), vec![Some(ErrorInfo::new("busy"))]);
}

#[tokio::test]
async fn repeated_termination_requests_notify_once() {
    let (session, events) = RecordingSession::new();
    let observer = RecordingObserver::new();
    let coordinator = start_coordinator(session.clone(), observer.clone());

    events.connected();
    wait_connected(&coordinator).await;

    coordinator.terminate();
    coordinator.terminate();
    coordinator.terminate();
    coordinator.stop().await.unwrap();
    coordinator.stop().await.unwrap();
    coordinator.terminate();

    // A terminal event arriving late is ignored as well.
    events.fail("late failure");

    assert_eq!(observer.terminations(), vec![None]);
    assert_eq!(session.terminate_calls(), 1);
    assert_eq!(coordinator.live_resources(), 0);
    assert_eq!(
        observer.states().last(),
        Some(&CoordinatorState::Terminated)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn local_and_stream_termination_race_resolves_once() {
    for _ in 0..50 {
        let (session, events) = RecordingSession::new();
        let observer = RecordingObserver::new();
        let coordinator = Arc::new(start_coordinator(session.clone(), observer.clone()));

        events.connected();
        wait_connected(&coordinator).await;

        let local = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.terminate() })
        };
        let remote = tokio::spawn(async move {
            events.fail("network lost");
        });
        let (local, remote) = tokio::join!(local, remote);
        local.unwrap();
        remote.unwrap();

        coordinator.stop().await.unwrap();

        let terminations = observer.terminations();
        assert_eq!(terminations.len(), 1, "terminal notification must fire once");
        match &terminations[0] {
            // Local trigger won: the session was told to hang up.
            None => assert_eq!(session.terminate_calls(), 1),
            // Stream failure won: no hang-up command was sent.
            Some(error) => {
                assert_eq!(error.message, "network lost");
                assert_eq!(session.terminate_calls(), 0);
            }
        }
        assert_eq!(coordinator.live_resources(), 0);
        assert_eq!(
            coordinator
                .messages()
                .iter()
                .filter(|m| m.body() == "Terminated")
                .count(),
            1
        );
    }
}

#[tokio::test]
async fn dropping_the_coordinator_tears_down_the_session() {
    let (session, events) = RecordingSession::new();
    let observer = RecordingObserver::new();
    let coordinator = start_coordinator(session.clone(), observer.clone());

    events.connected();
    wait_connected(&coordinator).await;

    let subscription = coordinator.subscribe();
    drop(coordinator);

    let seen = collect_until_terminated(subscription).await;
    match seen.last() {
        Some(CoordinatorEvent::Terminated { cause, summary }) => {
            assert_eq!(*cause, TerminationCause::OwnerTeardown);
            assert_eq!(summary.message_count, 2);
        }
        other => panic!("expected Terminated, got {:?}", other),
    }
    assert_eq!(session.terminate_calls(), 1);
    assert_eq!(observer.terminations(), vec![None]);
}

#[tokio::test]
async fn stop_before_start_terminates_without_subscribing() {
    let (session, _events) = RecordingSession::new();
    let observer = RecordingObserver::new();
    let coordinator = SessionCoordinator::builder()
        .session(session.clone())
        .observer(observer.clone())
        .build()
        .unwrap();

    coordinator.stop().await.unwrap();

    assert_eq!(session.events_calls(), 0);
    assert_eq!(session.terminate_calls(), 1);
    assert_eq!(observer.terminations(), vec![None]);
    assert!(coordinator.is_terminated());
    assert!(matches!(coordinator.start(), Err(CoordinatorError::AlreadyStopped)));
}

#[tokio::test]
async fn terminate_before_start_ends_the_session_immediately() {
    let (session, _events) = RecordingSession::new();
    let observer = RecordingObserver::new();
    let coordinator = SessionCoordinator::builder()
        .session(session.clone())
        .observer(observer.clone())
        .build()
        .unwrap();

    coordinator.terminate();

    // The hang-up and the state change do not wait for start() or stop().
    assert!(coordinator.is_terminated());
    assert_eq!(session.terminate_calls(), 1);
    assert_eq!(
        tagged_bodies(&coordinator.messages()),
        vec!["system:Terminated"]
    );

    assert!(matches!(coordinator.start(), Err(CoordinatorError::AlreadyStopped)));
    assert_eq!(session.events_calls(), 0);

    coordinator.stop().await.unwrap();
    coordinator.terminate();
    assert_eq!(observer.terminations(), vec![None]);
    assert_eq!(session.terminate_calls(), 1);
}

#[tokio::test]
async fn concurrent_stops_both_wait_for_the_observer() {
    let (session, events) = RecordingSession::new();
    let observer = RecordingObserver::new();
    let coordinator = start_coordinator(session, observer.clone());

    events.connected();
    wait_connected(&coordinator).await;

    let first = async {
        coordinator.stop().await.unwrap();
        observer.terminations().len()
    };
    let second = async {
        coordinator.stop().await.unwrap();
        observer.terminations().len()
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first, 1);
    assert_eq!(second, 1);
}

#[test]
fn dropping_unstarted_coordinator_outside_runtime_notifies_observer() {
    let (session, _events) = RecordingSession::new();
    let observer = RecordingObserver::new();
    let coordinator = SessionCoordinator::builder()
        .session(session.clone())
        .observer(observer.clone())
        .build()
        .unwrap();

    drop(coordinator);

    assert_eq!(session.terminate_calls(), 1);
    assert_eq!(session.events_calls(), 0);
    assert_eq!(observer.states(), vec![CoordinatorState::Terminated]);
    assert_eq!(observer.terminations(), vec![None]);
}

#[tokio::test]
async fn start_twice_is_rejected() {
    let (session, _events) = RecordingSession::new();
    let coordinator = start_coordinator(session.clone(), RecordingObserver::new());

    assert!(matches!(coordinator.start(), Err(CoordinatorError::AlreadyStarted)));
    assert_eq!(session.events_calls(), 1);
    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn terminate_before_connect_is_local_termination() {
    let (session, _events) = RecordingSession::new();
    let observer = RecordingObserver::new();
    let coordinator = start_coordinator(session.clone(), observer.clone());
    let subscription = coordinator.subscribe();

    coordinator.terminate();
    let seen = collect_until_terminated(subscription).await;
    coordinator.stop().await.unwrap();

    match seen.last() {
        Some(CoordinatorEvent::Terminated { cause, summary }) => {
            assert_eq!(*cause, TerminationCause::LocalTermination);
            assert_eq!(summary.elapsed_secs, 0);
            assert_eq!(summary.message_count, 1);
        }
        other => panic!("expected Terminated, got {:?}", other),
    }
    assert_eq!(session.terminate_calls(), 1);
}
