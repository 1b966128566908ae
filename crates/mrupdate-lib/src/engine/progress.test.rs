use super::*;

#[test]
fn test_cancellation_shared_between_clones() {
    let flag = CancellationFlag::new();
    let handle = flag.clone();
    assert!(!flag.is_cancelled());

    handle.cancel();
    assert!(flag.is_cancelled());
}

#[tokio::test]
async fn test_channel_progress_delivers_in_order() {
    let (sink, mut receiver) = ChannelProgress::channel();

    sink.emit(ProgressEvent::RunStarted { total: 2 });
    sink.emit(ProgressEvent::ModStarted {
        index: 0,
        name: "sodium.jar".to_string(),
    });
    drop(sink);

    assert_eq!(
        receiver.recv().await,
        Some(ProgressEvent::RunStarted { total: 2 })
    );
    assert!(matches!(
        receiver.recv().await,
        Some(ProgressEvent::ModStarted { index: 0, .. })
    ));
    assert_eq!(receiver.recv().await, None);
}

#[test]
fn test_channel_progress_tolerates_dropped_receiver() {
    let (sink, receiver) = ChannelProgress::channel();
    drop(receiver);
    sink.emit(ProgressEvent::RunStarted { total: 1 });
}
