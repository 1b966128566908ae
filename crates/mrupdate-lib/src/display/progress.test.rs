use super::*;

#[test]
fn test_hidden_tracker_counts() {
    let styling = StyleManager::plain();
    let tracker = ProgressTracker::bar(&styling, 3, false);

    tracker.inc();
    tracker.inc();
    assert_eq!(tracker.position(), 2);
    tracker.finish("done");
}

#[test]
fn test_outcome_lines_use_semantic_symbols() {
    let styling = StyleManager::plain();
    let progress = CliProgress::new(&styling, false);

    assert_eq!(
        progress.format_outcome("Sodium", OutcomeKind::Updated, "Updated 1 -> 2"),
        "+ Sodium: Updated 1 -> 2"
    );
    assert_eq!(
        progress.format_outcome("gone.jar", OutcomeKind::Missing, "not found on Modrinth"),
        "! gone.jar: not found on Modrinth"
    );
    assert_eq!(
        progress.format_outcome("Iris", OutcomeKind::Error, "download failed"),
        "x Iris: download failed"
    );
}

#[test]
fn test_cli_progress_handles_full_event_sequence() {
    let styling = StyleManager::plain();
    let progress = CliProgress::new(&styling, false);

    progress.emit(ProgressEvent::RunStarted { total: 1 });
    progress.emit(ProgressEvent::ModStarted {
        index: 0,
        name: "sodium.jar".to_string(),
    });
    progress.emit(ProgressEvent::ModFinished {
        index: 0,
        name: "sodium.jar".to_string(),
        kind: OutcomeKind::UpToDate,
        detail: "Already up-to-date (0.5.8)".to_string(),
    });
    progress.emit(ProgressEvent::RunFinished {
        updated: 0,
        up_to_date: 1,
        failed: 0,
    });

    assert_eq!(progress.tracker().map(ProgressTracker::position), Some(1));
}
