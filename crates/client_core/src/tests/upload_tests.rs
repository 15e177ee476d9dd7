use super::*;
use futures::stream;
use proptest::prelude::*;
use serde_json::json;

fn chunks(n: usize) -> Vec<serde_json::Value> {
    (0..n).map(|index| json!({ "index": index })).collect()
}

fn controller_at(stage: Stage, progress: i64) -> UploadProgressController {
    let mut controller = UploadProgressController::new("paper.pdf");
    assert!(controller
        .apply(&UploadEvent::new(stage, progress))
        .is_applied());
    controller
}

#[test]
fn new_session_starts_idle_and_empty() {
    let controller = UploadProgressController::new("paper.pdf");
    let session = controller.snapshot();
    assert_eq!(session.file_name(), "paper.pdf");
    assert_eq!(session.stage(), Stage::Idle);
    assert_eq!(session.progress(), 0);
    assert!(session.identifiers().is_empty());
    assert_eq!(session.chunk_count(), 0);
    assert!(session.failure().is_none());
}

#[test]
fn clamps_progress_into_percentage_range() {
    let mut controller = UploadProgressController::new("paper.pdf");
    controller.apply(&UploadEvent::new(Stage::Uploading, -25));
    assert_eq!(controller.snapshot().progress(), 0);

    controller.apply(&UploadEvent::new(Stage::Uploading, 250));
    assert_eq!(controller.snapshot().progress(), 100);
    assert_eq!(clamp_progress(i64::MIN), 0);
    assert_eq!(clamp_progress(i64::MAX), 100);
}

#[test]
fn rejects_progress_decrease_within_stage() {
    let mut controller = controller_at(Stage::Uploading, 40);
    let outcome = controller.apply(&UploadEvent::new(Stage::Uploading, 30).with_doi("10.1/x"));
    assert_eq!(
        outcome,
        EventOutcome::Ignored(IgnoreReason::ProgressRegressed {
            stage: Stage::Uploading,
            current: 40,
            reported: 30,
        })
    );
    // The whole event is dropped, identifiers included.
    assert_eq!(controller.snapshot().progress(), 40);
    assert!(controller.snapshot().identifiers().is_empty());
}

#[test]
fn clamped_value_is_what_regression_is_measured_against() {
    let mut controller = controller_at(Stage::Processing, 180);
    assert_eq!(controller.snapshot().progress(), 100);
    assert!(!controller
        .apply(&UploadEvent::new(Stage::Processing, 99))
        .is_applied());
    assert!(controller
        .apply(&UploadEvent::new(Stage::Processing, 100))
        .is_applied());
}

#[test]
fn stage_advance_resets_progress_baseline() {
    let mut controller = controller_at(Stage::Uploading, 100);
    assert!(controller
        .apply(&UploadEvent::new(Stage::Processing, 5))
        .is_applied());
    assert_eq!(controller.snapshot().stage(), Stage::Processing);
    assert_eq!(controller.snapshot().progress(), 5);
}

#[test]
fn stages_may_be_skipped_forward_but_never_revisited() {
    let mut controller = controller_at(Stage::Uploading, 50);
    assert!(controller
        .apply(&UploadEvent::new(Stage::Chunking, 10))
        .is_applied());

    let outcome = controller.apply(&UploadEvent::new(Stage::Extracting, 90));
    assert_eq!(
        outcome,
        EventOutcome::Ignored(IgnoreReason::StageRegressed {
            from: Stage::Chunking,
            to: Stage::Extracting,
        })
    );
    assert_eq!(controller.snapshot().stage(), Stage::Chunking);
    assert_eq!(controller.snapshot().progress(), 10);
}

#[test]
fn unknown_stage_names_are_ignored() {
    let mut controller = controller_at(Stage::Processing, 20);
    let mut event = UploadEvent::new(Stage::Processing, 70);
    event.stage = "ocr".to_string();
    assert_eq!(
        controller.apply(&event),
        EventOutcome::Ignored(IgnoreReason::UnknownStage("ocr".to_string()))
    );
    assert_eq!(controller.snapshot().progress(), 20);
}

#[test]
fn identifiers_reported_separately_are_merged() {
    let mut controller = UploadProgressController::new("paper.pdf");
    controller.apply(&UploadEvent::new(Stage::Extracting, 30).with_doi("10.1/x"));
    controller.apply(&UploadEvent::new(Stage::Extracting, 60).with_isbn("978-1"));
    controller.apply(&UploadEvent::new(Stage::Complete, 100));

    let ids = controller.snapshot().identifiers();
    assert_eq!(ids.doi.as_deref(), Some("10.1/x"));
    assert_eq!(ids.isbn.as_deref(), Some("978-1"));
}

#[test]
fn chunk_array_sets_chunk_count() {
    let mut controller = controller_at(Stage::Chunking, 10);
    controller.apply(&UploadEvent::new(Stage::Chunking, 50).with_chunks(chunks(4)));
    assert_eq!(controller.snapshot().chunk_count(), 4);

    // Events without a chunk array leave the count alone.
    controller.apply(&UploadEvent::new(Stage::Chunking, 80));
    assert_eq!(controller.snapshot().chunk_count(), 4);
}

#[test]
fn complete_forces_full_progress() {
    let mut controller = controller_at(Stage::Chunking, 70);
    controller.apply(&UploadEvent::new(Stage::Complete, 95));
    assert_eq!(controller.snapshot().stage(), Stage::Complete);
    assert_eq!(controller.snapshot().progress(), 100);
}

#[test]
fn error_event_freezes_progress_and_keeps_diagnostics() {
    let mut controller = UploadProgressController::new("paper.pdf");
    controller.apply(&UploadEvent::new(Stage::Extracting, 40).with_doi("10.1/x"));
    controller.apply(&UploadEvent::new(Stage::Chunking, 55).with_chunks(chunks(3)));

    let mut failure = UploadEvent::failed("pdf text layer unreadable").with_isbn("978-9");
    failure.progress = 0;
    assert!(controller.apply(&failure).is_applied());

    let session = controller.snapshot();
    assert_eq!(session.stage(), Stage::Error);
    assert_eq!(session.progress(), 55);
    assert_eq!(session.chunk_count(), 3);
    assert_eq!(session.identifiers().doi.as_deref(), Some("10.1/x"));
    assert_eq!(session.identifiers().isbn, None);
    assert_eq!(session.failed_stage(), Some(Stage::Chunking));
    assert_eq!(
        session.failure(),
        Some(ProcessingFailure("pdf text layer unreadable".to_string()))
    );
}

#[test]
fn error_is_reachable_from_every_non_terminal_stage() {
    for stage in [
        Stage::Idle,
        Stage::Uploading,
        Stage::Processing,
        Stage::Extracting,
        Stage::Chunking,
    ] {
        let mut controller = UploadProgressController::new("paper.pdf");
        if stage != Stage::Idle {
            controller.apply(&UploadEvent::new(stage, 12));
        }
        assert!(controller.apply(&UploadEvent::failed("boom")).is_applied());
        assert_eq!(controller.snapshot().stage(), Stage::Error);
        assert_eq!(controller.snapshot().failed_stage(), Some(stage));
    }
}

#[test]
fn error_without_message_gets_a_default_reason() {
    let mut controller = controller_at(Stage::Processing, 10);
    let mut event = UploadEvent::new(Stage::Error, 0);
    event.message = Some("   ".to_string());
    controller.apply(&event);
    assert_eq!(
        controller.snapshot().error_message(),
        Some(DEFAULT_FAILURE_MESSAGE)
    );
}

#[test]
fn terminal_sessions_ignore_further_events() {
    let mut failed = controller_at(Stage::Processing, 10);
    failed.fail("network down");
    let outcome = failed.apply(&UploadEvent::new(Stage::Complete, 100));
    assert_eq!(
        outcome,
        EventOutcome::Ignored(IgnoreReason::SessionFinished(Stage::Error))
    );
    assert_eq!(
        failed.fail("again"),
        EventOutcome::Ignored(IgnoreReason::SessionFinished(Stage::Error))
    );
    assert_eq!(failed.snapshot().error_message(), Some("network down"));

    let mut complete = controller_at(Stage::Complete, 100);
    assert!(!complete.apply(&UploadEvent::failed("late")).is_applied());
    assert_eq!(complete.snapshot().stage(), Stage::Complete);
}

#[test]
fn mark_accepted_moves_idle_session_to_uploading() {
    let mut controller = UploadProgressController::new("paper.pdf");
    assert!(controller.mark_accepted(UploadId(7)).is_applied());
    assert_eq!(controller.snapshot().upload_id(), Some(UploadId(7)));
    assert_eq!(controller.snapshot().stage(), Stage::Uploading);

    let mut ahead = controller_at(Stage::Processing, 30);
    ahead.mark_accepted(UploadId(8));
    assert_eq!(ahead.snapshot().stage(), Stage::Processing);
    assert_eq!(ahead.snapshot().progress(), 30);
}

#[test]
fn begin_discards_previous_session() {
    let mut controller = controller_at(Stage::Chunking, 90);
    controller.fail("boom");
    controller.begin("next.pdf");
    let session = controller.snapshot();
    assert_eq!(session.file_name(), "next.pdf");
    assert_eq!(session.stage(), Stage::Idle);
    assert!(session.error_message().is_none());
    assert!(session.failed_stage().is_none());
}

const STREAM_STAGES: [Stage; 5] = [
    Stage::Idle,
    Stage::Uploading,
    Stage::Processing,
    Stage::Extracting,
    Stage::Chunking,
];

fn arb_stream_event() -> impl Strategy<Value = UploadEvent> {
    (
        prop::sample::select(STREAM_STAGES.to_vec()),
        -30i64..130,
        prop::option::of(prop::sample::select(vec!["10.1000/a", "10.1000/b", "  "])),
        prop::option::of(prop::sample::select(vec!["978-3-16-148410-0", ""])),
        prop::option::of(0usize..6),
    )
        .prop_map(|(stage, progress, doi, isbn, chunk_count)| {
            let mut event = UploadEvent::new(stage, progress);
            if let Some(doi) = doi {
                event = event.with_doi(doi);
            }
            if let Some(isbn) = isbn {
                event = event.with_isbn(isbn);
            }
            if let Some(count) = chunk_count {
                event = event.with_chunks(chunks(count));
            }
            event
        })
}

proptest! {
    #[test]
    fn stage_and_progress_never_move_backwards(
        events in prop::collection::vec(arb_stream_event(), 0..40)
    ) {
        let mut controller = UploadProgressController::new("paper.pdf");
        let mut previous = (controller.snapshot().stage(), controller.snapshot().progress());
        for event in &events {
            controller.apply(event);
            let current = (controller.snapshot().stage(), controller.snapshot().progress());
            prop_assert!(current.0 >= previous.0, "stage went backwards");
            prop_assert!(current.1 <= 100);
            if current.0 == previous.0 {
                prop_assert!(current.1 >= previous.1, "progress went backwards");
            }
            previous = current;
        }
    }

    #[test]
    fn identifiers_keep_the_latest_non_blank_value(
        events in prop::collection::vec(arb_stream_event(), 0..40)
    ) {
        let mut controller = UploadProgressController::new("paper.pdf");
        let mut doi: Option<String> = None;
        let mut isbn: Option<String> = None;
        for event in &events {
            if !controller.apply(event).is_applied() {
                continue;
            }
            let reported = event.identifiers.clone().unwrap_or_default();
            if let Some(value) = reported.doi.filter(|v| !v.trim().is_empty()) {
                doi = Some(value.trim().to_string());
            }
            if let Some(value) = reported.isbn.filter(|v| !v.trim().is_empty()) {
                isbn = Some(value.trim().to_string());
            }
        }
        let identifiers = controller.snapshot().identifiers();
        prop_assert_eq!(identifiers.doi.clone(), doi);
        prop_assert_eq!(identifiers.isbn.clone(), isbn);
    }

    #[test]
    fn error_event_freezes_diagnostics(
        events in prop::collection::vec(arb_stream_event(), 0..20),
        message in "[a-z ]{0,12}",
    ) {
        let mut controller = UploadProgressController::new("paper.pdf");
        for event in &events {
            controller.apply(event);
        }
        let before = controller.snapshot().clone();

        prop_assert!(controller.apply(&UploadEvent::failed(message.clone())).is_applied());
        let after = controller.snapshot();
        prop_assert_eq!(after.stage(), Stage::Error);
        prop_assert_eq!(after.failed_stage(), Some(before.stage()));
        prop_assert_eq!(after.progress(), before.progress());
        prop_assert_eq!(after.identifiers(), before.identifiers());
        prop_assert_eq!(after.chunk_count(), before.chunk_count());
        let expected = match message.trim() {
            "" => DEFAULT_FAILURE_MESSAGE,
            trimmed => trimmed,
        };
        prop_assert_eq!(after.error_message(), Some(expected));
    }
}

#[tokio::test]
async fn drive_upload_folds_stream_until_terminal_event() {
    let events = stream::iter(vec![
        Ok(UploadEvent::new(Stage::Uploading, 50)),
        Ok(UploadEvent::new(Stage::Extracting, 20).with_doi("10.1/x")),
        Err(UploadError::Protocol("expected value at line 1".into())),
        Ok(UploadEvent::new(Stage::Chunking, 60).with_chunks(chunks(2))),
        Ok(UploadEvent::new(Stage::Complete, 100)),
        Ok(UploadEvent::failed("never seen")),
    ]);

    let mut controller = UploadProgressController::new("paper.pdf");
    let mut seen = Vec::new();
    drive_upload(&mut controller, events, |session| {
        seen.push(session.stage());
    })
    .await;

    assert_eq!(
        seen,
        vec![
            Stage::Uploading,
            Stage::Extracting,
            Stage::Chunking,
            Stage::Complete
        ]
    );
    assert_eq!(controller.snapshot().chunk_count(), 2);
    assert!(controller.snapshot().failure().is_none());
}

#[tokio::test]
async fn drive_upload_fails_session_when_stream_ends_early() {
    let events = stream::iter(vec![Ok(UploadEvent::new(Stage::Processing, 30))]);
    let mut controller = UploadProgressController::new("paper.pdf");
    drive_upload(&mut controller, events, |_| {}).await;

    let session = controller.snapshot();
    assert_eq!(session.stage(), Stage::Error);
    assert_eq!(session.progress(), 30);
    assert_eq!(session.failed_stage(), Some(Stage::Processing));
    assert_eq!(session.error_message(), Some(STREAM_CLOSED_MESSAGE));
}

#[tokio::test]
async fn pump_events_reports_transport_errors_and_stops() {
    let events = stream::iter(vec![
        Ok(UploadEvent::new(Stage::Uploading, 10)),
        Err(UploadError::NotLoggedIn("missing session")),
        Ok(UploadEvent::new(Stage::Uploading, 20)),
    ]);
    let mut items = Vec::new();
    pump_events(events, |item| items.push(item)).await;

    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], FeedItem::Event(_)));
    assert!(matches!(&items[1], FeedItem::Failed(msg) if msg.contains("missing session")));
}
