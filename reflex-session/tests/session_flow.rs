use rand::SeedableRng;
use rand::rngs::StdRng;
use reflex_core::{Error, StimulusCatalog, StimulusId, StimulusItem};
use reflex_session::{Session, SessionEvent, TestConfig, TrialPhase};

fn catalog(ids: &[&str]) -> StimulusCatalog {
    let mut catalog = StimulusCatalog::new();
    for id in ids {
        catalog
            .add(StimulusItem::new(
                StimulusId::new(*id),
                format!("{id}.png"),
                id.to_uppercase(),
            ))
            .unwrap();
    }
    catalog
}

fn session(ids: &[&str], config: TestConfig) -> Session<StdRng> {
    let mut session = Session::new(catalog(ids), StdRng::seed_from_u64(11));
    session.configure(config).unwrap();
    session
}

/// Fires timers until the response window opens; returns the time at
/// which it opened.
fn drive_to_response_window(session: &mut Session<StdRng>) -> u64 {
    let mut now = 0;
    while session.current_phase() != TrialPhase::ResponseWindow {
        now = session.next_deadline_ms().expect("a timer should be pending");
        session.advance(now);
    }
    now
}

#[test]
fn reaction_time_is_measured_from_masking_entry() {
    let mut session = session(&["a", "b"], TestConfig::new(500, 2, "Space").unwrap());
    session.start(0).unwrap();
    assert_eq!(session.plan_len(), 4);
    assert_eq!(session.current_trial_index(), 0);

    // Armed for 1000 ms, Presenting for 500 ms, Masking for 100 ms.
    assert_eq!(session.next_deadline_ms(), Some(1000));
    session.advance(1000);
    assert_eq!(session.current_phase(), TrialPhase::Presenting);
    assert_eq!(session.next_deadline_ms(), Some(1500));
    session.advance(1500);
    assert_eq!(session.current_phase(), TrialPhase::Masking);
    session.advance(1600);
    assert_eq!(session.current_phase(), TrialPhase::ResponseWindow);

    let events = session.response_key("Space", 1650);
    match &events[..] {
        [
            SessionEvent::TrialRecorded(record),
            SessionEvent::PhaseChanged(TrialPhase::Recorded),
        ] => {
            // 1650 - 1500 (onset at Presenting -> Masking), not
            // 1650 - 1000 (trial start).
            assert_eq!(record.reaction_ms, 150);
            assert_eq!(record.response_key, "Space");
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[test]
fn response_at_window_open_measures_the_mask_duration() {
    let mut session = session(&["a"], TestConfig::new(500, 1, "Space").unwrap());
    session.start(0).unwrap();
    let opened = drive_to_response_window(&mut session);

    let events = session.response_key("Space", opened);
    let SessionEvent::TrialRecorded(record) = &events[0] else {
        panic!("expected a record, got {events:?}");
    };
    assert_eq!(record.reaction_ms, 100);
}

#[test]
fn full_run_records_one_trial_per_plan_entry() {
    let mut session = session(&["a", "b"], TestConfig::new(500, 2, "Space").unwrap());
    session.start(0).unwrap();

    let mut completed = None;
    for _ in 0..4 {
        let opened = drive_to_response_window(&mut session);
        session.response_key("Space", opened + 50);
        if let Some(deadline) = session.next_deadline_ms() {
            for event in session.advance(deadline) {
                if let SessionEvent::SessionComplete(records) = event {
                    completed = Some(records);
                }
            }
        }
    }

    let records = completed.expect("session should complete");
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|record| record.reaction_ms == 50));
    assert_eq!(session.current_phase(), TrialPhase::Complete);
    assert_eq!(session.summary().total_measurements, 4);
    assert_eq!(session.summary().tested_items, 2);
    assert_eq!(session.summary().mean_reaction_ms, 50);
}

#[test]
fn non_matching_key_leaves_the_window_open() {
    let mut session = session(&["a"], TestConfig::new(500, 1, "Space").unwrap());
    session.start(0).unwrap();
    let opened = drive_to_response_window(&mut session);

    assert!(session.response_key("Enter", opened + 20).is_empty());
    assert_eq!(session.current_phase(), TrialPhase::ResponseWindow);
    assert!(session.log().is_empty());

    // The window is unbounded; a matching key much later still counts.
    let events = session.response_key(" ", opened + 9000);
    assert!(matches!(events[0], SessionEvent::TrialRecorded(_)));
}

#[test]
fn only_the_first_qualifying_response_produces_a_record() {
    let mut session = session(&["a"], TestConfig::new(500, 1, "Space").unwrap());
    session.start(0).unwrap();
    let opened = drive_to_response_window(&mut session);

    assert_eq!(session.response_key("Space", opened + 30).len(), 2);
    assert!(session.response_key("Space", opened + 31).is_empty());
    assert!(session.response_key("Space", opened + 500).is_empty());
    assert_eq!(session.log().len(), 1);
}

#[test]
fn input_outside_the_response_window_is_ignored() {
    let mut session = session(&["a"], TestConfig::new(500, 1, "Space").unwrap());
    session.start(0).unwrap();

    assert!(session.response_key("Space", 10).is_empty()); // Armed
    session.advance(1000);
    assert!(session.response_key("Space", 1200).is_empty()); // Presenting
    session.advance(1500);
    assert!(session.response_key("Space", 1550).is_empty()); // Masking
    assert!(session.log().is_empty());
}

#[test]
fn start_with_an_empty_catalog_fails_and_stays_idle() {
    let mut session = Session::new(StimulusCatalog::new(), StdRng::seed_from_u64(11));
    assert!(matches!(session.start(0), Err(Error::Validation(_))));
    assert_eq!(session.current_phase(), TrialPhase::Idle);
    assert_eq!(session.next_deadline_ms(), None);
}

#[test]
fn start_and_configure_are_rejected_while_running() {
    let mut session = session(&["a"], TestConfig::new(500, 1, "Space").unwrap());
    session.start(0).unwrap();

    assert!(matches!(
        session.start(10),
        Err(Error::State { operation: "start", .. })
    ));
    assert!(matches!(
        session.configure(TestConfig::new(300, 1, "Space").unwrap()),
        Err(Error::State { operation: "configure", .. })
    ));
    // The running session is untouched.
    assert_eq!(session.current_phase(), TrialPhase::Armed);
    assert_eq!(session.config().display_time_ms(), 500);
}

#[test]
fn stop_mid_presenting_cancels_the_run() {
    let mut session = session(&["a", "b"], TestConfig::new(500, 2, "Space").unwrap());
    session.start(0).unwrap();
    session.advance(1000);
    assert_eq!(session.current_phase(), TrialPhase::Presenting);

    let events = session.stop();
    assert_eq!(events, vec![SessionEvent::PhaseChanged(TrialPhase::Idle)]);
    assert_eq!(session.next_deadline_ms(), None);

    // A timer that would have fired at 1500 is gone.
    assert!(session.advance(5000).is_empty());
    assert_eq!(session.current_phase(), TrialPhase::Idle);
}

#[test]
fn removing_the_active_stimulus_discards_the_trial_but_advances() {
    let mut session = session(&["a"], TestConfig::new(500, 2, "Space").unwrap());
    session.start(0).unwrap();

    let opened = drive_to_response_window(&mut session);
    session.response_key("Space", opened + 40);
    assert_eq!(session.log().len(), 1);

    let id = StimulusId::new("a");
    session.remove_stimulus(&id).unwrap();

    let opened = drive_to_response_window(&mut session);
    let events = session.response_key("Space", opened + 40);
    assert_eq!(
        events,
        vec![
            SessionEvent::TrialDiscarded(id),
            SessionEvent::PhaseChanged(TrialPhase::Recorded),
        ]
    );
    assert_eq!(session.log().len(), 1);

    // The session still finishes.
    let deadline = session.next_deadline_ms().unwrap();
    let events = session.advance(deadline);
    assert!(
        events
            .iter()
            .any(|event| matches!(event, SessionEvent::SessionComplete(records) if records.len() == 1))
    );
    assert_eq!(session.current_phase(), TrialPhase::Complete);
}

#[test]
fn log_accumulates_across_runs_and_completion_reports_only_the_last() {
    let mut session = session(&["a"], TestConfig::new(500, 1, "Space").unwrap());

    for run in 0..2u64 {
        let base = run * 100_000;
        session.start(base).unwrap();
        let opened = drive_to_response_window(&mut session);
        session.response_key("Space", opened + 60);
        let deadline = session.next_deadline_ms().unwrap();
        let completed = session
            .advance(deadline)
            .into_iter()
            .find_map(|event| match event {
                SessionEvent::SessionComplete(records) => Some(records),
                _ => None,
            })
            .expect("run should complete");
        assert_eq!(completed.len(), 1);
    }

    assert_eq!(session.log().len(), 2);
    assert_eq!(session.summary().total_measurements, 2);
}
