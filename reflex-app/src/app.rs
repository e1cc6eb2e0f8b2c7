use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal;
use rand::rngs::ThreadRng;
use reflex_core::{StimulusCatalog, StimulusId, StimulusItem, TrialRecord};
use reflex_session::{Session, SessionEvent, TestConfig, TrialPhase};
use reflex_timing::{Clock, MonotonicClock};
use std::fs::File;
use std::time::Duration;

const LOG_PATH: &str = "session_log.json";

/// Terminal host for the reaction-time engine. Stands in for a real
/// UI: it sleeps until the engine's next deadline, feeds key presses
/// in as normalized codes, and renders phases as text prompts.
pub struct App {
    session: Session<ThreadRng>,
    clock: MonotonicClock,
}

impl App {
    pub fn new() -> Result<Self> {
        let mut catalog = StimulusCatalog::new();
        for (id, source, label) in [
            ("1", "assets/stimulus-1.png", "Stimulus 1"),
            ("2", "assets/stimulus-2.png", "Stimulus 2"),
            ("3", "assets/stimulus-3.png", "Stimulus 3"),
        ] {
            catalog.add(StimulusItem::new(StimulusId::new(id), source, label))?;
        }

        let mut session = Session::new(catalog, rand::rng());
        session.configure(TestConfig::new(500, 3, "Space")?)?;

        Ok(Self {
            session,
            clock: MonotonicClock::new(),
        })
    }

    pub fn run(mut self) -> Result<()> {
        print!("=== VISUAL REACTION TEST ===\r\n");
        print!(
            "{} stimuli x {} repetitions, {} ms display, respond with {}\r\n",
            self.session.catalog().len(),
            self.session.config().repetitions(),
            self.session.config().display_time_ms(),
            self.session.config().response_key(),
        );
        print!("Press Q or ESC to abort.\r\n\r\n");

        terminal::enable_raw_mode()?;
        let result = self.event_loop();
        terminal::disable_raw_mode()?;
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let events = self.session.start(self.clock.now_ms())?;
        if self.show(&events)? {
            return Ok(());
        }

        loop {
            let now = self.clock.now_ms();
            let timeout = self
                .session
                .next_deadline_ms()
                .map(|deadline| Duration::from_millis(deadline.saturating_sub(now)))
                .unwrap_or(Duration::from_millis(250));

            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            self.session.stop();
                            print!("\r\nAborted.\r\n");
                            return Ok(());
                        }
                        code => {
                            let events =
                                self.session.response_key(&key_name(code), self.clock.now_ms());
                            if self.show(&events)? {
                                return Ok(());
                            }
                        }
                    }
                }
            }

            let events = self.session.advance(self.clock.now_ms());
            if self.show(&events)? {
                return Ok(());
            }
        }
    }

    /// Renders a batch of engine events. Returns true once the session
    /// has completed.
    fn show(&self, events: &[SessionEvent]) -> Result<bool> {
        for event in events {
            match event {
                SessionEvent::PhaseChanged(TrialPhase::Armed) => {
                    print!(
                        "\r\n[{}/{}] Get ready...\r\n",
                        self.session.current_trial_index() + 1,
                        self.session.plan_len(),
                    );
                }
                SessionEvent::PhaseChanged(TrialPhase::Presenting) => {
                    match self.session.current_stimulus() {
                        Some(item) => print!(">>> {} <<<\r\n", item.label),
                        None => print!(">>> (stimulus missing) <<<\r\n"),
                    }
                }
                SessionEvent::PhaseChanged(TrialPhase::Masking) => {
                    print!("          \r\n");
                }
                SessionEvent::PhaseChanged(TrialPhase::ResponseWindow) => {
                    print!("PRESS {} NOW!\r\n", self.session.config().response_key());
                }
                SessionEvent::TrialRecorded(record) => {
                    print!("  reaction: {} ms\r\n", record.reaction_ms);
                }
                SessionEvent::TrialDiscarded(id) => {
                    print!("  stimulus {id} was removed; trial discarded\r\n");
                }
                SessionEvent::SessionComplete(records) => {
                    self.finish(records)?;
                    return Ok(true);
                }
                SessionEvent::PhaseChanged(_) => {}
            }
        }
        Ok(false)
    }

    fn finish(&self, records: &[TrialRecord]) -> Result<()> {
        let summary = self.session.summary();
        print!("\r\n=== SESSION COMPLETE ===\r\n");
        print!("Stimuli tested:     {}\r\n", summary.tested_items);
        print!("Measurements:       {}\r\n", summary.total_measurements);
        print!("Mean reaction time: {} ms\r\n", summary.mean_reaction_ms);

        print!("\r\nFastest responses:\r\n");
        for (place, item) in self.session.rank(true).iter().take(5).enumerate() {
            print!(
                "  {}. {} - {} ms over {} measurements\r\n",
                place + 1,
                item.label,
                item.average_ms,
                item.measurements,
            );
        }
        print!("Slowest responses:\r\n");
        for (place, item) in self.session.rank(false).iter().take(5).enumerate() {
            print!(
                "  {}. {} - {} ms over {} measurements\r\n",
                place + 1,
                item.label,
                item.average_ms,
                item.measurements,
            );
        }

        serde_json::to_writer_pretty(File::create(LOG_PATH)?, records)?;
        log::info!("wrote {} records to {LOG_PATH}", records.len());
        print!("\r\nSession log written to {LOG_PATH}\r\n");
        Ok(())
    }
}

/// Maps a crossterm key to the engine's normalized code space.
fn key_name(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        other => format!("{other:?}"),
    }
}
