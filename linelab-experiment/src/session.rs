use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::practice::build_practice_set;
use chrono::Utc;
use linelab_core::{
    Judgment, Series, SeriesRecords, SessionPhase, StimulusKind, Trial, TrialRecord,
};
use linelab_timing::{Clock, ExposureTimer};
use rand::Rng;
use tracing::{debug, info};

/// Walks a participant through calibration, practice, timed stimulus
/// exposure, response collection, and series transitions.
///
/// All mutation happens on the caller's event thread. The only timer is the
/// per-trial exposure deadline, polled through [`Session::tick`]; exactly
/// one trial set (practice or the series proper) is active at a time, and
/// records accumulate only against that set until the series finalizes.
pub struct Session<C: Clock, R: Rng> {
    pub clock: C,
    pub rng: R,
    pub config: SessionConfig,
    phase: SessionPhase,
    series: Vec<Series>,
    series_index: usize,
    trial_index: usize,
    practice: Option<Vec<Trial>>,
    records: Vec<TrialRecord>,
    finished: Vec<SeriesRecords>,
    exposure: ExposureTimer,
    stimuli_visible: bool,
    trial_started_ms: u64,
}

impl<C: Clock, R: Rng> Session<C, R> {
    pub fn new(config: SessionConfig, clock: C, rng: R) -> Self {
        Self {
            clock,
            rng,
            config,
            phase: SessionPhase::Setup,
            series: Vec::new(),
            series_index: 0,
            trial_index: 0,
            practice: None,
            records: Vec::new(),
            finished: Vec::new(),
            exposure: ExposureTimer::new(),
            stimuli_visible: false,
            trial_started_ms: 0,
        }
    }

    /// Replaces the playable series set. Series without trials are dropped
    /// here: an empty series can never become the active set.
    pub fn load_series(&mut self, series: Vec<Series>) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Setup | SessionPhase::Calibration => {
                self.series = series
                    .into_iter()
                    .filter(|s| {
                        if s.is_empty() {
                            info!(series = %s.name, "series has no trials, excluded");
                        }
                        !s.is_empty()
                    })
                    .collect();
                Ok(())
            }
            phase => Err(SessionError::WrongPhase(phase)),
        }
    }

    pub fn start_calibration(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Setup {
            return Err(SessionError::WrongPhase(self.phase));
        }
        self.phase = SessionPhase::Calibration;
        Ok(())
    }

    pub fn finish_calibration(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Calibration {
            return Err(SessionError::WrongPhase(self.phase));
        }
        self.phase = SessionPhase::Setup;
        Ok(())
    }

    /// Starts the first series. Requires at least one playable series; an
    /// unready session stays in its current phase.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Setup | SessionPhase::Calibration => {}
            phase => return Err(SessionError::WrongPhase(phase)),
        }
        if self.series.is_empty() {
            return Err(SessionError::NotReady);
        }
        self.series_index = 0;
        self.enter_series();
        Ok(())
    }

    fn enter_series(&mut self) {
        let series = &self.series[self.series_index];
        self.practice = if self.config.practice_for(self.series_index) {
            let set = build_practice_set(
                &series.trials,
                self.config.practice_per_category,
                &mut self.rng,
            );
            info!(series = %series.name, trials = set.len(), "entering practice block");
            // A degenerate draw (per_category 0) falls through to the
            // series proper rather than activating an empty set.
            (!set.is_empty()).then_some(set)
        } else {
            None
        };

        self.phase = SessionPhase::Running;
        self.records.clear();
        self.start_trial(0);
    }

    fn start_trial(&mut self, index: usize) {
        self.trial_index = index;
        self.stimuli_visible = true;
        let now = self.clock.now_ms();
        self.trial_started_ms = now;
        self.exposure.arm(now, self.config.exposure_ms);
        debug!(trial = index + 1, "trial started");
    }

    /// Polls the exposure deadline. Stimuli hide once the configured
    /// duration elapses; responses stay accepted while hidden.
    pub fn tick(&mut self) {
        if self.phase == SessionPhase::Running
            && self.stimuli_visible
            && self.exposure.is_expired(self.clock.now_ms())
        {
            self.stimuli_visible = false;
            debug!(trial = self.trial_index + 1, "exposure elapsed, stimuli hidden");
        }
    }

    /// Records a same/different judgment for the current trial and
    /// advances. With no active trial the session is left untouched.
    pub fn respond(&mut self, response: Judgment) -> Result<SessionPhase, SessionError> {
        if self.phase != SessionPhase::Running {
            return Err(SessionError::NoActiveTrial);
        }
        let now = self.clock.now_ms();
        let trial = self.active_trials()[self.trial_index];

        self.records.push(TrialRecord {
            trial_index: self.trial_index + 1,
            first: trial.first,
            second: trial.second,
            response,
            response_time_ms: now.saturating_sub(self.trial_started_ms),
            timestamp: Utc::now(),
        });

        self.exposure.cancel();
        if self.trial_index + 1 < self.active_trials().len() {
            let next = self.trial_index + 1;
            self.start_trial(next);
        } else if self.practice.is_some() {
            self.stimuli_visible = false;
            self.phase = SessionPhase::PracticeComplete;
        } else {
            self.stimuli_visible = false;
            self.finalize_series();
        }
        Ok(self.phase)
    }

    fn finalize_series(&mut self) {
        let series = &self.series[self.series_index];
        self.finished.push(SeriesRecords {
            name: series.name.clone(),
            kind: series.kind,
            records: std::mem::take(&mut self.records),
        });
        info!(series = %series.name, "series finished");

        self.phase = if self.series_index + 1 < self.series.len() {
            SessionPhase::SeriesComplete
        } else {
            SessionPhase::Complete
        };
    }

    /// Leaves the practice block and starts the series proper. Practice
    /// records are discarded; they never reach the per-series map.
    pub fn continue_to_main(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::PracticeComplete {
            return Err(SessionError::WrongPhase(self.phase));
        }
        self.practice = None;
        self.phase = SessionPhase::Running;
        self.records.clear();
        self.start_trial(0);
        Ok(())
    }

    /// Moves on from the transition screen into the next series.
    pub fn advance_series(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::SeriesComplete {
            return Err(SessionError::WrongPhase(self.phase));
        }
        self.series_index += 1;
        self.enter_series();
        Ok(())
    }

    /// Discards every record and finished series and returns to setup.
    /// Loaded series data is kept.
    pub fn restart(&mut self) {
        self.phase = SessionPhase::Setup;
        self.series_index = 0;
        self.trial_index = 0;
        self.practice = None;
        self.records.clear();
        self.finished.clear();
        self.exposure.cancel();
        self.stimuli_visible = false;
        info!("session restarted");
    }

    fn active_trials(&self) -> &[Trial] {
        debug_assert_eq!(self.phase, SessionPhase::Running);
        match &self.practice {
            Some(set) => set,
            None => &self.series[self.series_index].trials,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_practice(&self) -> bool {
        self.practice.is_some()
    }

    pub fn stimuli_visible(&self) -> bool {
        self.stimuli_visible
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn current_series(&self) -> Option<&Series> {
        self.series.get(self.series_index)
    }

    pub fn next_series(&self) -> Option<&Series> {
        self.series.get(self.series_index + 1)
    }

    pub fn current_trial(&self) -> Option<&Trial> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        self.active_trials().get(self.trial_index)
    }

    pub fn current_kind(&self) -> Option<StimulusKind> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        self.current_series().map(|s| s.kind)
    }

    /// 1-based position within the active set, with the set's length.
    pub fn progress(&self) -> Option<(usize, usize)> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        Some((self.trial_index + 1, self.active_trials().len()))
    }

    /// Records of the run in progress (practice or current series).
    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    /// Finalized per-series records, in completion order.
    pub fn finished_series(&self) -> &[SeriesRecords] {
        &self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linelab_core::LineStimulus;
    use linelab_timing::ManualClock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn series(name: &str, same: usize, different: usize) -> Series {
        let mut trials = Vec::new();
        for i in 0..same {
            let len = 1.0 + i as f64;
            trials.push(Trial::new(
                LineStimulus::plain(len),
                LineStimulus::plain(len),
            ));
        }
        for i in 0..different {
            let len = 1.0 + i as f64;
            trials.push(Trial::new(
                LineStimulus::plain(len),
                LineStimulus::plain(len + 0.5),
            ));
        }
        Series::new(name, StimulusKind::Tilt, trials)
    }

    fn session(config: SessionConfig) -> Session<ManualClock, StdRng> {
        Session::new(config, ManualClock::new(), StdRng::seed_from_u64(11))
    }

    fn respond_through(session: &mut Session<ManualClock, StdRng>, n: usize) -> SessionPhase {
        let mut phase = session.phase();
        for _ in 0..n {
            phase = session.respond(Judgment::Same).unwrap();
        }
        phase
    }

    #[test]
    fn begin_without_series_is_rejected() {
        let mut s = session(SessionConfig::default());
        assert_eq!(s.begin(), Err(SessionError::NotReady));
        assert_eq!(s.phase(), SessionPhase::Setup);
    }

    #[test]
    fn empty_series_are_excluded_at_load() {
        let mut s = session(SessionConfig::single_series(false));
        s.load_series(vec![Series::new("empty", StimulusKind::Tilt, Vec::new())])
            .unwrap();
        assert_eq!(s.series_count(), 0);
        assert_eq!(s.begin(), Err(SessionError::NotReady));
    }

    #[test]
    fn respond_with_no_active_trial_is_a_rejected_noop() {
        let mut s = session(SessionConfig::default());
        assert_eq!(
            s.respond(Judgment::Same),
            Err(SessionError::NoActiveTrial)
        );
        assert_eq!(s.phase(), SessionPhase::Setup);
        assert!(s.records().is_empty());
    }

    #[test]
    fn practice_block_runs_before_the_first_series() {
        let mut s = session(SessionConfig::default());
        s.load_series(vec![series("Series-1a", 3, 3), series("Series-1b", 3, 3)])
            .unwrap();
        s.begin().unwrap();

        assert_eq!(s.phase(), SessionPhase::Running);
        assert!(s.is_practice());
        assert_eq!(s.progress(), Some((1, 4)));

        let phase = respond_through(&mut s, 4);
        assert_eq!(phase, SessionPhase::PracticeComplete);
        assert_eq!(s.records().len(), 4);
        // Practice never finalizes into the per-series map.
        assert!(s.finished_series().is_empty());

        s.continue_to_main().unwrap();
        assert!(!s.is_practice());
        assert_eq!(s.progress(), Some((1, 6)));
        assert!(s.records().is_empty());
    }

    #[test]
    fn non_final_series_ends_in_series_complete() {
        let mut s = session(SessionConfig::single_series(false));
        s.load_series(vec![series("a", 2, 2), series("b", 2, 2)])
            .unwrap();
        s.begin().unwrap();

        let phase = respond_through(&mut s, 4);
        assert_eq!(phase, SessionPhase::SeriesComplete);
        assert_eq!(s.finished_series().len(), 1);
        assert_eq!(s.finished_series()[0].name, "a");
        assert_eq!(s.finished_series()[0].records.len(), 4);
    }

    #[test]
    fn final_series_ends_in_complete() {
        let mut s = session(SessionConfig::single_series(false));
        s.load_series(vec![series("a", 2, 2), series("b", 2, 2)])
            .unwrap();
        s.begin().unwrap();

        respond_through(&mut s, 4);
        s.advance_series().unwrap();
        let phase = respond_through(&mut s, 4);

        assert_eq!(phase, SessionPhase::Complete);
        assert_eq!(s.finished_series().len(), 2);
        assert_eq!(s.finished_series()[1].name, "b");
    }

    #[test]
    fn practice_reruns_for_later_series_when_configured() {
        let mut s = session(SessionConfig::default()); // practice before 0 and 2
        s.load_series(vec![
            series("Series-1a", 3, 3),
            series("Series-1b", 3, 3),
            series("Series-2a", 3, 3),
        ])
        .unwrap();
        s.begin().unwrap();

        respond_through(&mut s, 4); // practice for series 0
        s.continue_to_main().unwrap();
        respond_through(&mut s, 6); // series 0
        s.advance_series().unwrap();
        assert!(!s.is_practice()); // series 1 has no practice
        respond_through(&mut s, 6);
        s.advance_series().unwrap();
        assert!(s.is_practice()); // series 2 opens with a fresh draw
        assert_eq!(s.progress(), Some((1, 4)));
    }

    #[test]
    fn trial_index_never_exceeds_the_active_set() {
        let mut s = session(SessionConfig::single_series(false));
        s.load_series(vec![series("a", 3, 3)]).unwrap();
        s.begin().unwrap();

        for _ in 0..5 {
            let (pos, len) = s.progress().unwrap();
            assert!(pos <= len);
            s.respond(Judgment::Different).unwrap();
        }
        let (pos, len) = s.progress().unwrap();
        assert_eq!((pos, len), (6, 6));
    }

    #[test]
    fn stimuli_hide_after_the_exposure_duration_and_not_before() {
        let mut s = session(SessionConfig::single_series(false));
        s.load_series(vec![series("a", 1, 1)]).unwrap();
        s.begin().unwrap();
        assert!(s.stimuli_visible());

        s.clock.advance(2_999);
        s.tick();
        assert!(s.stimuli_visible());

        s.clock.advance(1);
        s.tick();
        assert!(!s.stimuli_visible());
    }

    #[test]
    fn response_after_hiding_measures_from_trial_start() {
        let mut s = session(SessionConfig::single_series(false));
        s.load_series(vec![series("a", 1, 1)]).unwrap();
        s.begin().unwrap();

        s.clock.advance(4_500);
        s.tick();
        assert!(!s.stimuli_visible());

        s.respond(Judgment::Same).unwrap();
        assert_eq!(s.records()[0].response_time_ms, 4_500);
        // Next trial starts fresh: visible, timer re-armed.
        assert!(s.stimuli_visible());
        s.tick();
        assert!(s.stimuli_visible(), "stale deadline hid the new trial");
    }

    #[test]
    fn quick_responses_do_not_leak_a_stale_hide() {
        let mut s = session(SessionConfig::single_series(false));
        s.load_series(vec![series("a", 2, 2)]).unwrap();
        s.begin().unwrap();

        // Respond quickly, then let more than the old deadline pass.
        s.clock.advance(100);
        s.respond(Judgment::Same).unwrap();
        s.clock.advance(2_950); // old trial's deadline (3_000) has passed
        s.tick();
        assert!(s.stimuli_visible());
        s.clock.advance(100); // new trial's own deadline arrives
        s.tick();
        assert!(!s.stimuli_visible());
    }

    #[test]
    fn restart_clears_records_and_completion_state() {
        let mut s = session(SessionConfig::single_series(false));
        s.load_series(vec![series("a", 1, 1), series("b", 1, 1)])
            .unwrap();
        s.begin().unwrap();
        respond_through(&mut s, 2);
        assert_eq!(s.finished_series().len(), 1);

        s.restart();
        assert_eq!(s.phase(), SessionPhase::Setup);
        assert!(s.records().is_empty());
        assert!(s.finished_series().is_empty());

        // Loaded series survive a restart; the run can begin again.
        s.begin().unwrap();
        assert_eq!(s.progress(), Some((1, 2)));
    }

    #[test]
    fn calibration_is_an_optional_detour() {
        let mut s = session(SessionConfig::single_series(false));
        s.load_series(vec![series("a", 1, 1)]).unwrap();

        s.start_calibration().unwrap();
        assert_eq!(s.phase(), SessionPhase::Calibration);
        // Beginning straight from calibration is allowed.
        s.begin().unwrap();
        assert_eq!(s.phase(), SessionPhase::Running);
    }
}
