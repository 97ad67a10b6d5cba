use log::info;

use crate::console::{OperatorConsole, PlotView};
use crate::detection;
use crate::error::{CycleError, CycleResult};
use crate::manual;
use crate::prepare;
use crate::storage::CycleStore;
use crate::table::RecordTable;
use crate::types::{DetectionParameters, LastParameters, PreparedSignal};

/// Per-record session states. Boundary data rides on the states that own it,
/// so an accepted state without a boundary set cannot be represented.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordState {
    Idle,
    Detecting,
    /// Holds the detection result, or `None` after a contained
    /// `DetectionError`; the operator must retune or cut manually.
    Reviewing(Option<Vec<usize>>),
    Retuning,
    ManualOverride,
    Accepted(Vec<usize>),
    Persisted,
}

/// How one record left the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The reprocessing gate declined; nothing was touched.
    Skipped,
    Persisted,
}

/// Drives the detect / review / retune / manual loop for one record at a
/// time and threads the last-used parameters from record to record.
pub struct SessionWorkflow<'a> {
    store: &'a CycleStore,
    console: &'a mut dyn OperatorConsole,
    parameters: DetectionParameters,
}

impl<'a> SessionWorkflow<'a> {
    pub fn new(
        store: &'a CycleStore,
        console: &'a mut dyn OperatorConsole,
        parameters: DetectionParameters,
    ) -> Self {
        Self { store, console, parameters }
    }

    /// Parameters that will seed the next record.
    pub fn parameters(&self) -> &DetectionParameters {
        &self.parameters
    }

    /// Carry one record through the whole state machine, gate included.
    pub fn process_record(
        &mut self,
        record_name: &str,
        table: &RecordTable,
        position_col: &str,
        fs: f64,
    ) -> CycleResult<RecordOutcome> {
        if self.store.has_been_processed(record_name) {
            self.console
                .warn(&format!("Record '{record_name}' has already been processed."));
            if !self.console.confirm("Do you want to reprocess it?", false) {
                info!("skipping already-processed record '{record_name}'");
                return Ok(RecordOutcome::Skipped);
            }
        }

        self.console.info(&format!("Processing record: {record_name}"));
        let signal = prepare::prepare(table, position_col, fs)?;
        self.resolve(record_name, &signal, fs)
    }

    /// The state machine proper, from `Idle` to `Persisted`, on an already
    /// prepared signal.
    pub fn resolve(
        &mut self,
        record_name: &str,
        signal: &PreparedSignal,
        fs: f64,
    ) -> CycleResult<RecordOutcome> {
        let mut state = RecordState::Idle;
        loop {
            state = match state {
                RecordState::Idle => RecordState::Detecting,
                RecordState::Detecting => self.run_detection(signal, fs)?,
                RecordState::Reviewing(result) => self.review(result),
                RecordState::Retuning => self.retune(),
                RecordState::ManualOverride => RecordState::Accepted(manual::manual_cut(
                    &signal.position,
                    &signal.velocity,
                    fs,
                    self.console,
                )),
                RecordState::Accepted(boundaries) => {
                    self.persist(record_name, &boundaries)?;
                    RecordState::Persisted
                }
                RecordState::Persisted => return Ok(RecordOutcome::Persisted),
            };
        }
    }

    /// Detecting → Reviewing. A `DetectionError` stays inside the loop: it is
    /// reported and the operator gets another pass at the parameters.
    fn run_detection(&mut self, signal: &PreparedSignal, fs: f64) -> CycleResult<RecordState> {
        match detection::detect(signal, &self.parameters, fs) {
            Ok(boundaries) => {
                self.console
                    .info(&format!("Detected {} cycles.", boundaries.len() - 1));
                self.console.visualize(&PlotView {
                    position: &signal.position,
                    velocity: &signal.velocity,
                    boundaries: &boundaries,
                    threshold: self.parameters.threshold,
                    signal: self.parameters.signal,
                    manual_cuts: None,
                });
                Ok(RecordState::Reviewing(Some(boundaries)))
            }
            Err(CycleError::Detection) => {
                self.console
                    .error(&format!("Detection Error: {}", CycleError::Detection));
                Ok(RecordState::Reviewing(None))
            }
            Err(other) => Err(other),
        }
    }

    /// Reviewing → Accepted | Retuning. With no result to accept the only way
    /// forward is retuning (or manual cutting from there).
    fn review(&mut self, result: Option<Vec<usize>>) -> RecordState {
        match result {
            Some(boundaries) => {
                if self.console.confirm("Are the detection results acceptable?", true) {
                    RecordState::Accepted(boundaries)
                } else {
                    RecordState::Retuning
                }
            }
            None => RecordState::Retuning,
        }
    }

    /// Retuning → Detecting | ManualOverride. Every prompt defaults to the
    /// current value, so hitting enter changes nothing.
    fn retune(&mut self) -> RecordState {
        self.parameters.threshold = self
            .console
            .prompt_f64("Enter new threshold value", self.parameters.threshold);
        self.parameters.distance = self
            .console
            .prompt_f64("Enter new peak distance (in seconds)", self.parameters.distance);
        self.parameters.pattern = self.console.prompt_pattern(self.parameters.pattern);

        if self.console.confirm("Do you want to perform manual cutting?", false) {
            RecordState::ManualOverride
        } else {
            RecordState::Detecting
        }
    }

    /// Accepted → Persisted: artifact, provenance row, and the seed for the
    /// next record, written in that order.
    fn persist(&mut self, record_name: &str, boundaries: &[usize]) -> CycleResult<()> {
        let path = self
            .store
            .save_cycle_data(record_name, &self.parameters, boundaries)?;
        self.store.log_processed_record(record_name, &self.parameters)?;
        self.store
            .save_last_parameters(&LastParameters::from(&self.parameters))?;
        self.console
            .info(&format!("Saved cycle data to {}", path.display()));
        Ok(())
    }
}
