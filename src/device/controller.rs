//! Mode transition state machine.
//!
//! A [`DeviceController`] owns one primary [`GeneratorWorker`] plus any number
//! of secondary sub-devices, and moves them together between manual
//! (front-panel) control and buffered (triggered burst) playback:
//!
//! ```text
//! Manual ──transition_to_buffered──▶ Buffered
//!   ▲                                   │
//!   └──── TransitioningToManual ◀───────┘
//! ```
//!
//! A failed return to manual leaves the controller in
//! `TransitioningToManual` until the operator calls [`DeviceController::restart`].

use super::config::DeviceConfig;
use super::error::{DeviceError, TransitionFailure};
use super::hardware::SignalGenerator;
use super::notify::{Notification, NotificationSender, Outcome};
use super::panel::{AttributeUpdate, FrontPanel};
use super::queue::UpdateQueue;
use super::worker::{BufferedProgram, GeneratorWorker, SubDevice};
use crate::waveform::HardwareSteps;

/// Operating mode of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Manual,
    TransitioningToManual,
    Buffered,
}

pub struct DeviceController<G: SignalGenerator> {
    name: String,
    mode: Mode,
    worker: GeneratorWorker<G>,
    secondaries: Vec<Box<dyn SubDevice>>,
    panel: FrontPanel,
    steps: HardwareSteps,
    queue: UpdateQueue,
    notifier: NotificationSender,
    restart_required: bool,
}

impl<G: SignalGenerator> DeviceController<G> {
    /// Validate `config`, initialise the generator and start in manual mode.
    pub fn new(
        config: &DeviceConfig,
        generator: G,
        notifier: NotificationSender,
    ) -> Result<Self, DeviceError> {
        config.validate()?;
        let mut worker = GeneratorWorker::new(generator, config);
        worker.init()?;
        Ok(Self {
            name: config.name.clone(),
            mode: Mode::Manual,
            worker,
            secondaries: Vec::new(),
            panel: FrontPanel::default(),
            steps: config.steps,
            queue: UpdateQueue::new(),
            notifier,
            restart_required: false,
        })
    }

    /// Register a sub-device that must also return to manual.
    pub fn add_secondary(&mut self, device: Box<dyn SubDevice>) {
        self.secondaries.push(device);
    }

    fn check_mode(&self, operation: &'static str, expected: Mode) -> Result<(), DeviceError> {
        if self.restart_required {
            return Err(DeviceError::RestartRequired {
                device: self.name.clone(),
            });
        }
        if self.mode != expected {
            return Err(DeviceError::WrongMode {
                operation,
                mode: self.mode,
            });
        }
        Ok(())
    }

    /// Queue a front-panel change. Accepted in any mode; applied by
    /// [`service_updates`](Self::service_updates) once the device is manual.
    pub fn request_update(&mut self, update: AttributeUpdate) {
        self.queue.push(update);
    }

    /// Apply queued front-panel changes. Returns how many were sent to the
    /// generator; outside manual mode nothing is dequeued.
    pub fn service_updates(&mut self) -> Result<usize, DeviceError> {
        if self.restart_required || self.mode != Mode::Manual {
            if !self.queue.is_empty() {
                tracing::debug!(
                    device = %self.name,
                    mode = ?self.mode,
                    pending = self.queue.len(),
                    "holding attribute updates"
                );
            }
            return Ok(0);
        }
        let mut applied = 0;
        while let Some(update) = self.queue.pop() {
            let update = update.quantized(&self.steps);
            if let Err(e) = self.worker.update_attribute(update) {
                tracing::warn!(device = %self.name, error = %e, ?update, "attribute update failed");
                self.queue.requeue(update);
                return Err(e.into());
            }
            self.panel.apply(update);
            applied += 1;
        }
        Ok(applied)
    }

    /// Arm the generator with `program` and enter buffered mode.
    ///
    /// On a hardware failure the half-armed program is discarded, the
    /// generator goes back to its default manual output and the device stays
    /// in manual mode. If even that reset fails the device needs a restart.
    pub fn transition_to_buffered(&mut self, program: BufferedProgram) -> Result<(), DeviceError> {
        self.check_mode("transition_to_buffered", Mode::Manual)?;
        if let Err(e) = self.worker.transition_to_buffered(&program) {
            tracing::error!(device = %self.name, error = %e, "transition to buffered failed");
            match self.worker.abort_transition_to_buffered() {
                Ok(()) => self.panel = self.worker.snapshot().into(),
                Err(reset) => {
                    tracing::error!(device = %self.name, error = %reset, "reset after failed upload failed");
                    self.restart_required = true;
                }
            }
            return Err(e.into());
        }
        self.mode = Mode::Buffered;
        tracing::info!(device = %self.name, "entered buffered mode");
        Ok(())
    }

    /// Return every worker to manual output.
    ///
    /// All sub-devices are reset even when an earlier one fails. Any failure
    /// is fatal until [`restart`](Self::restart).
    pub fn transition_to_manual(&mut self) -> Result<(), DeviceError> {
        self.check_mode("transition_to_manual", Mode::Buffered)?;
        self.mode = Mode::TransitioningToManual;

        let mut failed = Vec::new();
        let (primary_ok, snapshot) = self.worker.transition_to_manual();
        if !primary_ok {
            failed.push(self.worker.name().to_string());
        }
        self.panel = snapshot.into();

        let mut success = primary_ok;
        for device in self.secondaries.iter_mut() {
            let ok = device.transition_to_manual();
            if !ok {
                failed.push(device.name().to_string());
            }
            success = success && ok;
        }

        if success {
            self.notify(Outcome::Success);
            self.mode = Mode::Manual;
            tracing::info!(device = %self.name, "returned to manual mode");
            return Ok(());
        }

        self.notify(Outcome::Failed);
        self.restart_required = true;
        let failure = TransitionFailure {
            device: self.name.clone(),
            failed,
        };
        tracing::error!(device = %self.name, error = %failure, "transition to manual failed");
        Err(failure.into())
    }

    /// Stop a buffered run early. Same procedure as
    /// [`transition_to_manual`](Self::transition_to_manual).
    pub fn abort_buffered(&mut self) -> Result<(), DeviceError> {
        self.transition_to_manual()
    }

    /// Operator restart after a failed transition: re-initialise the
    /// generator and start over in manual mode with an empty queue.
    pub fn restart(&mut self) -> Result<(), DeviceError> {
        self.worker.init()?;
        self.panel = FrontPanel::default();
        self.queue.clear();
        self.restart_required = false;
        self.mode = Mode::Manual;
        tracing::info!(device = %self.name, "device restarted");
        Ok(())
    }

    /// Put the generator back on its default output. The controller is
    /// unusable afterwards.
    pub fn shutdown(mut self) -> Result<G, DeviceError> {
        self.worker.shutdown()?;
        tracing::info!(device = %self.name, "device shut down");
        Ok(self.worker.into_generator())
    }

    fn notify(&mut self, outcome: Outcome) {
        self.notifier.send(Notification {
            device: self.name.clone(),
            outcome,
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn restart_required(&self) -> bool {
        self.restart_required
    }

    pub fn panel(&self) -> &FrontPanel {
        &self.panel
    }

    pub fn pending_updates(&self) -> usize {
        self.queue.len()
    }

    pub fn worker(&self) -> &GeneratorWorker<G> {
        &self.worker
    }

    pub fn worker_mut(&mut self) -> &mut GeneratorWorker<G> {
        &mut self.worker
    }
}
