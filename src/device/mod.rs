//! Device side — configuration, the hardware contract, and the mode state
//! machine that moves a generator between manual and buffered operation.

pub mod calibration;
pub mod config;
pub mod controller;
pub mod error;
pub mod hardware;
pub mod notify;
pub mod panel;
pub mod queue;
pub mod worker;

pub use calibration::Calibration;
pub use config::{
    DeviceConfig, OutChannel, OutputDefinition, OutputShape, StandardOutput, Waveform,
    MIN_CYCLE_DURATION,
};
pub use controller::{DeviceController, Mode};
pub use error::{ConfigurationError, DeviceError, HardwareError, TransitionFailure};
pub use hardware::{GeneratorSetup, Indicator, SignalGenerator, SimulatedGenerator, TriggerSource};
pub use notify::{
    notification_channel, Notification, NotificationReceiver, NotificationSender, Outcome,
    NOTIFY_CAPACITY,
};
pub use panel::{Attribute, AttributeUpdate, FrontPanel};
pub use queue::UpdateQueue;
pub use worker::{AttributeSnapshot, BufferedProgram, GeneratorWorker, SubDevice};
