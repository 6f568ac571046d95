//! burstwave — compile output timelines into single-burst waveforms for a
//! triggered arbitrary signal generator, and manage the generator's switch
//! between manual and buffered control.

pub mod device;
pub mod sequence;
pub mod waveform;
