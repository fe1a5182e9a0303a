pub mod parser;
pub mod waveform;
