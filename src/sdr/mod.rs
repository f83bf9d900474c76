pub mod dsp;
pub mod file;
pub mod sim;
pub mod yunsdr;
