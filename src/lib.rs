pub mod burst;
pub mod instrument;
pub mod output;
pub mod pitch;
pub mod processing;
pub mod stroke;
pub mod synth;
pub mod tablature;
pub mod temporal;
pub mod track;

// Utility modules
pub mod rational;
