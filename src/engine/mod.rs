pub mod background;
pub mod classifier;
pub mod scheduler;
pub mod simulator;
