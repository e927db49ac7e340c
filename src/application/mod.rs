// Application layer - Simulation components and the context that drives them
pub mod alert_log;
pub mod clock;
pub mod detector;
pub mod history_buffer;
pub mod object_detector;
pub mod sampler;
pub mod simulation;
pub mod vehicle_control;
