// Domain layer - Core models shared by the simulation and its consumers
pub mod alert;
pub mod command;
pub mod dashboard;
pub mod detection;
pub mod history;
pub mod vehicle;
