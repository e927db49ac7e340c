// Application state for HTTP handlers
use std::sync::Arc;

use crate::application::simulation::SimulationContext;

#[derive(Clone)]
pub struct AppState {
    pub simulation: Arc<SimulationContext>,
}
