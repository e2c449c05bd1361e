use std::sync::{Arc, Mutex};

use rand::Rng;
use tagweave::{Diagnostic, Engine};

pub fn get_engine() -> Engine {
    Engine::new()
}

/// Installs a handler collecting every diagnostic the engine reports.
pub fn capture_diagnostics(engine: &mut Engine) -> Arc<Mutex<Vec<Diagnostic>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.set_diagnostic_handler(move |diagnostic| {
        sink.lock().unwrap().push(diagnostic.clone());
    });
    seen
}

pub fn generate_random_whitespace() -> String {
    let mut rng = rand::rng();
    let length = rng.random_range(0..10);
    (0..length).map(|_| ' ').collect()
}

pub fn generate_random_whitespace_at_least_one() -> String {
    let mut rng = rand::rng();
    let length = rng.random_range(1..10);
    (0..length).map(|_| ' ').collect()
}
