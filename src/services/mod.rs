pub mod controller;

pub use controller::{ControllerOptions, TimerController, TimerHandle};
