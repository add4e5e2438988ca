//! Application state: screens, the playing screen and the round session

pub mod screen;
pub mod session;
pub mod state;

pub use screen::{AppCoordinator, MenuOption, Screen};
pub use state::{App, Tone};
