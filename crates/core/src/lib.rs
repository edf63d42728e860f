pub mod chat;
pub mod config;
pub mod outcome;

pub use chat::{ChatTurn, Role};
pub use config::Config;
pub use outcome::Outcome;
