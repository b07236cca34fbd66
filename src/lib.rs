pub mod backend;
pub mod click_history;
pub mod config;
pub mod features;
pub mod orchestrator;
pub mod scorer;
pub mod signals;
pub mod widget;

pub use backend::{FraudBackend, HttpBackend};
pub use config::Config;
pub use widget::AdWidget;
