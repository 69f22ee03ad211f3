//! Server configuration shared with plugins through the hosting core.

mod settings;

pub use settings::Config;
