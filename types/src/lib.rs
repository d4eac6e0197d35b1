pub mod config;
pub mod mode;

pub use config::{AlertConfig, ColorOverride, ModeConfig, ModeTable, ScheduleConfig};
pub use mode::Mode;
