/// Variable-speed virtual clock.
pub mod clock;
pub mod engine;
/// Closed-form temperature, usage and cost formulas.
pub mod formulas;
pub mod producer;
pub mod report;
pub mod types;
/// Per-window usage tracking for boolean devices.
pub mod usage;
