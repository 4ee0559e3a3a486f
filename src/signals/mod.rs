// =============================================================================
// Signals Module
// =============================================================================
//
// Moving-average crossover signals derived from a daily price series.

pub mod crossover;

pub use crossover::{calculate_signals, SignalFrame, SignalRow};
