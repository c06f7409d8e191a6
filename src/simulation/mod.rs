//! Simulation harness for exercising the office with generated traffic.

pub mod trading_day;
