//! Application-level configuration.
//!
//! - [`BrokerParams`] - floor, worker pool size, throttle retention, default options

pub mod broker_params;

pub use broker_params::BrokerParams;
