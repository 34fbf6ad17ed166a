//! Fair duty rota: weekly shift allocation, standby rotation,
//! fairness simulation and weight tuning over a SQLite store.

pub mod allocator;
pub mod availability;
pub mod calendar;
pub mod config;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod metric;
pub mod model;
pub mod plan;
pub mod ports;
pub mod queue;
pub mod rng;
pub mod scoring;
pub mod simulation;
pub mod standby;
pub mod stats;
pub mod store;
pub mod suggestion;
pub mod tuner;
pub mod types;
