pub mod attributes;
pub mod charts;
pub mod config;
pub mod error;
pub mod export;
pub mod heatmap;
pub mod join;
pub mod logging;
pub mod model;
pub mod partition;
pub mod pipeline;
pub mod promising;
pub mod roles;
pub mod sqlite_source;
pub mod swarm;
pub mod synthetic;
pub mod tables;
pub mod team_performance;
