// Engine library root

pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod models;
pub mod services;
pub mod signals;
