pub mod cli;
pub mod config;
pub mod model;
pub mod planner;
pub mod retailer;
pub mod shopping;
pub mod storage;
