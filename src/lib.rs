pub mod alerts;
pub mod api;
pub mod bot;
pub mod constants;
pub mod db;
pub mod errors;
pub mod monitor;
pub mod monitoring;
pub mod utils;
