mod health;

pub use health::{router, serve};
