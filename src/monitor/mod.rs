mod engine;

pub use engine::{
    render_price_update, AddOutcome, MonitorEngine, MonitorHandle, MonitorMessage, PriceUpdate,
};
