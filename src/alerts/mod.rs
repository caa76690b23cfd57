mod detector;

pub use detector::{compute_change, Alert, AlertWindow, ChangeDetector, PriceChange};
