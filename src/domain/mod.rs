pub mod layout;
pub mod pins;

// Re-exports
pub use layout::PinLayout;
pub use pins::{PinError, PinRequest, PinSpec};
