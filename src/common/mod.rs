pub mod frame;
pub mod panic;

pub use frame::Frame;
pub use panic::panic_message;
