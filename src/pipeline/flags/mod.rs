mod flag_state;
mod latch;
mod monitor;

pub use flag_state::{FlagKind, FlagState};
pub use latch::TimedLatch;
pub use monitor::{
    flag_monitor, CompositeEvent, FlagEvent, FlagMonitor, FlagMonitorHandle, FlagMonitorTask,
};
