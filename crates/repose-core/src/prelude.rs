pub use crate::effects::{Dispose, effect, on_unmount};
pub use crate::error::RuntimeError;
pub use crate::runtime::{FlushStats, FrameId, Scheduler};
pub use crate::scope::{Scope, current_scope};
pub use crate::signal::{Signal, SubId, signal};
