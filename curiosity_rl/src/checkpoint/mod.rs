//! Periodic model persistence.
//!
//! Files are named after the environment and the calendar day, so a run
//! overwrites its own checkpoint throughout a day and starts a new file the
//! next day.
//!
//! ```rust,ignore
//! use curiosity_rl::checkpoint::{Checkpointer, CheckpointerConfig};
//!
//! let config = CheckpointerConfig::new("./models", "SideScroller-v0").with_save_interval(100);
//! let checkpointer = Checkpointer::new(config)?;
//!
//! if checkpointer.should_save(iteration) {
//!     checkpointer.save(&model)?;
//! }
//! let model = checkpointer.load(template, &path, &device)?;
//! ```

pub mod checkpointer;

pub use checkpointer::{CheckpointError, Checkpointer, CheckpointerConfig};
