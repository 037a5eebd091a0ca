//! Host-facing contracts.
//!
//! Defines the stable interface between the platform runtime and the
//! host application: the [`App`] trait and the per-frame context it
//! receives.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
