//! Open tabs and the active-tab pointer.

mod registry;

pub use registry::{TabDirective, TabRegistry, TabSnapshot};
