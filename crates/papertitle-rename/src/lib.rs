pub mod batch;
pub mod naming;
pub mod sanitize;

pub use batch::{
    BatchRenamer, DEFAULT_SKIP_PATTERNS, RenameError, RenameEvent, RenameOptions, RunContext,
};
pub use naming::{NameRegistry, build_filename, default_filename, resolve_collision};
pub use sanitize::{FALLBACK_LABEL, sanitize_title};
