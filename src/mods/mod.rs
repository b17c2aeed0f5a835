//! Mod discovery, reconciliation and symlink lifecycle.

mod error;
mod inspector;
mod metadata;
mod model;
mod operator;
mod privilege;
mod registry;
mod resolver;
mod scanner;
mod service;

pub use error::{ModError, ModResult, privilege_hint};
pub use inspector::LinkInspector;
pub use metadata::{DESCRIPTOR_FILE, ModInfo, load_mod_info, parse_content_xml};
pub use model::{
    Classification, EntryKind, InstalledLink, LinkState, ModEntry, ModStatus, Outcome,
    PrivilegeState, Roots, ScannedEntry,
};
pub use operator::LinkOperator;
pub use privilege::probe_privilege;
pub use registry::{CaseSensitivity, compute_statuses};
pub use resolver::{PathResolver, validate_name};
pub use scanner::DirectoryScanner;
pub use service::ModService;
