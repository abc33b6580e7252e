//! Shared types, error model, and configuration for the toolbox loader.
//!
//! This crate is the foundation depended on by all other toolbox crates.
//! It provides:
//! - [`ToolboxError`] — the unified error type
//! - Domain types ([`Manifest`], [`UnitDescriptor`], [`Unit`], [`Entry`], [`UnitStatus`])
//! - Configuration ([`AppConfig`], [`LoaderConfig`], layered config loading)
//! - [`deep_merge`] for structural merging of JSON documents

pub mod config;
pub mod error;
pub mod merge;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DisplayConfig, LoaderConfig, LoaderSection, PROJECT_CONFIG_FILE, SourceConfig,
    TransportChoice, config_dir, config_file_path, init_config, load_layered,
};
pub use error::{Result, ToolboxError};
pub use merge::deep_merge;
pub use types::{
    DEFAULT_ROOT_PATH, Document, Entry, Manifest, Unit, UnitDescriptor, UnitDocument, UnitStatus,
    unit_document_path,
};
