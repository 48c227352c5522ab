//! Core types for the Skillet skill-execution engine: manifests, argument
//! validation, execution records, progress events, and the storage traits
//! the engine is wired up with.

pub mod config;
pub mod error;
pub mod event;
pub mod execution;
pub mod manifest;
pub mod traits;
pub mod validate;

pub use config::ResolvedConfig;
pub use error::EngineError;
pub use event::{
    event_channel, EventSink, EventStatus, SkillEvent, SkillEventData, SkillEventKind,
    DEFAULT_EVENT_BUFFER,
};
pub use execution::{
    ExecutionContext, ExecutionMetadata, ExecutionOutcome, ExecutionStatus, SkillExecution,
};
pub use manifest::{FunctionDef, ParamDef, ParamType, RuntimeKind, SkillManifest};
pub use traits::{ConfigStore, ExecutionLogStore, PluginRecord, PluginRegistry};
pub use validate::{apply_defaults, validate_call, Violation};
