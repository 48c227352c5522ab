pub mod engine;
pub mod runtimes;
pub mod settings;
pub mod stores;

pub use engine::SkillEngine;
pub use runtimes::{ApiCallRuntime, ScriptRuntime, SkillCall, SkillRuntime, WebhookRuntime};
pub use settings::{EngineSettings, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_USER_AGENT};
pub use stores::{InMemoryConfigStore, InMemoryExecutionLog, InMemoryRegistry};
