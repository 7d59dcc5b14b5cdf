//! Database repositories.
//!
//! One repository per table, each constructed over a `&mut PgConnection` so
//! callers choose whether operations share a transaction.

pub mod activity_log;
pub mod content;
pub mod invitations;
pub mod organizations;
pub mod profiles;
pub mod provider_keys;
pub mod repository;
pub mod tool_settings;
pub mod wordpress;

pub use activity_log::ActivityLog;
pub use content::Contents;
pub use invitations::Invitations;
pub use organizations::Organizations;
pub use profiles::Profiles;
pub use provider_keys::ProviderKeys;
pub use repository::Repository;
pub use tool_settings::ToolSettings;
pub use wordpress::WordPressIntegrations;
