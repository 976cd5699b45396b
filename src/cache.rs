//! Typed views over the two blobs the broker owns in the key/value store.
//!
//! Both caches share the same recovery policy: a missing, unreadable, or unparseable blob reads
//! as empty state instead of failing the caller, so corrupt cache contents heal on the next
//! write.

pub mod skip_token;
pub mod token;

pub use skip_token::*;
pub use token::*;

/// Key holding the JSON-serialized [`CachedToken`](crate::auth::CachedToken).
///
/// One key per process: the cache is scoped to the single configured OAuth client.
pub const TOKEN_DATA_KEY: &str = "token_data";
/// Key holding the JSON-serialized [`SkipTokenMap`].
pub const SKIP_TOKEN_KEY: &str = "skip_token";
