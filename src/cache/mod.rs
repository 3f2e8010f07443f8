//! Recipe entity cache.
//!
//! Holds fetched list pages and single recipes so views render without a network
//! call, and keeps those copies consistent with local mutations:
//!
//! | Effect          | Detail entry            | List entries                         |
//! |-----------------|-------------------------|--------------------------------------|
//! | `Created`       | untouched               | appended to every resident page      |
//! | `Updated`       | shallow-merged          | matching element replaced in place   |
//! | `PhotoReplaced` | `photo`/`updatedAt` set | matching element replaced in place   |
//! | `Deleted`       | removed                 | matching element filtered out        |
//!
//! Sizes and freshness come from the `[cache]` section of `recipeez.toml`:
//!
//! ```toml
//! [cache]
//! list_limit = 50
//! detail_limit = 200
//! stale_seconds = 300
//! ```

mod config;
mod effects;
mod keys;
mod store;

pub use config::{CacheConfig, DEFAULT_DETAIL_LIMIT, DEFAULT_LIST_LIMIT, DEFAULT_STALE_SECS};
pub use effects::{MutationEffect, PhotoPatch, RecipeFieldsPatch};
pub use keys::{ListKey, QueryKey};
pub use store::{Epoch, RecipeCache, SyncReport};
