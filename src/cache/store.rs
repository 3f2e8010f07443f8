//! Recipe cache storage.
//!
//! Two LRU maps: list pages keyed by [`ListKey`] and single recipes keyed by id.
//! Fetches write whole entries; completed mutations patch resident entries in
//! place through [`RecipeCache::apply`].

use std::hash::Hash;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;
use recipeez_api_types::{Recipe, RecipePage};
use tracing::{debug, info};

use crate::lock::{rw_read, rw_write};

use super::config::CacheConfig;
use super::effects::MutationEffect;
use super::keys::{ListKey, QueryKey};

const SOURCE: &str = "cache::store";

/// Monotonic counter bumped by every write that changes what views would show.
pub type Epoch = u64;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    stored_at: Instant,
}

impl<T> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, stale_after: Duration) -> bool {
        self.stored_at.elapsed() < stale_after
    }
}

/// Outcome of one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Cache epoch after the pass.
    pub epoch: Epoch,
    /// Number of resident list entries whose sequence changed.
    pub lists_touched: usize,
    /// Whether a resident detail entry was patched or removed.
    pub detail_touched: bool,
}

/// Process-wide recipe cache.
///
/// Any component may read. Writes come from two places only: query fetches
/// (`set_list`, `set_detail`) and mutation synchronization (`apply`).
pub struct RecipeCache {
    config: CacheConfig,
    lists: RwLock<LruCache<ListKey, Entry<RecipePage>>>,
    details: RwLock<LruCache<String, Entry<Recipe>>>,
    epoch: AtomicU64,
}

impl RecipeCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            lists: RwLock::new(LruCache::new(config.list_limit_non_zero())),
            details: RwLock::new(LruCache::new(config.detail_limit_non_zero())),
            config,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Resident list page regardless of age.
    pub fn get_list(&self, key: &ListKey) -> Option<RecipePage> {
        let mut lists = rw_write(&self.lists, SOURCE, "get_list");
        record_lookup("list", lists.get(key).map(|entry| entry.value.clone()))
    }

    /// Resident list page younger than `stale_after`.
    pub fn get_fresh_list(&self, key: &ListKey) -> Option<RecipePage> {
        let mut lists = rw_write(&self.lists, SOURCE, "get_fresh_list");
        let found = lists
            .get(key)
            .filter(|entry| entry.is_fresh(self.config.stale_after))
            .map(|entry| entry.value.clone());
        record_lookup("list", found)
    }

    /// Resident recipe regardless of age.
    pub fn get_detail(&self, id: &str) -> Option<Recipe> {
        let mut details = rw_write(&self.details, SOURCE, "get_detail");
        record_lookup("detail", details.get(id).map(|entry| entry.value.clone()))
    }

    /// Resident recipe younger than `stale_after`.
    pub fn get_fresh_detail(&self, id: &str) -> Option<Recipe> {
        let mut details = rw_write(&self.details, SOURCE, "get_fresh_detail");
        let found = details
            .get(id)
            .filter(|entry| entry.is_fresh(self.config.stale_after))
            .map(|entry| entry.value.clone());
        record_lookup("detail", found)
    }

    /// Keys currently resident, most recently used first within each shape.
    pub fn resident_keys(&self) -> Vec<QueryKey> {
        let lists = rw_read(&self.lists, SOURCE, "resident_keys.lists");
        let details = rw_read(&self.details, SOURCE, "resident_keys.details");
        lists
            .iter()
            .map(|(key, _)| QueryKey::List(key.clone()))
            .chain(details.iter().map(|(id, _)| QueryKey::Detail(id.clone())))
            .collect()
    }

    // ========================================================================
    // Fetch results
    // ========================================================================

    /// Store a freshly fetched list page, replacing whatever the key held.
    pub fn set_list(&self, key: ListKey, page: RecipePage) {
        let mut lists = rw_write(&self.lists, SOURCE, "set_list");
        store_entry(&mut lists, key, page, "list");
        self.bump_epoch();
    }

    /// Store a freshly fetched recipe under its id.
    pub fn set_detail(&self, recipe: Recipe) {
        let mut details = rw_write(&self.details, SOURCE, "set_detail");
        store_entry(&mut details, recipe.id.clone(), recipe, "detail");
        self.bump_epoch();
    }

    // ========================================================================
    // Mutation synchronization
    // ========================================================================

    /// Patch every resident entry affected by a completed mutation.
    ///
    /// Keys that are not resident are skipped. List order only changes by the
    /// append of a created recipe or the removal of a deleted one; list `meta`
    /// is never touched.
    pub fn apply(&self, effect: &MutationEffect) -> SyncReport {
        let (detail_touched, merged) = self.sync_detail(effect);
        let lists_touched = self.patch_lists(|page| sync_page(page, effect, merged.as_ref()));
        let epoch = self.bump_epoch();

        counter!("recipeez_cache_sync_total", "effect" => effect.kind()).increment(1);
        info!(
            effect = effect.kind(),
            recipe_id = effect.recipe_id(),
            lists_touched,
            detail_touched,
            epoch,
            "Cache synchronized"
        );

        SyncReport {
            epoch,
            lists_touched,
            detail_touched,
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        rw_write(&self.lists, SOURCE, "clear.lists").clear();
        rw_write(&self.details, SOURCE, "clear.details").clear();
        let epoch = self.bump_epoch();
        debug!(epoch, "Cache cleared");
    }

    /// Returns whether a detail entry was touched and, for field patches, the
    /// merged detail record that list copies must converge to.
    fn sync_detail(&self, effect: &MutationEffect) -> (bool, Option<Recipe>) {
        let mut details = rw_write(&self.details, SOURCE, "apply.detail");
        match effect {
            MutationEffect::Created(_) => (false, None),
            MutationEffect::Deleted { id } => (details.pop(id).is_some(), None),
            MutationEffect::Updated { id, .. } | MutationEffect::PhotoReplaced { id, .. } => {
                match details.peek_mut(id) {
                    Some(entry) => {
                        effect.merge_into(&mut entry.value);
                        (true, Some(entry.value.clone()))
                    }
                    None => (false, None),
                }
            }
        }
    }

    /// Update-by-predicate over all resident list pages. `patch` returns whether
    /// it changed the page; the count of changed pages is returned.
    fn patch_lists<F>(&self, mut patch: F) -> usize
    where
        F: FnMut(&mut RecipePage) -> bool,
    {
        let mut lists = rw_write(&self.lists, SOURCE, "apply.lists");
        lists
            .iter_mut()
            .map(|(_, entry)| patch(&mut entry.value))
            .filter(|changed| *changed)
            .count()
    }

    fn bump_epoch(&self) -> Epoch {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }
}

fn sync_page(page: &mut RecipePage, effect: &MutationEffect, merged: Option<&Recipe>) -> bool {
    match effect {
        MutationEffect::Created(recipe) => {
            match page.recipes.iter_mut().find(|item| item.id == recipe.id) {
                Some(existing) => existing.clone_from(recipe),
                None => page.recipes.push(recipe.clone()),
            }
            true
        }
        MutationEffect::Deleted { id } => {
            let before = page.recipes.len();
            page.recipes.retain(|item| item.id != *id);
            page.recipes.len() != before
        }
        MutationEffect::Updated { id, .. } | MutationEffect::PhotoReplaced { id, .. } => {
            let Some(slot) = page.recipes.iter_mut().find(|item| item.id == *id) else {
                return false;
            };
            match merged {
                Some(record) => slot.clone_from(record),
                None => {
                    effect.merge_into(slot);
                }
            }
            true
        }
    }
}

fn store_entry<K: Hash + Eq + Clone + std::fmt::Debug, V>(
    map: &mut LruCache<K, Entry<V>>,
    key: K,
    value: V,
    shape: &'static str,
) {
    let Some((evicted, _)) = map.push(key.clone(), Entry::new(value)) else {
        return;
    };
    if evicted != key {
        counter!("recipeez_cache_evict_total", "shape" => shape).increment(1);
        debug!(shape, evicted = ?evicted, "Evicted least recently used cache entry");
    }
}

fn record_lookup<T>(shape: &'static str, found: Option<T>) -> Option<T> {
    if found.is_some() {
        counter!("recipeez_cache_hit_total", "shape" => shape).increment(1);
    } else {
        counter!("recipeez_cache_miss_total", "shape" => shape).increment(1);
    }
    found
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use recipeez_api_types::PageMeta;
    use time::macros::datetime;

    use super::*;
    use crate::cache::effects::{PhotoPatch, RecipeFieldsPatch};

    fn sample_recipe(id: &str, title: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: title.to_string(),
            title_normalized: None,
            slug: None,
            description: format!("{title} description"),
            photo: None,
            ingredients: vec!["salt".to_string()],
            instructions: "cook".to_string(),
            user_id: "u1".to_string(),
            created_at: datetime!(2024-05-01 10:00 UTC),
            updated_at: datetime!(2024-05-01 10:00 UTC),
        }
    }

    fn page(recipes: Vec<Recipe>) -> RecipePage {
        RecipePage {
            meta: PageMeta {
                page_index: 0,
                per_page: 10,
                total_count: recipes.len() as u64,
            },
            recipes,
        }
    }

    fn ids(page: &RecipePage) -> Vec<&str> {
        page.recipes.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn created_recipe_is_appended_to_every_resident_list() {
        let cache = RecipeCache::new(CacheConfig::default());
        let first = ListKey::first_page();
        let search = ListKey::new(3, "bolo");
        cache.set_list(
            first.clone(),
            page(vec![sample_recipe("r1", "A"), sample_recipe("r2", "B")]),
        );
        cache.set_list(search.clone(), page(vec![]));

        let report = cache.apply(&MutationEffect::Created(sample_recipe("r3", "C")));

        assert_eq!(report.lists_touched, 2);
        assert!(!report.detail_touched);
        let first_page = cache.get_list(&first).expect("resident page");
        assert_eq!(ids(&first_page), vec!["r1", "r2", "r3"]);
        assert_eq!(first_page.meta.total_count, 2);
        assert_eq!(ids(&cache.get_list(&search).expect("resident page")), vec!["r3"]);
        assert!(cache.get_detail("r3").is_none());
    }

    #[test]
    fn created_recipe_already_listed_is_not_duplicated() {
        let cache = RecipeCache::new(CacheConfig::default());
        cache.set_list(ListKey::first_page(), page(vec![sample_recipe("r1", "A")]));

        cache.apply(&MutationEffect::Created(sample_recipe("r1", "A2")));

        let list = cache.get_list(&ListKey::first_page()).expect("resident page");
        assert_eq!(ids(&list), vec!["r1"]);
        assert_eq!(list.recipes[0].title, "A2");
    }

    #[test]
    fn update_merges_detail_and_replaces_list_element_in_place() {
        let cache = RecipeCache::new(CacheConfig::default());
        cache.set_detail(sample_recipe("r1", "A"));
        cache.set_list(
            ListKey::first_page(),
            page(vec![
                sample_recipe("r0", "Z"),
                sample_recipe("r1", "A"),
                sample_recipe("r2", "B"),
            ]),
        );

        let report = cache.apply(&MutationEffect::Updated {
            id: "r1".into(),
            patch: RecipeFieldsPatch {
                title: Some("B".into()),
                ..Default::default()
            },
        });

        assert!(report.detail_touched);
        assert_eq!(report.lists_touched, 1);
        let detail = cache.get_detail("r1").expect("resident detail");
        assert_eq!(detail.title, "B");
        assert_eq!(detail.description, "A description");
        let list = cache.get_list(&ListKey::first_page()).expect("resident page");
        assert_eq!(ids(&list), vec!["r0", "r1", "r2"]);
        assert_eq!(list.recipes[1], detail);
    }

    #[test]
    fn list_copy_converges_to_merged_detail() {
        let cache = RecipeCache::new(CacheConfig::default());
        let mut detail = sample_recipe("r1", "A");
        detail.instructions = "detail copy".into();
        cache.set_detail(detail);
        cache.set_list(ListKey::first_page(), page(vec![sample_recipe("r1", "A")]));

        cache.apply(&MutationEffect::PhotoReplaced {
            id: "r1".into(),
            patch: PhotoPatch {
                photo: "https://cdn/r1.png".into(),
                updated_at: Some(datetime!(2024-06-01 08:00 UTC)),
            },
        });

        let detail = cache.get_detail("r1").expect("resident detail");
        let listed = cache.get_list(&ListKey::first_page()).expect("resident page");
        assert_eq!(listed.recipes[0], detail);
        assert_eq!(detail.photo_url(), Some("https://cdn/r1.png"));
        assert_eq!(detail.updated_at, datetime!(2024-06-01 08:00 UTC));
    }

    #[test]
    fn update_without_resident_detail_patches_lists_only() {
        let cache = RecipeCache::new(CacheConfig::default());
        cache.set_list(ListKey::first_page(), page(vec![sample_recipe("r1", "A")]));
        cache.set_list(ListKey::new(1, ""), page(vec![sample_recipe("r9", "X")]));

        let report = cache.apply(&MutationEffect::Updated {
            id: "r1".into(),
            patch: RecipeFieldsPatch {
                description: Some("new".into()),
                ..Default::default()
            },
        });

        assert!(!report.detail_touched);
        assert_eq!(report.lists_touched, 1);
        assert!(cache.get_detail("r1").is_none());
        let list = cache.get_list(&ListKey::first_page()).expect("resident page");
        assert_eq!(list.recipes[0].description, "new");
        assert_eq!(list.recipes[0].title, "A");
        let other = cache.get_list(&ListKey::new(1, "")).expect("resident page");
        assert_eq!(other.recipes[0].title, "X");
    }

    #[test]
    fn delete_removes_detail_and_filters_lists() {
        let cache = RecipeCache::new(CacheConfig::default());
        cache.set_detail(sample_recipe("r1", "A"));
        cache.set_list(
            ListKey::first_page(),
            page(vec![
                sample_recipe("r1", "A"),
                sample_recipe("r2", "B"),
                sample_recipe("r3", "C"),
            ]),
        );

        let report = cache.apply(&MutationEffect::Deleted { id: "r1".into() });

        assert!(report.detail_touched);
        assert_eq!(report.lists_touched, 1);
        assert!(cache.get_detail("r1").is_none());
        let list = cache.get_list(&ListKey::first_page()).expect("resident page");
        assert_eq!(ids(&list), vec!["r2", "r3"]);
        assert_eq!(list.meta.total_count, 3);
    }

    #[test]
    fn sync_on_empty_cache_is_a_no_op() {
        let cache = RecipeCache::new(CacheConfig::default());
        let report = cache.apply(&MutationEffect::Deleted { id: "r1".into() });
        assert_eq!(report.lists_touched, 0);
        assert!(!report.detail_touched);
        assert!(cache.resident_keys().is_empty());
    }

    #[test]
    fn mixed_sequence_preserves_relative_order() {
        let cache = RecipeCache::new(CacheConfig::default());
        cache.set_list(
            ListKey::first_page(),
            page(vec![
                sample_recipe("a", "A"),
                sample_recipe("b", "B"),
                sample_recipe("c", "C"),
            ]),
        );

        cache.apply(&MutationEffect::Created(sample_recipe("d", "D")));
        cache.apply(&MutationEffect::Updated {
            id: "c".into(),
            patch: RecipeFieldsPatch {
                title: Some("C2".into()),
                ..Default::default()
            },
        });
        cache.apply(&MutationEffect::Deleted { id: "b".into() });
        cache.apply(&MutationEffect::Created(sample_recipe("e", "E")));
        cache.apply(&MutationEffect::Updated {
            id: "a".into(),
            patch: RecipeFieldsPatch {
                title: Some("A2".into()),
                ..Default::default()
            },
        });

        let list = cache.get_list(&ListKey::first_page()).expect("resident page");
        assert_eq!(ids(&list), vec!["a", "c", "d", "e"]);
        let titles: Vec<&str> = list.recipes.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A2", "C2", "D", "E"]);
    }

    #[test]
    fn epoch_advances_on_every_write() {
        let cache = RecipeCache::new(CacheConfig::default());
        let start = cache.epoch();
        cache.set_detail(sample_recipe("r1", "A"));
        let report = cache.apply(&MutationEffect::Deleted { id: "r1".into() });
        assert_eq!(report.epoch, start + 2);
        cache.clear();
        assert_eq!(cache.epoch(), start + 3);
    }

    #[test]
    fn stale_entries_are_resident_but_not_fresh() {
        let cache = RecipeCache::new(CacheConfig {
            stale_after: Duration::ZERO,
            ..Default::default()
        });
        cache.set_detail(sample_recipe("r1", "A"));
        cache.set_list(ListKey::first_page(), page(vec![]));

        assert!(cache.get_fresh_detail("r1").is_none());
        assert!(cache.get_detail("r1").is_some());
        assert!(cache.get_fresh_list(&ListKey::first_page()).is_none());
        assert!(cache.get_list(&ListKey::first_page()).is_some());
    }

    #[test]
    fn evicted_list_is_no_longer_synchronized() {
        let cache = RecipeCache::new(CacheConfig {
            list_limit: 1,
            ..Default::default()
        });
        cache.set_list(ListKey::new(0, ""), page(vec![sample_recipe("r1", "A")]));
        cache.set_list(ListKey::new(1, ""), page(vec![sample_recipe("r2", "B")]));

        assert!(cache.get_list(&ListKey::new(0, "")).is_none());
        let report = cache.apply(&MutationEffect::Created(sample_recipe("r3", "C")));
        assert_eq!(report.lists_touched, 1);
        assert_eq!(
            cache.resident_keys(),
            vec![QueryKey::List(ListKey::new(1, ""))]
        );
    }

    #[test]
    fn clear_drops_everything() {
        let cache = RecipeCache::new(CacheConfig::default());
        cache.set_detail(sample_recipe("r1", "A"));
        cache.set_list(ListKey::first_page(), page(vec![sample_recipe("r1", "A")]));
        assert_eq!(cache.resident_keys().len(), 2);

        cache.clear();
        assert!(cache.resident_keys().is_empty());
    }

    #[test]
    fn cache_recovers_from_poisoned_lock() {
        let cache = RecipeCache::new(CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache
                .details
                .write()
                .expect("details lock should be acquired");
            panic!("poison details lock");
        }));

        cache.set_detail(sample_recipe("r1", "A"));
        assert!(cache.get_detail("r1").is_some());
    }
}
