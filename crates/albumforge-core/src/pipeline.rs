//! The selection pipeline: orchestrates remote queries, the set algebra,
//! and the local post-filter into one deterministic include/exclude
//! decision per asset.
//!
//! Five sequential stages, no branching back:
//!
//! 1. cheap validation (the local-filter dependency rule),
//! 2. concurrent fetch of every remote descriptor — all must succeed or
//!    the run aborts with no partial output,
//! 3. include resolution: `Metadata ∩ Content`, then local include rules
//!    narrow the surviving records,
//! 4. exclude resolution: the union of each category's exclude
//!    contribution, local exclude rules evaluated over the include pool,
//! 5. difference and the optional size cap.
//!
//! An empty selection is a valid, silent outcome, not an error.

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::api::{ApiError, LibraryBackend};
use crate::asset::ResultSet;
use crate::combine::{exclude_contribution, include_contribution};
use crate::query::{ContentQuery, MetadataQuery};
use crate::rules::LocalFilterSet;

/// Errors from a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// Local filters can only narrow a remote result: without at least one
    /// metadata or content include query there is nothing for them to
    /// filter, and silently scanning the whole library is not an option.
    #[error("local filters require at least one metadata or content include query")]
    LocalFilterWithoutSeed,

    #[error("search for {label:?} failed: {source}")]
    Search {
        label: String,
        #[source]
        source: ApiError,
    },
}

/// The union-mode and intersection-mode descriptor lists of one category
/// and role.
#[derive(Debug, Clone)]
pub struct ModeLists<T> {
    pub union: Vec<T>,
    pub intersection: Vec<T>,
}

impl<T> Default for ModeLists<T> {
    fn default() -> Self {
        Self {
            union: Vec::new(),
            intersection: Vec::new(),
        }
    }
}

impl<T> ModeLists<T> {
    pub fn is_empty(&self) -> bool {
        self.union.is_empty() && self.intersection.is_empty()
    }
}

/// Include and exclude descriptor lists of one remote category.
#[derive(Debug, Clone)]
pub struct CategoryPlan<T> {
    pub include: ModeLists<T>,
    pub exclude: ModeLists<T>,
}

impl<T> Default for CategoryPlan<T> {
    fn default() -> Self {
        Self {
            include: ModeLists::default(),
            exclude: ModeLists::default(),
        }
    }
}

/// Local rule sets for one role. `union` rules combine under ANY, and
/// `intersection` rules under ALL; when both are supplied an include
/// record must satisfy both, while satisfying either excludes.
#[derive(Debug, Clone, Default)]
pub struct LocalSelectors {
    pub union: Option<LocalFilterSet>,
    pub intersection: Option<LocalFilterSet>,
}

impl LocalSelectors {
    pub fn is_empty(&self) -> bool {
        self.union.is_none() && self.intersection.is_none()
    }

    fn keeps(&self, record: &crate::asset::AssetRecord) -> bool {
        self.union.as_ref().map_or(true, |s| s.matches(record))
            && self
                .intersection
                .as_ref()
                .map_or(true, |s| s.matches(record))
    }

    fn excludes(&self, record: &crate::asset::AssetRecord) -> bool {
        self.union.as_ref().is_some_and(|s| s.matches(record))
            || self
                .intersection
                .as_ref()
                .is_some_and(|s| s.matches(record))
    }
}

/// Everything one selection run needs, assembled before any remote call.
#[derive(Debug, Clone, Default)]
pub struct SelectionPlan {
    pub metadata: CategoryPlan<MetadataQuery>,
    pub content: CategoryPlan<ContentQuery>,
    pub local_include: LocalSelectors,
    pub local_exclude: LocalSelectors,
    /// Cap on the final selection size. Which members survive truncation
    /// is unspecified; the selection is an unordered set.
    pub max_assets: Option<usize>,
}

impl SelectionPlan {
    /// Whether the plan contains any criterion at all.
    pub fn has_criteria(&self) -> bool {
        !self.metadata.include.is_empty()
            || !self.metadata.exclude.is_empty()
            || !self.content.include.is_empty()
            || !self.content.exclude.is_empty()
            || !self.local_include.is_empty()
            || !self.local_exclude.is_empty()
    }

    fn has_remote_include(&self) -> bool {
        !self.metadata.include.is_empty() || !self.content.include.is_empty()
    }

    fn has_local_rules(&self) -> bool {
        !self.local_include.is_empty() || !self.local_exclude.is_empty()
    }

    /// Stage-1 validation, run before any remote call.
    pub fn validate(&self) -> Result<(), SelectError> {
        if self.has_local_rules() && !self.has_remote_include() {
            return Err(SelectError::LocalFilterWithoutSeed);
        }
        Ok(())
    }
}

/// Per-stage counts for reporting and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct SelectionStats {
    /// Distinct assets fetched across all queries.
    pub known: usize,
    /// Include pool size after the remote intersection, before local rules.
    pub include_pool: usize,
    /// Include pool size after local include rules.
    pub after_local: usize,
    /// Total excluded ids (all categories).
    pub excluded: usize,
    /// Final selection size after the cap.
    pub selected: usize,
    /// Whether the size cap discarded assets.
    pub truncated: bool,
}

/// The terminal state of a run: the selected assets plus stage counts.
#[derive(Debug, Clone)]
pub struct Selection {
    pub assets: ResultSet,
    pub stats: SelectionStats,
}

/// Executes [`SelectionPlan`]s against a [`LibraryBackend`].
pub struct SelectionPipeline<'a> {
    backend: &'a dyn LibraryBackend,
    default_content_limit: usize,
}

impl<'a> SelectionPipeline<'a> {
    pub fn new(backend: &'a dyn LibraryBackend, default_content_limit: usize) -> Self {
        Self {
            backend,
            default_content_limit,
        }
    }

    /// Run the plan to completion.
    pub async fn run(&self, plan: &SelectionPlan) -> Result<Selection, SelectError> {
        plan.validate()?;

        // Stage 2: fetch every remote descriptor. The four category/role
        // fetches are independent and read-only, so they run concurrently;
        // any failure aborts the run before combination begins.
        let (meta_inc, meta_exc, content_inc, content_exc) = futures::try_join!(
            self.fetch_metadata_lists(&plan.metadata.include),
            self.fetch_metadata_lists(&plan.metadata.exclude),
            self.fetch_content_lists(&plan.content.include),
            self.fetch_content_lists(&plan.content.exclude),
        )?;

        // Every record seen during the run; this is what the universal
        // set resolves to if it must be enumerated.
        let mut known = ResultSet::new();
        for set in [&meta_inc, &meta_exc, &content_inc, &content_exc] {
            for s in set.union.iter().chain(set.intersection.iter()) {
                known.merge(s);
            }
        }
        debug!(known = known.len(), "fetched all remote results");

        // Stage 3: include resolution.
        let include = include_contribution(&meta_inc.union, &meta_inc.intersection)
            .intersect(include_contribution(
                &content_inc.union,
                &content_inc.intersection,
            ));
        let include_pool = include.resolve(&known);
        let include_pool_size = include_pool.len();

        let narrowed = if plan.local_include.is_empty() {
            include_pool
        } else {
            include_pool.retain_ids(|_, record| plan.local_include.keeps(record))
        };
        debug!(
            before = include_pool_size,
            after = narrowed.len(),
            "include pool resolved"
        );

        // Stage 4: exclude resolution. Local exclude rules only ever see
        // the records that survived the include stages.
        let mut exclude_pool = exclude_contribution(&meta_exc.union, &meta_exc.intersection);
        exclude_pool.merge(&exclude_contribution(
            &content_exc.union,
            &content_exc.intersection,
        ));
        if !plan.local_exclude.is_empty() {
            let local_excluded =
                narrowed.retain_ids(|_, record| plan.local_exclude.excludes(record));
            exclude_pool.merge(&local_excluded);
        }

        // Stage 5: difference, then the cap.
        let mut selected = narrowed.difference(&exclude_pool);
        let mut truncated = false;
        if let Some(max) = plan.max_assets {
            if selected.len() > max {
                info!(max, from = selected.len(), "capping selection");
                selected.truncate(max);
                truncated = true;
            }
        }

        let stats = SelectionStats {
            known: known.len(),
            include_pool: include_pool_size,
            after_local: narrowed.len(),
            excluded: exclude_pool.len(),
            selected: selected.len(),
            truncated,
        };
        info!(
            selected = stats.selected,
            excluded = stats.excluded,
            "selection complete"
        );

        Ok(Selection {
            assets: selected,
            stats,
        })
    }

    async fn fetch_metadata_lists(
        &self,
        lists: &ModeLists<MetadataQuery>,
    ) -> Result<ModeLists<ResultSet>, SelectError> {
        let (union, intersection) = futures::try_join!(
            try_join_all(lists.union.iter().map(|q| self.fetch_metadata(q))),
            try_join_all(lists.intersection.iter().map(|q| self.fetch_metadata(q))),
        )?;
        Ok(ModeLists {
            union,
            intersection,
        })
    }

    async fn fetch_content_lists(
        &self,
        lists: &ModeLists<ContentQuery>,
    ) -> Result<ModeLists<ResultSet>, SelectError> {
        let (union, intersection) = futures::try_join!(
            try_join_all(lists.union.iter().map(|q| self.fetch_content(q))),
            try_join_all(lists.intersection.iter().map(|q| self.fetch_content(q))),
        )?;
        Ok(ModeLists {
            union,
            intersection,
        })
    }

    async fn fetch_metadata(&self, query: &MetadataQuery) -> Result<ResultSet, SelectError> {
        let records = self
            .backend
            .search_metadata(query.payload())
            .await
            .map_err(|source| SelectError::Search {
                label: query.label().to_string(),
                source,
            })?;
        debug!(label = query.label(), count = records.len(), "metadata search done");
        Ok(ResultSet::from_records(records))
    }

    async fn fetch_content(&self, query: &ContentQuery) -> Result<ResultSet, SelectError> {
        let limit = query.limit().unwrap_or(self.default_content_limit);
        let records = self
            .backend
            .search_content(query.payload(), limit)
            .await
            .map_err(|source| SelectError::Search {
                label: query.label().to_string(),
                source,
            })?;
        debug!(label = query.label(), count = records.len(), "content search done");
        Ok(ResultSet::from_records(records))
    }
}
