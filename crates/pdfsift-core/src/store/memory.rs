//! In-memory vector store with lazy HNSW acceleration

use super::{cosine_similarity, rank, IndexedSection, ScoredSection, VectorStore};
use crate::error::{Result, SiftError};
use instant_distance::{Builder, HnswMap, Search};
use std::collections::HashMap;
use std::sync::RwLock;

/// Minimum point count to justify building an ANN index.
/// Below this threshold, brute-force is fast enough.
const ANN_THRESHOLD: usize = 1000;

/// Wrapper for f32 vectors implementing instant_distance::Point
#[derive(Clone)]
struct EmbeddingPoint {
    values: Vec<f32>,
}

impl instant_distance::Point for EmbeddingPoint {
    fn distance(&self, other: &Self) -> f32 {
        // Cosine distance = 1.0 - cosine_similarity
        1.0 - cosine_similarity(&self.values, &other.values)
    }
}

#[derive(Default)]
struct Points {
    /// Insertion order
    items: Vec<IndexedSection>,
    positions: HashMap<u64, usize>,
}

/// Vector store held entirely in memory
pub struct MemoryStore {
    points: RwLock<Points>,
    /// HNSW over point positions; dropped on every upsert
    ann: RwLock<Option<HnswMap<EmbeddingPoint, usize>>>,
    ann_threshold: usize,
}

fn poisoned<E: std::fmt::Display>(e: E) -> SiftError {
    SiftError::Index(format!("Store lock poisoned: {}", e))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_ann_threshold(ANN_THRESHOLD)
    }

    /// Store that switches to HNSW search above `threshold` points
    pub fn with_ann_threshold(threshold: usize) -> Self {
        Self {
            points: RwLock::new(Points::default()),
            ann: RwLock::new(None),
            ann_threshold: threshold,
        }
    }

    /// Whether the HNSW index is currently built
    pub fn is_ann_built(&self) -> bool {
        self.ann.read().map(|g| g.is_some()).unwrap_or(false)
    }

    fn ensure_ann(&self, points: &Points) -> Result<()> {
        if points.items.len() <= self.ann_threshold || self.is_ann_built() {
            return Ok(());
        }

        let (hnsw_points, keys): (Vec<EmbeddingPoint>, Vec<usize>) = points
            .items
            .iter()
            .enumerate()
            .map(|(pos, item)| {
                (
                    EmbeddingPoint {
                        values: item.vector.clone(),
                    },
                    pos,
                )
            })
            .unzip();

        let map = Builder::default().build(hnsw_points, keys);
        *self.ann.write().map_err(poisoned)? = Some(map);

        tracing::info!("Built ANN index with {} points", points.items.len());
        Ok(())
    }

    fn search_ann(&self, points: &Points, query: &[f32], limit: usize) -> Result<Vec<ScoredSection>> {
        let guard = self.ann.read().map_err(poisoned)?;
        let Some(map) = guard.as_ref() else {
            return Ok(Vec::new());
        };

        let query_point = EmbeddingPoint {
            values: query.to_vec(),
        };
        let mut search = Search::default();

        let mut found: Vec<(usize, f32)> = map
            .search(&query_point, &mut search)
            .take(limit)
            .map(|item| (*item.value, 1.0 - item.distance))
            .collect();
        // Insertion order first so ranking breaks ties the same way as brute force
        found.sort_by_key(|(pos, _)| *pos);

        let hits = found
            .into_iter()
            .map(|(pos, score)| ScoredSection {
                section: points.items[pos].section.clone(),
                score,
            })
            .collect();
        Ok(rank(hits, limit))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorStore for MemoryStore {
    fn upsert(&self, new_points: Vec<IndexedSection>) -> Result<()> {
        let mut points = self.points.write().map_err(poisoned)?;
        for point in new_points {
            match points.positions.get(&point.id).copied() {
                Some(pos) => points.items[pos] = point,
                None => {
                    let pos = points.items.len();
                    points.positions.insert(point.id, pos);
                    points.items.push(point);
                }
            }
        }
        *self.ann.write().map_err(poisoned)? = None;
        Ok(())
    }

    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredSection>> {
        let points = self.points.read().map_err(poisoned)?;
        if limit == 0 || points.items.is_empty() {
            return Ok(Vec::new());
        }

        self.ensure_ann(&points)?;
        if self.is_ann_built() {
            return self.search_ann(&points, query, limit);
        }

        let hits = points
            .items
            .iter()
            .map(|item| ScoredSection {
                section: item.section.clone(),
                score: cosine_similarity(query, &item.vector),
            })
            .collect();
        Ok(rank(hits, limit))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.points.read().map_err(poisoned)?.items.len())
    }

    fn clear(&self) -> Result<()> {
        *self.points.write().map_err(poisoned)? = Points::default();
        *self.ann.write().map_err(poisoned)? = None;
        Ok(())
    }
}
