//! Pairwise travel-cost matrix construction.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::PlannerError;
use crate::place::{Coordinates, Place};
use crate::traits::{RoutingProvider, TravelMode};

/// Directed cost of travelling from one place to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TravelCost {
    pub distance_meters: u32,
    pub duration_seconds: u32,
}

impl TravelCost {
    pub const ZERO: TravelCost = TravelCost {
        distance_meters: 0,
        duration_seconds: 0,
    };

    /// Sentinel for a pair the routing provider could not resolve.
    pub const UNREACHABLE: TravelCost = TravelCost {
        distance_meters: u32::MAX,
        duration_seconds: u32::MAX,
    };

    pub const fn new(distance_meters: u32, duration_seconds: u32) -> Self {
        Self {
            distance_meters,
            duration_seconds,
        }
    }

    pub fn is_reachable(&self) -> bool {
        *self != Self::UNREACHABLE
    }
}

/// Square matrix of directed travel costs, indexed `[from][to]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CostMatrix {
    rows: Vec<Vec<TravelCost>>,
}

impl CostMatrix {
    /// Build from explicit rows. Rows must form a square; the diagonal is
    /// reset to zero.
    pub fn from_rows(mut rows: Vec<Vec<TravelCost>>) -> Result<Self, PlannerError> {
        let n = rows.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n) {
            return Err(PlannerError::input(format!(
                "cost matrix row {} has {} entries, expected {}",
                i,
                row.len(),
                n
            )));
        }
        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = TravelCost::ZERO;
        }
        Ok(Self { rows })
    }

    /// Build from durations alone, `None` marking an unreachable pair.
    /// Distances are left at zero.
    pub fn from_durations(durations: &[Vec<Option<u32>>]) -> Result<Self, PlannerError> {
        let rows = durations
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Some(seconds) => TravelCost::new(0, *seconds),
                        None => TravelCost::UNREACHABLE,
                    })
                    .collect()
            })
            .collect();
        Self::from_rows(rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, from: usize, to: usize) -> TravelCost {
        self.rows[from][to]
    }

    pub fn duration(&self, from: usize, to: usize) -> u32 {
        self.rows[from][to].duration_seconds
    }

    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        self.rows[from][to].is_reachable()
    }

    pub fn rows(&self) -> &[Vec<TravelCost>] {
        &self.rows
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatrixOptions {
    pub mode: TravelMode,
    /// Number of origin rows requested per provider call.
    pub max_batch_origins: usize,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            mode: TravelMode::Driving,
            max_batch_origins: 25,
        }
    }
}

/// Builds a [`CostMatrix`] for a set of located places using a
/// [`RoutingProvider`].
#[derive(Debug, Clone)]
pub struct DistanceMatrixBuilder<P> {
    provider: P,
    options: MatrixOptions,
}

impl<P> DistanceMatrixBuilder<P>
where
    P: RoutingProvider + Sync,
{
    pub fn new(provider: P, options: MatrixOptions) -> Self {
        Self { provider, options }
    }

    #[instrument(skip_all, fields(places = places.len(), mode = %self.options.mode))]
    pub fn build(&self, places: &[Place]) -> Result<CostMatrix, PlannerError> {
        if places.len() < 2 {
            return Err(PlannerError::input(format!(
                "a cost matrix needs at least 2 places, got {}",
                places.len()
            )));
        }

        let locations = places
            .iter()
            .map(|place| {
                place.coordinates.ok_or_else(|| {
                    PlannerError::input(format!("place '{}' has no coordinates", place.name))
                })
            })
            .collect::<Result<Vec<Coordinates>, _>>()?;

        let batch = self.options.max_batch_origins.max(1);
        let n = locations.len();

        let chunks: Vec<(usize, Option<Vec<Vec<Option<TravelCost>>>>)> = locations
            .par_chunks(batch)
            .enumerate()
            .map(|(chunk_idx, origins)| {
                let first_row = chunk_idx * batch;
                match self.provider.table(origins, &locations, self.options.mode) {
                    Ok(table) if is_well_formed(&table, origins.len(), n) => (first_row, Some(table)),
                    Ok(_) => {
                        warn!(first_row, "routing provider returned a misshapen table; marking rows unreachable");
                        (first_row, None)
                    }
                    Err(err) => {
                        warn!(first_row, error = %err, "routing provider call failed; marking rows unreachable");
                        (first_row, None)
                    }
                }
            })
            .collect();

        if chunks.iter().all(|(_, table)| table.is_none()) {
            return Err(PlannerError::ExternalProvider(crate::error::ProviderError::Other(
                "every routing request failed".to_string(),
            )));
        }

        let mut rows = vec![vec![TravelCost::UNREACHABLE; n]; n];
        let mut unreachable = 0usize;
        for (first_row, table) in chunks {
            let Some(table) = table else {
                continue;
            };
            for (offset, cells) in table.into_iter().enumerate() {
                for (j, cell) in cells.into_iter().enumerate() {
                    rows[first_row + offset][j] = cell.unwrap_or(TravelCost::UNREACHABLE);
                }
            }
        }
        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = TravelCost::ZERO;
            unreachable += row.iter().filter(|cost| !cost.is_reachable()).count();
        }

        debug!(unreachable, "cost matrix built");
        CostMatrix::from_rows(rows)
    }
}

fn is_well_formed(table: &[Vec<Option<TravelCost>>], rows: usize, cols: usize) -> bool {
    table.len() == rows && table.iter().all(|row| row.len() == cols)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ProviderError;

    /// One minute per degree of Manhattan distance; pairs touching `blocked`
    /// have no route.
    struct GridProvider {
        blocked: Option<Coordinates>,
        calls: AtomicUsize,
        fail_call: Option<usize>,
    }

    impl GridProvider {
        fn new() -> Self {
            Self {
                blocked: None,
                calls: AtomicUsize::new(0),
                fail_call: None,
            }
        }
    }

    impl RoutingProvider for GridProvider {
        fn table(
            &self,
            origins: &[Coordinates],
            destinations: &[Coordinates],
            _mode: TravelMode,
        ) -> Result<Vec<Vec<Option<TravelCost>>>, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_call.is_some_and(|fail| fail <= call) {
                return Err(ProviderError::Other("boom".into()));
            }
            Ok(origins
                .iter()
                .map(|from| {
                    destinations
                        .iter()
                        .map(|to| {
                            if self.blocked == Some(*to) && from != to {
                                return None;
                            }
                            let d = (from.latitude - to.latitude).abs()
                                + (from.longitude - to.longitude).abs();
                            Some(TravelCost::new((d * 1000.0) as u32, (d * 60.0) as u32))
                        })
                        .collect()
                })
                .collect())
        }
    }

    fn places(n: usize) -> Vec<Place> {
        (0..n)
            .map(|i| Place::new(format!("p{}", i)).at(i as f64, 0.0))
            .collect()
    }

    #[test]
    fn rejects_fewer_than_two_places() {
        let builder = DistanceMatrixBuilder::new(GridProvider::new(), MatrixOptions::default());
        let err = builder.build(&places(1)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
    }

    #[test]
    fn rejects_unlocated_place() {
        let builder = DistanceMatrixBuilder::new(GridProvider::new(), MatrixOptions::default());
        let mut input = places(2);
        input.push(Place::new("nowhere"));
        assert!(builder.build(&input).is_err());
    }

    #[test]
    fn diagonal_is_zero_and_cells_directed() {
        let builder = DistanceMatrixBuilder::new(GridProvider::new(), MatrixOptions::default());
        let matrix = builder.build(&places(3)).unwrap();
        assert_eq!(matrix.len(), 3);
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), TravelCost::ZERO);
        }
        assert_eq!(matrix.duration(0, 2), 120);
        assert_eq!(matrix.get(2, 0).distance_meters, 2000);
    }

    #[test]
    fn unresolved_pair_becomes_sentinel() {
        let mut provider = GridProvider::new();
        provider.blocked = Some(Coordinates::new(1.0, 0.0));
        let builder = DistanceMatrixBuilder::new(provider, MatrixOptions::default());
        let matrix = builder.build(&places(3)).unwrap();
        assert!(!matrix.is_reachable(0, 1));
        assert!(!matrix.is_reachable(2, 1));
        assert!(matrix.is_reachable(1, 0));
    }

    #[test]
    fn failed_batch_marks_only_its_rows() {
        let mut provider = GridProvider::new();
        provider.fail_call = Some(1);
        let options = MatrixOptions {
            max_batch_origins: 2,
            ..MatrixOptions::default()
        };
        let builder = DistanceMatrixBuilder::new(provider, options);
        let matrix = builder.build(&places(4)).unwrap();
        let reachable_rows = (0..4)
            .filter(|&i| (0..4).filter(|&j| j != i).all(|j| matrix.is_reachable(i, j)))
            .count();
        let dead_rows = (0..4)
            .filter(|&i| (0..4).filter(|&j| j != i).all(|j| !matrix.is_reachable(i, j)))
            .count();
        assert_eq!(reachable_rows, 2);
        assert_eq!(dead_rows, 2);
    }

    #[test]
    fn every_batch_failing_is_an_error() {
        let mut provider = GridProvider::new();
        provider.fail_call = Some(0);
        let builder = DistanceMatrixBuilder::new(provider, MatrixOptions::default());
        let err = builder.build(&places(3)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ExternalProvider);
    }

    #[test]
    fn build_is_idempotent() {
        let options = MatrixOptions {
            max_batch_origins: 3,
            ..MatrixOptions::default()
        };
        let builder = DistanceMatrixBuilder::new(GridProvider::new(), options);
        let input = places(7);
        assert_eq!(builder.build(&input).unwrap(), builder.build(&input).unwrap());
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let rows = vec![vec![TravelCost::ZERO; 2], vec![TravelCost::ZERO; 1]];
        assert!(CostMatrix::from_rows(rows).is_err());
    }
}
