//! Route solver: shortest Hamiltonian path over a [`CostMatrix`] with a fixed
//! start and an optional fixed end.
//!
//! Small instances are solved exactly with a Held-Karp dynamic program. Larger
//! ones start from a greedy cheapest-arc path and are improved by guided local
//! search (2-opt and or-opt moves over penalty-augmented costs) until either
//! the time budget or the iteration cap runs out. A guided result that still
//! uses an unreachable arc is re-solved exactly when the instance is small
//! enough.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::PlannerError;
use crate::matrix::CostMatrix;

/// Search cost of an unreachable arc. Any path avoiding such arcs must stay
/// cheaper, and a full path of them must not overflow `i64`.
const UNREACHABLE_PENALTY: i64 = 1 << 40;

/// Held-Karp memory grows as `2^n * n`; never go exact beyond this.
const MAX_EXACT_PLACES: usize = 16;

/// Longest chain moved by a single or-opt move.
const OR_OPT_MAX_SEGMENT: usize = 3;

/// Non-improving iterations tolerated on an infeasible path before
/// perturbing it.
const STALL_LIMIT: usize = 25;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Wall-clock budget for the improvement phase.
    pub time_limit_ms: u64,
    /// Maximum guided-local-search iterations once a feasible path is
    /// known. Keeps results reproducible when the budget is not the binding
    /// limit.
    pub max_iterations: usize,
    /// Instances with at most this many places are solved exactly.
    pub exact_threshold: usize,
    /// Scales the guided-local-search penalty weight.
    pub penalty_factor: f64,
    /// Seed for the perturbation applied when the search is stuck on an
    /// infeasible path.
    pub seed: u64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit_ms: 5_000,
            max_iterations: 1_000,
            exact_threshold: 12,
            penalty_factor: 0.3,
            seed: 0x5eed,
        }
    }
}

impl SolveOptions {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

/// An ordered visit over every place in the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub order: Vec<usize>,
    pub total_cost_seconds: u64,
    pub total_distance_meters: u64,
    /// Set when the route closes back at its start. `order` lists the start
    /// only once.
    pub returns_to_start: bool,
    /// Duration of the leg from the last place back to the start; zero for
    /// open paths. It is included in `total_cost_seconds`, so the sum over
    /// consecutive pairs of `order` is `total_cost_seconds - closing_leg_seconds`.
    pub closing_leg_seconds: u64,
}

impl Route {
    /// Duration over consecutive pairs of `order`, without the closing leg.
    pub fn path_cost_seconds(&self) -> u64 {
        self.total_cost_seconds - self.closing_leg_seconds
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Solved(Route),
    /// No full-coverage path over reachable arcs was found.
    NoRoute,
}

impl RouteOutcome {
    pub fn route(&self) -> Option<&Route> {
        match self {
            RouteOutcome::Solved(route) => Some(route),
            RouteOutcome::NoRoute => None,
        }
    }

    pub fn into_route(self) -> Option<Route> {
        match self {
            RouteOutcome::Solved(route) => Some(route),
            RouteOutcome::NoRoute => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, RouteOutcome::Solved(_))
    }

    /// For callers with no fallback order: `NoRoute` becomes
    /// [`PlannerError::InfeasibleRoute`].
    pub fn into_result(self, places: usize) -> Result<Route, PlannerError> {
        match self {
            RouteOutcome::Solved(route) => Ok(route),
            RouteOutcome::NoRoute => Err(PlannerError::InfeasibleRoute { places }),
        }
    }
}

/// Solve the fixed-endpoint path problem over `matrix`.
///
/// * `end == None`: open path, the solver picks the last place.
/// * `end == Some(e)` with `e != start`: the path must finish at `e`.
/// * `end == Some(start)`: closed tour returning to `start`.
///
/// Duration is the minimised quantity; distance is only accumulated.
#[instrument(skip(matrix, options), fields(places = matrix.len()))]
pub fn solve_route(
    matrix: &CostMatrix,
    start: usize,
    end: Option<usize>,
    options: &SolveOptions,
) -> Result<RouteOutcome, PlannerError> {
    let started = Instant::now();
    let n = matrix.len();
    if n == 0 {
        return Err(PlannerError::input("cannot route over an empty matrix"));
    }
    if start >= n {
        return Err(PlannerError::input(format!(
            "start index {} out of range for {} places",
            start, n
        )));
    }
    let path_end = match end {
        Some(e) if e >= n => {
            return Err(PlannerError::input(format!(
                "end index {} out of range for {} places",
                e, n
            )));
        }
        Some(e) if e == start => PathEnd::ReturnToStart,
        Some(e) => PathEnd::Fixed(e),
        None => PathEnd::Free,
    };

    if n == 1 {
        return Ok(RouteOutcome::Solved(Route {
            order: vec![start],
            total_cost_seconds: 0,
            total_distance_meters: 0,
            returns_to_start: false,
            closing_leg_seconds: 0,
        }));
    }

    let problem = Problem {
        matrix,
        start,
        end: path_end,
    };

    if problem.obviously_infeasible() {
        warn!("a place cannot be entered or left over reachable arcs");
        return Ok(RouteOutcome::NoRoute);
    }

    let seq = if n <= options.exact_threshold.min(MAX_EXACT_PLACES) {
        match problem.solve_exact() {
            Some(seq) => seq,
            None => {
                warn!("exhaustive search found no full-coverage path");
                return Ok(RouteOutcome::NoRoute);
            }
        }
    } else {
        let deadline = started + options.time_limit();
        let seq = problem.solve_guided(options, deadline);
        if problem.is_feasible(&seq) || n > MAX_EXACT_PLACES {
            seq
        } else {
            debug!("guided search ended on an unreachable arc; solving exactly");
            match problem.solve_exact() {
                Some(seq) => seq,
                None => {
                    warn!("exhaustive search found no full-coverage path");
                    return Ok(RouteOutcome::NoRoute);
                }
            }
        }
    };

    let outcome = problem.finish(seq);
    match &outcome {
        RouteOutcome::Solved(route) => info!(
            cost_seconds = route.total_cost_seconds,
            distance_meters = route.total_distance_meters,
            "route solved"
        ),
        RouteOutcome::NoRoute => warn!("best path found still uses an unreachable arc"),
    }
    Ok(outcome)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathEnd {
    Free,
    Fixed(usize),
    ReturnToStart,
}

struct Problem<'a> {
    matrix: &'a CostMatrix,
    start: usize,
    end: PathEnd,
}

impl Problem<'_> {
    fn n(&self) -> usize {
        self.matrix.len()
    }

    fn arc(&self, from: usize, to: usize) -> i64 {
        if self.matrix.is_reachable(from, to) {
            i64::from(self.matrix.duration(from, to))
        } else {
            UNREACHABLE_PENALTY
        }
    }

    /// Whether `from -> to` may appear in a valid path.
    fn usable(&self, from: usize, to: usize) -> bool {
        if from == to || !self.matrix.is_reachable(from, to) {
            return false;
        }
        match self.end {
            PathEnd::Free => to != self.start,
            PathEnd::Fixed(e) => to != self.start && from != e,
            PathEnd::ReturnToStart => true,
        }
    }

    fn is_feasible(&self, seq: &[usize]) -> bool {
        seq.windows(2).all(|w| self.matrix.is_reachable(w[0], w[1]))
    }

    /// Cheap screen: some place has no usable way in, or (more than one, for
    /// open paths) no usable way out.
    fn obviously_infeasible(&self) -> bool {
        let n = self.n();
        let mut dead_ends = 0;
        for v in 0..n {
            let needs_in = v != self.start || self.end == PathEnd::ReturnToStart;
            if needs_in && !(0..n).any(|u| self.usable(u, v)) {
                return true;
            }
            let needs_out = !matches!(self.end, PathEnd::Fixed(e) if e == v);
            if needs_out && !(0..n).any(|w| self.usable(v, w)) {
                if self.end == PathEnd::Free && v != self.start {
                    dead_ends += 1;
                } else {
                    return true;
                }
            }
        }
        dead_ends > 1
    }

    /// Held-Karp over reachable arcs. Returns the visiting sequence, with the
    /// start repeated at the end for closed tours.
    fn solve_exact(&self) -> Option<Vec<usize>> {
        let n = self.n();
        let full = (1usize << n) - 1;
        let idx = |mask: usize, v: usize| mask * n + v;
        let mut best = vec![i64::MAX; (full + 1) * n];
        let mut parent = vec![usize::MAX; (full + 1) * n];
        best[idx(1 << self.start, self.start)] = 0;

        for mask in 0..=full {
            if mask & (1 << self.start) == 0 {
                continue;
            }
            for v in 0..n {
                let cost = best[idx(mask, v)];
                if cost == i64::MAX {
                    continue;
                }
                for w in 0..n {
                    if mask & (1 << w) != 0 || !self.usable(v, w) {
                        continue;
                    }
                    let next = idx(mask | (1 << w), w);
                    let candidate = cost + self.arc(v, w);
                    if candidate < best[next] {
                        best[next] = candidate;
                        parent[next] = v;
                    }
                }
            }
        }

        let done = |v: usize| best[idx(full, v)];
        let last = match self.end {
            PathEnd::Fixed(e) => (done(e) != i64::MAX).then_some(e),
            PathEnd::Free => (0..n)
                .filter(|&v| done(v) != i64::MAX)
                .min_by_key(|&v| (done(v), v)),
            PathEnd::ReturnToStart => (0..n)
                .filter(|&v| v != self.start && done(v) != i64::MAX && self.usable(v, self.start))
                .min_by_key(|&v| (done(v) + self.arc(v, self.start), v)),
        }?;

        let mut seq = Vec::with_capacity(n + 1);
        let (mut mask, mut v) = (full, last);
        loop {
            seq.push(v);
            let p = parent[idx(mask, v)];
            if p == usize::MAX {
                break;
            }
            mask ^= 1 << v;
            v = p;
        }
        seq.reverse();
        if self.end == PathEnd::ReturnToStart {
            seq.push(self.start);
        }
        Some(seq)
    }

    /// Path-cheapest-arc construction: always extend to the cheapest
    /// unvisited place, then append the fixed tail.
    fn greedy_sequence(&self) -> Vec<usize> {
        let n = self.n();
        let mut visited = vec![false; n];
        let mut seq = Vec::with_capacity(n + 1);
        visited[self.start] = true;
        if let PathEnd::Fixed(e) = self.end {
            visited[e] = true;
        }
        seq.push(self.start);

        let mut current = self.start;
        while let Some(next) = (0..n)
            .filter(|&v| !visited[v])
            .min_by_key(|&v| (self.arc(current, v), v))
        {
            visited[next] = true;
            seq.push(next);
            current = next;
        }

        match self.end {
            PathEnd::Fixed(e) => seq.push(e),
            PathEnd::ReturnToStart => seq.push(self.start),
            PathEnd::Free => {}
        }
        seq
    }

    /// Inclusive range of sequence positions local search may move.
    fn movable_range(&self, len: usize) -> (usize, usize) {
        match self.end {
            PathEnd::Free => (1, len - 1),
            PathEnd::Fixed(_) | PathEnd::ReturnToStart => (1, len - 2),
        }
    }

    fn base_costs(&self) -> ArcCosts {
        let n = self.n();
        let mut values = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                values.push(self.arc(i, j));
            }
        }
        ArcCosts { n, values }
    }

    /// Guided local search from the greedy path.
    ///
    /// Stops at the deadline, or after `max_iterations` once the best path is
    /// feasible. Beyond exact-search size an infeasible best path keeps the
    /// search going until the deadline, restarting from a perturbed copy of
    /// the best path whenever it stalls.
    fn solve_guided(&self, options: &SolveOptions, deadline: Instant) -> Vec<usize> {
        let n = self.n();
        let base = self.base_costs();
        let mut seq = self.greedy_sequence();
        let (lo, hi) = self.movable_range(seq.len());

        let mut best = seq.clone();
        let mut best_cost = base.sequence_cost(&best);
        debug!(greedy_cost = best_cost, "initial path built");

        if hi <= lo {
            return best;
        }

        let persist = n > MAX_EXACT_PLACES;
        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut penalties = vec![0u32; n * n];
        let mut lambda = 0.0;
        let mut stalled = 0usize;
        let mut iteration = 0usize;
        loop {
            if Instant::now() >= deadline {
                debug!(iteration, "solver time budget exhausted");
                break;
            }
            let feasible = best_cost < UNREACHABLE_PENALTY;
            if iteration >= options.max_iterations.max(1) && (feasible || !persist) {
                break;
            }

            if iteration == 0 {
                local_search(&mut seq, lo, hi, &base, deadline);
            } else {
                let costs = base.augmented(&penalties, lambda);
                local_search(&mut seq, lo, hi, &costs, deadline);
            }

            let cost = base.sequence_cost(&seq);
            if cost < best_cost {
                debug!(iteration, cost, "improved path");
                best_cost = cost;
                best.clone_from(&seq);
                stalled = 0;
            } else {
                stalled += 1;
            }

            if iteration == 0 {
                lambda = options.penalty_factor * base.mean_reachable_edge(&seq);
                if lambda <= 0.0 {
                    if best_cost < UNREACHABLE_PENALTY || !persist {
                        break;
                    }
                    lambda = 1.0;
                }
            }

            if best_cost >= UNREACHABLE_PENALTY && stalled >= STALL_LIMIT {
                debug!(iteration, "stuck on an unreachable arc; perturbing");
                seq.clone_from(&best);
                perturb(&mut seq, lo, hi, &mut rng);
                penalties.fill(0);
                stalled = 0;
            } else {
                base.penalize(&seq, &mut penalties);
            }
            iteration += 1;
        }

        best
    }

    fn finish(&self, seq: Vec<usize>) -> RouteOutcome {
        if !self.is_feasible(&seq) {
            return RouteOutcome::NoRoute;
        }

        let (cost, distance) = seq.windows(2).fold((0u64, 0u64), |(cost, distance), w| {
            let leg = self.matrix.get(w[0], w[1]);
            (
                cost + u64::from(leg.duration_seconds),
                distance + u64::from(leg.distance_meters),
            )
        });

        let returns_to_start = self.end == PathEnd::ReturnToStart;
        let mut order = seq;
        let mut closing_leg_seconds = 0;
        if returns_to_start {
            order.pop();
            if let Some(&last) = order.last() {
                closing_leg_seconds = u64::from(self.matrix.duration(last, self.start));
            }
        }

        RouteOutcome::Solved(Route {
            order,
            total_cost_seconds: cost,
            total_distance_meters: distance,
            returns_to_start,
            closing_leg_seconds,
        })
    }
}

/// Dense search costs, row-major `[from * n + to]`.
#[derive(Debug, Clone)]
struct ArcCosts {
    n: usize,
    values: Vec<i64>,
}

impl ArcCosts {
    fn get(&self, from: usize, to: usize) -> i64 {
        self.values[from * self.n + to]
    }

    fn sequence_cost(&self, seq: &[usize]) -> i64 {
        seq.windows(2).map(|w| self.get(w[0], w[1])).sum()
    }

    fn augmented(&self, penalties: &[u32], lambda: f64) -> ArcCosts {
        let values = self
            .values
            .iter()
            .zip(penalties)
            .map(|(cost, penalty)| cost.saturating_add((lambda * f64::from(*penalty)).round() as i64))
            .collect();
        ArcCosts { n: self.n, values }
    }

    fn mean_reachable_edge(&self, seq: &[usize]) -> f64 {
        let (sum, count) = seq
            .windows(2)
            .map(|w| self.get(w[0], w[1]))
            .filter(|cost| *cost < UNREACHABLE_PENALTY)
            .fold((0i64, 0usize), |(sum, count), cost| (sum + cost, count + 1));
        if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        }
    }

    /// Penalise the path's edges with maximal utility `cost / (1 + penalty)`.
    fn penalize(&self, seq: &[usize], penalties: &mut [u32]) {
        let utilities: Vec<(usize, f64)> = seq
            .windows(2)
            .map(|w| {
                let slot = w[0] * self.n + w[1];
                (slot, self.values[slot] as f64 / (1.0 + f64::from(penalties[slot])))
            })
            .collect();
        let max = utilities
            .iter()
            .map(|(_, utility)| *utility)
            .fold(f64::MIN, f64::max);
        for (slot, utility) in utilities {
            if utility >= max {
                penalties[slot] = penalties[slot].saturating_add(1);
            }
        }
    }
}

/// Apply best-improvement 2-opt, then or-opt, until neither improves or the
/// deadline passes.
fn local_search(seq: &mut Vec<usize>, lo: usize, hi: usize, costs: &ArcCosts, deadline: Instant) {
    while Instant::now() < deadline {
        if let Some((_, a, b)) = best_two_opt(seq, lo, hi, costs) {
            seq[a..=b].reverse();
            continue;
        }
        if let Some((_, a, len, p)) = best_or_opt(seq, lo, hi, costs) {
            apply_or_opt(seq, a, len, p);
            continue;
        }
        break;
    }
}

/// Best segment reversal `seq[a..=b]` within `lo..=hi`, as
/// `(delta, a, b)`. Reversed interior edges are re-priced, so asymmetric
/// costs are handled.
fn best_two_opt(seq: &[usize], lo: usize, hi: usize, costs: &ArcCosts) -> Option<(i64, usize, usize)> {
    if hi <= lo {
        return None;
    }
    let len = seq.len();
    let mut forward = vec![0i64; len];
    let mut backward = vec![0i64; len];
    for t in 1..len {
        forward[t] = forward[t - 1] + costs.get(seq[t - 1], seq[t]);
        backward[t] = backward[t - 1] + costs.get(seq[t], seq[t - 1]);
    }

    (lo..hi)
        .into_par_iter()
        .filter_map(|a| {
            let prev = seq[a - 1];
            let mut best: Option<(i64, usize, usize)> = None;
            for b in a + 1..=hi {
                let mut delta = costs.get(prev, seq[b]) - costs.get(prev, seq[a]);
                if let Some(&next) = seq.get(b + 1) {
                    delta += costs.get(seq[a], next) - costs.get(seq[b], next);
                }
                delta += (backward[b] - backward[a]) - (forward[b] - forward[a]);
                if delta < 0 && best.is_none_or(|(d, _, _)| delta < d) {
                    best = Some((delta, a, b));
                }
            }
            best
        })
        .min()
}

/// Best relocation of a chain `seq[a..a + len]` to just after position `p`,
/// as `(delta, a, len, p)`.
fn best_or_opt(
    seq: &[usize],
    lo: usize,
    hi: usize,
    costs: &ArcCosts,
) -> Option<(i64, usize, usize, usize)> {
    let mut best: Option<(i64, usize, usize, usize)> = None;
    for len in 1..=OR_OPT_MAX_SEGMENT {
        for a in lo..=hi {
            let last_pos = a + len - 1;
            if last_pos > hi {
                break;
            }
            let (prev, first, last) = (seq[a - 1], seq[a], seq[last_pos]);
            let after = seq.get(last_pos + 1).copied();

            let mut removal = -costs.get(prev, first);
            if let Some(next) = after {
                removal += costs.get(prev, next) - costs.get(last, next);
            }

            for p in lo - 1..=hi {
                if p + 1 >= a && p <= last_pos {
                    continue;
                }
                let x = seq[p];
                let mut insertion = costs.get(x, first);
                if let Some(&y) = seq.get(p + 1) {
                    insertion += costs.get(last, y) - costs.get(x, y);
                }
                let delta = removal + insertion;
                if delta < 0 && best.is_none_or(|(d, ..)| delta < d) {
                    best = Some((delta, a, len, p));
                }
            }
        }
    }
    best
}

/// Double-bridge kick inside `lo..=hi`: swap two adjacent random segments.
fn perturb(seq: &mut [usize], lo: usize, hi: usize, rng: &mut StdRng) {
    let span = hi + 1 - lo;
    if span < 2 {
        return;
    }
    let mut cuts = [
        rng.random_range(0..span),
        rng.random_range(0..span),
        rng.random_range(0..=span),
    ];
    cuts.sort_unstable();
    let (a, b, c) = (lo + cuts[0], lo + cuts[1], lo + cuts[2]);
    seq[a..c].rotate_left(b - a);
}

fn apply_or_opt(seq: &mut Vec<usize>, a: usize, len: usize, p: usize) {
    let chain: Vec<usize> = seq.drain(a..a + len).collect();
    let insert_at = if p < a { p + 1 } else { p + 1 - len };
    seq.splice(insert_at..insert_at, chain);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_matrix(n: usize) -> CostMatrix {
        let rows = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| Some((i as i64 - j as i64).unsigned_abs() as u32 * 60))
                    .collect()
            })
            .collect::<Vec<Vec<Option<u32>>>>();
        CostMatrix::from_durations(&rows).unwrap()
    }

    fn problem(matrix: &CostMatrix, start: usize, end: PathEnd) -> Problem<'_> {
        Problem { matrix, start, end }
    }

    #[test]
    fn exact_and_guided_agree_on_a_line() {
        let matrix = line_matrix(8);
        let p = problem(&matrix, 0, PathEnd::Free);
        let exact = p.solve_exact().unwrap();
        let guided = p.solve_guided(&SolveOptions::default(), Instant::now() + Duration::from_secs(2));
        assert_eq!(exact, (0..8).collect::<Vec<_>>());
        assert_eq!(guided, exact);
    }

    #[test]
    fn or_opt_moves_chain_forward_and_back() {
        let mut seq = vec![0, 1, 2, 3, 4, 5];
        apply_or_opt(&mut seq, 1, 2, 4);
        assert_eq!(seq, vec![0, 3, 4, 1, 2, 5]);

        let mut seq = vec![0, 1, 2, 3, 4, 5];
        apply_or_opt(&mut seq, 3, 2, 0);
        assert_eq!(seq, vec![0, 3, 4, 1, 2, 5]);
    }

    #[test]
    fn two_opt_delta_matches_recomputed_cost() {
        let durations = vec![
            vec![Some(0), Some(5), Some(9), Some(4), Some(7)],
            vec![Some(3), Some(0), Some(2), Some(8), Some(6)],
            vec![Some(7), Some(1), Some(0), Some(3), Some(9)],
            vec![Some(2), Some(6), Some(4), Some(0), Some(1)],
            vec![Some(8), Some(3), Some(5), Some(2), Some(0)],
        ];
        let matrix = CostMatrix::from_durations(&durations).unwrap();
        let p = problem(&matrix, 0, PathEnd::Free);
        let costs = p.base_costs();
        let seq = vec![0, 3, 1, 4, 2];
        let before = costs.sequence_cost(&seq);
        if let Some((delta, a, b)) = best_two_opt(&seq, 1, 4, &costs) {
            let mut moved = seq.clone();
            moved[a..=b].reverse();
            assert_eq!(costs.sequence_cost(&moved), before + delta);
        }
    }

    #[test]
    fn or_opt_delta_matches_recomputed_cost() {
        let durations = vec![
            vec![Some(0), Some(5), Some(9), Some(4), Some(7), Some(3)],
            vec![Some(3), Some(0), Some(2), Some(8), Some(6), Some(1)],
            vec![Some(7), Some(1), Some(0), Some(3), Some(9), Some(4)],
            vec![Some(2), Some(6), Some(4), Some(0), Some(1), Some(8)],
            vec![Some(8), Some(3), Some(5), Some(2), Some(0), Some(6)],
            vec![Some(4), Some(9), Some(2), Some(7), Some(5), Some(0)],
        ];
        let matrix = CostMatrix::from_durations(&durations).unwrap();
        let p = problem(&matrix, 0, PathEnd::Fixed(5));
        let costs = p.base_costs();
        let seq = vec![0, 4, 1, 3, 2, 5];
        let before = costs.sequence_cost(&seq);
        if let Some((delta, a, len, at)) = best_or_opt(&seq, 1, 4, &costs) {
            let mut moved = seq.clone();
            apply_or_opt(&mut moved, a, len, at);
            assert_eq!(moved[0], 0);
            assert_eq!(moved[5], 5);
            assert_eq!(costs.sequence_cost(&moved), before + delta);
        }
    }

    #[test]
    fn greedy_keeps_fixed_tail() {
        let matrix = line_matrix(5);
        let p = problem(&matrix, 2, PathEnd::Fixed(0));
        let seq = p.greedy_sequence();
        assert_eq!(seq.first(), Some(&2));
        assert_eq!(seq.last(), Some(&0));
        assert_eq!(seq.len(), 5);
    }

    #[test]
    fn closed_tour_includes_return_leg() {
        let matrix = line_matrix(4);
        let outcome = solve_route(&matrix, 0, Some(0), &SolveOptions::default()).unwrap();
        let route = outcome.into_route().unwrap();
        assert!(route.returns_to_start);
        assert_eq!(route.order.len(), 4);
        assert_eq!(route.total_cost_seconds, 6 * 60);
        assert_eq!(route.closing_leg_seconds, 3 * 60);
        assert_eq!(route.path_cost_seconds(), 3 * 60);
    }

    #[test]
    fn perturb_keeps_the_fixed_ends() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seq: Vec<usize> = (0..10).collect();
        for _ in 0..50 {
            perturb(&mut seq, 1, 8, &mut rng);
            assert_eq!(seq[0], 0);
            assert_eq!(seq[9], 9);
            let mut sorted = seq.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..10).collect::<Vec<_>>());
        }
    }

    #[test]
    fn infeasible_guided_result_falls_back_to_exact() {
        // Greedy from 0 takes the half-minute shortcuts into dead ends; only
        // 0 -> 2 -> 4 -> 1 -> 3 covers every place.
        let mut rows = vec![vec![None; 5]; 5];
        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = Some(0);
        }
        for (from, to) in [(0, 1), (1, 2), (2, 3)] {
            rows[from][to] = Some(30);
        }
        for (from, to) in [(0, 2), (2, 4), (4, 1), (1, 3)] {
            rows[from][to] = Some(600);
        }
        let matrix = CostMatrix::from_durations(&rows).unwrap();
        let options = SolveOptions {
            exact_threshold: 0,
            max_iterations: 1,
            ..SolveOptions::default()
        };

        let route = solve_route(&matrix, 0, None, &options).unwrap().into_route().unwrap();

        assert_eq!(route.order, vec![0, 2, 4, 1, 3]);
        assert_eq!(route.total_cost_seconds, 4 * 600);
    }

    #[test]
    fn penalties_hit_the_longest_edge() {
        let matrix = line_matrix(4);
        let p = problem(&matrix, 0, PathEnd::Free);
        let costs = p.base_costs();
        let mut penalties = vec![0u32; 16];
        costs.penalize(&[0, 3, 1, 2], &mut penalties);
        assert_eq!(penalties[3], 1);
        assert_eq!(penalties.iter().sum::<u32>(), 1);
    }
}
