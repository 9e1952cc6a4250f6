use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use web_time::Instant;

use crate::ai::eval::{MAX_SCORE, MIN_SCORE, is_decisive};
use crate::error::SearchConfigError;
use crate::types::{BLACK_INDEX, WHITE_INDEX};

/// How far a search may go. Exactly one bound applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimits {
    /// One fixed-depth pass.
    MaxDepth(u32),
    /// Iterative deepening within a wall-clock budget.
    TimeBudget(Duration),
}

impl SearchLimits {
    pub fn validate(&self) -> Result<(), SearchConfigError> {
        match self {
            Self::MaxDepth(0) => Err(SearchConfigError::ZeroLimit),
            Self::TimeBudget(budget) if budget.is_zero() => Err(SearchConfigError::ZeroLimit),
            _ => Ok(()),
        }
    }
}

/// Wire form of [`SearchLimits`]: `{ millisecondsLimit }` or `{ maxDepth }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLimitsConfig {
    #[serde(default)]
    pub milliseconds_limit: Option<u64>,
    #[serde(default)]
    pub max_depth: Option<u32>,
}

impl TryFrom<SearchLimitsConfig> for SearchLimits {
    type Error = SearchConfigError;

    fn try_from(config: SearchLimitsConfig) -> Result<Self, Self::Error> {
        let limits = match (config.milliseconds_limit, config.max_depth) {
            (Some(ms), None) => Self::TimeBudget(Duration::from_millis(ms)),
            (None, Some(depth)) => Self::MaxDepth(depth),
            _ => return Err(SearchConfigError::AmbiguousLimits),
        };
        limits.validate()?;
        Ok(limits)
    }
}

/// A two-player game as seen by the search.
///
/// Scores are always from the point of view of player 0: player 0 maximises,
/// player 1 minimises.
pub trait GameTree {
    type State: Clone;

    /// States reachable in one ply with `turn_index` to move.
    fn successors(&self, state: &Self::State, turn_index: usize) -> Vec<Self::State>;

    fn evaluate(&self, state: &Self::State, turn_index: usize) -> i32;

    /// Side to move in `child`, which was reached by a move of `turn_index`.
    fn next_turn(&self, _child: &Self::State, turn_index: usize) -> usize {
        1 - turn_index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome<S> {
    /// The chosen successor of the starting state.
    pub best: S,
    pub score: i32,
    /// Deepest fully searched depth the result comes from.
    pub completed_depth: u32,
    /// True when the budget ran out in the middle of a depth.
    pub timed_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchResult {
    /// Index of the best root child and its score.
    Complete(usize, i32),
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeResult {
    Score(i32),
    TimedOut,
}

pub struct Searcher<'a, G: GameTree> {
    tree: &'a G,
    start_time: Instant,
    timeout: Option<Duration>,
    timed_out: bool,
    hit_depth_limit: bool,
    nodes: u64,
}

/// Chooses a successor of `start` for `player_index` within `limits`.
/// Returns `Ok(None)` when `start` has no successors.
pub fn alpha_beta_decision<G: GameTree>(
    tree: &G,
    start: &G::State,
    player_index: usize,
    limits: SearchLimits,
) -> Result<Option<SearchOutcome<G::State>>, SearchConfigError> {
    Searcher::new(tree).search(start, player_index, limits)
}

impl<'a, G: GameTree> Searcher<'a, G> {
    pub fn new(tree: &'a G) -> Self {
        Self {
            tree,
            start_time: Instant::now(),
            timeout: None,
            timed_out: false,
            hit_depth_limit: false,
            nodes: 0,
        }
    }

    pub fn search(
        &mut self,
        start: &G::State,
        player_index: usize,
        limits: SearchLimits,
    ) -> Result<Option<SearchOutcome<G::State>>, SearchConfigError> {
        if player_index != BLACK_INDEX && player_index != WHITE_INDEX {
            return Err(SearchConfigError::InvalidPlayerIndex(player_index));
        }
        limits.validate()?;

        self.start_time = Instant::now();
        self.timed_out = false;
        self.nodes = 0;

        let children = self.ordered_children(start, player_index);
        if children.is_empty() {
            return Ok(None);
        }
        let maximizing = player_index == BLACK_INDEX;

        let (index, score, completed_depth) = match limits {
            SearchLimits::MaxDepth(depth) => {
                self.timeout = None;
                match self.search_root(&children, maximizing, depth, depth) {
                    SearchResult::Complete(index, score) => (index, score, depth),
                    // Unreachable without a deadline; keep the ordering favourite.
                    SearchResult::TimedOut => (0, self.static_score(&children[0]), 0),
                }
            }
            SearchLimits::TimeBudget(budget) => {
                self.timeout = Some(budget);
                self.iterative_deepening(&children, maximizing, budget)
            }
        };

        debug!(
            completed_depth,
            score,
            nodes = self.nodes,
            timed_out = self.timed_out,
            elapsed_ms = self.start_time.elapsed().as_millis() as u64,
            "search finished"
        );

        Ok(Some(SearchOutcome {
            best: children[index].0.clone(),
            score,
            completed_depth,
            timed_out: self.timed_out,
        }))
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    fn iterative_deepening(
        &mut self,
        children: &[(G::State, usize)],
        maximizing: bool,
        budget: Duration,
    ) -> (usize, i32, u32) {
        let mut best = (0, self.static_score(&children[0]), 0);

        for depth in 1.. {
            // Each depth costs far more than the previous one.
            if depth > 1 && self.start_time.elapsed() > budget / 2 {
                debug!(depth, "not starting depth: half of the budget is spent");
                break;
            }

            self.hit_depth_limit = false;
            match self.search_root(children, maximizing, depth, depth) {
                SearchResult::Complete(index, score) => {
                    best = (index, score, depth);
                    debug!(depth, score, nodes = self.nodes, "completed depth");
                    if is_decisive(score) || !self.hit_depth_limit {
                        break;
                    }
                }
                SearchResult::TimedOut => {
                    debug!(depth, "budget elapsed, keeping previous depth");
                    break;
                }
            }
        }

        best
    }

    fn search_root(
        &mut self,
        children: &[(G::State, usize)],
        maximizing: bool,
        depth: u32,
        root_depth: u32,
    ) -> SearchResult {
        let mut alpha = MIN_SCORE;
        let mut beta = MAX_SCORE;
        let mut best: Option<(usize, i32)> = None;

        for (index, (child, child_turn)) in children.iter().enumerate() {
            let score = match self.alpha_beta(child, *child_turn, depth - 1, root_depth, alpha, beta)
            {
                NodeResult::Score(score) => score,
                NodeResult::TimedOut => return SearchResult::TimedOut,
            };

            let improves = match best {
                None => true,
                Some((_, best_score)) if maximizing => score > best_score,
                Some((_, best_score)) => score < best_score,
            };
            if improves {
                best = Some((index, score));
            }
            if maximizing {
                alpha = alpha.max(score);
            } else {
                beta = beta.min(score);
            }
        }

        match best {
            Some((index, score)) => SearchResult::Complete(index, score),
            None => SearchResult::TimedOut,
        }
    }

    fn alpha_beta(
        &mut self,
        state: &G::State,
        turn_index: usize,
        depth: u32,
        root_depth: u32,
        mut alpha: i32,
        mut beta: i32,
    ) -> NodeResult {
        // Depth 1 always completes so there is a result to fall back to.
        if root_depth > 1 && self.deadline_passed() {
            self.timed_out = true;
            return NodeResult::TimedOut;
        }
        self.nodes += 1;

        if depth == 0 {
            self.hit_depth_limit = true;
            return NodeResult::Score(self.tree.evaluate(state, turn_index));
        }

        let children = if depth > 1 {
            self.ordered_children(state, turn_index)
        } else {
            self.children(state, turn_index)
        };
        if children.is_empty() {
            return NodeResult::Score(self.tree.evaluate(state, turn_index));
        }

        let maximizing = turn_index == BLACK_INDEX;
        let mut best = if maximizing { MIN_SCORE } else { MAX_SCORE };

        for (child, child_turn) in &children {
            let score = match self.alpha_beta(child, *child_turn, depth - 1, root_depth, alpha, beta)
            {
                NodeResult::Score(score) => score,
                NodeResult::TimedOut => return NodeResult::TimedOut,
            };

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(best);
            } else {
                best = best.min(score);
                beta = beta.min(best);
            }
            if alpha >= beta {
                break;
            }
        }

        NodeResult::Score(best)
    }

    fn children(&self, state: &G::State, turn_index: usize) -> Vec<(G::State, usize)> {
        self.tree
            .successors(state, turn_index)
            .into_iter()
            .map(|child| {
                let child_turn = self.tree.next_turn(&child, turn_index);
                (child, child_turn)
            })
            .collect()
    }

    /// Children sorted best-first for the side to move by static score.
    fn ordered_children(&self, state: &G::State, turn_index: usize) -> Vec<(G::State, usize)> {
        let mut scored: Vec<(i32, (G::State, usize))> = self
            .children(state, turn_index)
            .into_iter()
            .map(|child| (self.static_score(&child), child))
            .collect();
        trace!(successors = scored.len(), turn_index, "expanding node");

        if turn_index == BLACK_INDEX {
            scored.sort_by(|(left, _), (right, _)| right.cmp(left));
        } else {
            scored.sort_by(|(left, _), (right, _)| left.cmp(right));
        }
        scored.into_iter().map(|(_, child)| child).collect()
    }

    fn static_score(&self, (state, turn_index): &(G::State, usize)) -> i32 {
        self.tree.evaluate(state, *turn_index)
    }

    fn deadline_passed(&self) -> bool {
        self.timeout
            .is_some_and(|timeout| self.start_time.elapsed() >= timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::thread;

    /// Explicit tree: node `i` has children `edges[i]` and static value `values[i]`.
    struct ToyTree {
        edges: Vec<Vec<usize>>,
        values: Vec<i32>,
        evaluated: RefCell<Vec<usize>>,
    }

    impl ToyTree {
        fn new(edges: Vec<Vec<usize>>, values: Vec<i32>) -> Self {
            Self {
                edges,
                values,
                evaluated: RefCell::new(Vec::new()),
            }
        }
    }

    impl GameTree for ToyTree {
        type State = usize;

        fn successors(&self, state: &usize, _turn_index: usize) -> Vec<usize> {
            self.edges[*state].clone()
        }

        fn evaluate(&self, state: &usize, _turn_index: usize) -> i32 {
            self.evaluated.borrow_mut().push(*state);
            self.values[*state]
        }
    }

    /// Never-ending binary tree whose state is the ply count.
    struct Endless {
        win_at_ply_one: bool,
    }

    impl GameTree for Endless {
        type State = u32;

        fn successors(&self, state: &u32, _turn_index: usize) -> Vec<u32> {
            vec![state + 1, state + 1]
        }

        fn evaluate(&self, state: &u32, _turn_index: usize) -> i32 {
            if self.win_at_ply_one && *state == 1 {
                MAX_SCORE
            } else {
                *state as i32
            }
        }
    }

    /// Binary tree whose state is the ply count. Expanding a state at or past
    /// `slow_from` sleeps for `delay`.
    struct Sluggish {
        slow_from: u32,
        delay: Duration,
        deepest_expanded: Cell<u32>,
    }

    impl Sluggish {
        fn new(slow_from: u32, delay: Duration) -> Self {
            Self {
                slow_from,
                delay,
                deepest_expanded: Cell::new(0),
            }
        }
    }

    impl GameTree for Sluggish {
        type State = u32;

        fn successors(&self, state: &u32, _turn_index: usize) -> Vec<u32> {
            self.deepest_expanded.set(self.deepest_expanded.get().max(*state));
            if *state >= self.slow_from {
                thread::sleep(self.delay);
            }
            vec![state + 1, state + 1]
        }

        fn evaluate(&self, state: &u32, _turn_index: usize) -> i32 {
            *state as i32
        }
    }

    // 0 -> {1, 2}; 1 -> {3, 4}; 2 -> {5, 6}
    fn two_level_tree() -> ToyTree {
        ToyTree::new(
            vec![vec![1, 2], vec![3, 4], vec![5, 6], vec![], vec![], vec![], vec![]],
            vec![0, 0, 0, 3, 5, 2, 9],
        )
    }

    #[test]
    fn minimax_picks_best_guaranteed_outcome() {
        let tree = two_level_tree();

        let outcome = alpha_beta_decision(&tree, &0, BLACK_INDEX, SearchLimits::MaxDepth(2))
            .unwrap()
            .unwrap();

        assert_eq!(outcome.best, 1);
        assert_eq!(outcome.score, 3);
        assert_eq!(outcome.completed_depth, 2);
        assert!(!outcome.timed_out);
    }

    #[test]
    fn minimizing_player_picks_lowest_guaranteed_outcome() {
        let tree = two_level_tree();

        let outcome = alpha_beta_decision(&tree, &0, WHITE_INDEX, SearchLimits::MaxDepth(2))
            .unwrap()
            .unwrap();

        // White picks a child, black answers with the maximum: max(3,5)=5, max(2,9)=9.
        assert_eq!(outcome.best, 1);
        assert_eq!(outcome.score, 5);
    }

    #[test]
    fn alpha_beta_skips_refuted_siblings() {
        let tree = two_level_tree();

        alpha_beta_decision(&tree, &0, BLACK_INDEX, SearchLimits::MaxDepth(2)).unwrap();

        let evaluated = tree.evaluated.borrow();
        assert!(evaluated.contains(&5));
        assert!(!evaluated.contains(&6), "leaf 6 is cut off after 2 < 3");
    }

    #[test]
    fn terminal_start_has_no_decision() {
        let tree = ToyTree::new(vec![vec![]], vec![7]);

        let outcome = alpha_beta_decision(&tree, &0, BLACK_INDEX, SearchLimits::MaxDepth(3));

        assert_eq!(outcome, Ok(None));
    }

    #[test]
    fn iterative_deepening_stops_on_forced_win() {
        let tree = Endless {
            win_at_ply_one: true,
        };
        let started = Instant::now();

        let outcome = alpha_beta_decision(
            &tree,
            &0,
            BLACK_INDEX,
            SearchLimits::TimeBudget(Duration::from_secs(30)),
        )
        .unwrap()
        .unwrap();

        assert_eq!(outcome.score, MAX_SCORE);
        assert_eq!(outcome.completed_depth, 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn iterative_deepening_stops_once_tree_is_exhausted() {
        let tree = two_level_tree();

        let outcome = alpha_beta_decision(
            &tree,
            &0,
            BLACK_INDEX,
            SearchLimits::TimeBudget(Duration::from_secs(30)),
        )
        .unwrap()
        .unwrap();

        assert_eq!(outcome.best, 1);
        assert_eq!(outcome.completed_depth, 3);
    }

    #[test]
    fn tiny_budget_still_completes_depth_one() {
        let tree = Endless {
            win_at_ply_one: false,
        };

        let outcome = alpha_beta_decision(
            &tree,
            &0,
            BLACK_INDEX,
            SearchLimits::TimeBudget(Duration::from_nanos(1)),
        )
        .unwrap()
        .unwrap();

        assert_eq!(outcome.completed_depth, 1);
        assert_eq!(outcome.best, 1);
    }

    #[test]
    fn time_limited_search_respects_budget() {
        let tree = Endless {
            win_at_ply_one: false,
        };
        let started = Instant::now();

        let outcome = alpha_beta_decision(
            &tree,
            &0,
            WHITE_INDEX,
            SearchLimits::TimeBudget(Duration::from_millis(20)),
        )
        .unwrap()
        .unwrap();

        assert!(outcome.completed_depth >= 1);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn timeout_mid_depth_falls_back_to_previous_depth() {
        // Depths 1 and 2 are instant. Depth 3 expands ply 2 twice at 60ms each
        // and runs past the 100ms budget.
        let tree = Sluggish::new(2, Duration::from_millis(60));

        let outcome = alpha_beta_decision(
            &tree,
            &0,
            BLACK_INDEX,
            SearchLimits::TimeBudget(Duration::from_millis(100)),
        )
        .unwrap()
        .unwrap();

        assert!(outcome.timed_out);
        assert_eq!(outcome.completed_depth, 2);
        assert_eq!(outcome.score, 2);
        assert_eq!(outcome.best, 1);
        assert_eq!(tree.deepest_expanded.get(), 2);
    }

    #[test]
    fn new_depth_is_not_started_past_half_the_budget() {
        // Depth 2 expands ply 1 twice at 30ms each, leaving 60ms of a 100ms budget spent.
        let tree = Sluggish::new(1, Duration::from_millis(30));

        let outcome = alpha_beta_decision(
            &tree,
            &0,
            BLACK_INDEX,
            SearchLimits::TimeBudget(Duration::from_millis(100)),
        )
        .unwrap()
        .unwrap();

        assert!(!outcome.timed_out);
        assert_eq!(outcome.completed_depth, 2);
        assert_eq!(outcome.score, 2);
        assert_eq!(tree.deepest_expanded.get(), 1, "depth 3 never expands ply 2");
    }

    #[test]
    fn deeper_pass_aborts_once_deadline_is_exceeded() {
        let tree = two_level_tree();
        let mut searcher = Searcher::new(&tree);
        let children = searcher.ordered_children(&0, BLACK_INDEX);
        searcher.timeout = Some(Duration::from_millis(1));
        searcher.start_time = Instant::now() - Duration::from_millis(5);

        assert_eq!(
            searcher.search_root(&children, true, 2, 2),
            SearchResult::TimedOut
        );
        assert!(searcher.timed_out());
        assert_eq!(
            searcher.search_root(&children, true, 1, 1),
            SearchResult::Complete(0, 0)
        );
    }

    #[test]
    fn limits_require_exactly_one_positive_bound() {
        let both = SearchLimitsConfig {
            milliseconds_limit: Some(10),
            max_depth: Some(2),
        };
        assert_eq!(
            SearchLimits::try_from(both),
            Err(SearchConfigError::AmbiguousLimits)
        );
        assert_eq!(
            SearchLimits::try_from(SearchLimitsConfig::default()),
            Err(SearchConfigError::AmbiguousLimits)
        );
        assert_eq!(
            SearchLimits::try_from(SearchLimitsConfig {
                milliseconds_limit: None,
                max_depth: Some(0),
            }),
            Err(SearchConfigError::ZeroLimit)
        );
        assert_eq!(
            SearchLimits::try_from(SearchLimitsConfig {
                milliseconds_limit: Some(250),
                max_depth: None,
            }),
            Ok(SearchLimits::TimeBudget(Duration::from_millis(250)))
        );

        let parsed: SearchLimitsConfig = serde_json::from_str(r#"{"maxDepth": 4}"#).unwrap();
        assert_eq!(SearchLimits::try_from(parsed), Ok(SearchLimits::MaxDepth(4)));
    }

    #[test]
    fn out_of_range_player_index_fails_loudly() {
        let tree = two_level_tree();

        assert_eq!(
            alpha_beta_decision(&tree, &0, 2, SearchLimits::MaxDepth(1)),
            Err(SearchConfigError::InvalidPlayerIndex(2))
        );
        assert_eq!(
            alpha_beta_decision(&tree, &0, 0, SearchLimits::MaxDepth(0)),
            Err(SearchConfigError::ZeroLimit)
        );
    }
}
