use crate::performance::PerformanceId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankChange {
    pub performance_id: PerformanceId,
    pub from: Option<u32>,
    pub to: Option<u32>,
}

/// Writes needed to settle a lineup after one performance asked for a rank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReorderPlan {
    pub sibling_changes: Vec<RankChange>,
    pub mutated: Option<RankChange>,
    pub final_rank: Option<u32>,
}

impl ReorderPlan {
    pub fn changes(&self) -> impl Iterator<Item = &RankChange> {
        self.sibling_changes.iter().chain(self.mutated.iter())
    }

    pub fn is_settled(&self) -> bool {
        self.sibling_changes.is_empty() && self.mutated.is_none()
    }
}

/// Single-pass renumbering of ranked siblings around a reserved rank.
///
/// `siblings` are `(id, current rank)` pairs for the other ranked performances
/// of the event; the mutated performance is never among them.
pub struct OrderCompactor {
    siblings: Vec<(PerformanceId, u32)>,
}

impl OrderCompactor {
    pub fn new<I>(siblings: I) -> Self
    where
        I: IntoIterator<Item = (PerformanceId, u32)>,
    {
        let mut siblings: Vec<(PerformanceId, u32)> = siblings.into_iter().collect();
        siblings.sort_by_key(|&(id, rank)| (rank, id));
        Self { siblings }
    }

    /// Places `mutated` at `desired` (clamped to the end of the lineup) and
    /// shifts siblings so ranks read `1..=N` with their order preserved.
    /// A `None` desire clears the mutated rank and leaves siblings alone.
    pub fn plan(
        &self,
        mutated: PerformanceId,
        current: Option<u32>,
        desired: Option<u32>,
    ) -> ReorderPlan {
        let Some(desired) = desired else {
            return ReorderPlan {
                sibling_changes: Vec::new(),
                mutated: current.map(|from| RankChange {
                    performance_id: mutated,
                    from: Some(from),
                    to: None,
                }),
                final_rank: None,
            };
        };

        let (sibling_changes, next) = self.walk(Some(desired));
        let target = desired.min(next);

        ReorderPlan {
            sibling_changes,
            mutated: (current != Some(target)).then_some(RankChange {
                performance_id: mutated,
                from: current,
                to: Some(target),
            }),
            final_rank: Some(target),
        }
    }

    /// Renumbers siblings to `1..=N` without reserving any rank.
    pub fn close_gaps(&self) -> Vec<RankChange> {
        self.walk(None).0
    }

    fn walk(&self, reserved: Option<u32>) -> (Vec<RankChange>, u32) {
        let mut changes = Vec::new();
        let mut expected = 1u32;
        for &(id, rank) in &self.siblings {
            if Some(expected) == reserved {
                expected += 1;
            }
            if rank != expected {
                changes.push(RankChange {
                    performance_id: id,
                    from: Some(rank),
                    to: Some(expected),
                });
            }
            expected += 1;
        }
        (changes, expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn siblings(pairs: &[(u64, u32)]) -> OrderCompactor {
        OrderCompactor::new(pairs.iter().map(|&(id, rank)| (PerformanceId(id), rank)))
    }

    fn moved(plan: &ReorderPlan) -> Vec<(u64, u32)> {
        plan.sibling_changes
            .iter()
            .map(|c| (c.performance_id.0, c.to.unwrap()))
            .collect()
    }

    #[test]
    fn inserting_in_the_middle_shifts_the_tail() {
        let compactor = siblings(&[(1, 1), (2, 2), (3, 3), (4, 4)]);
        let plan = compactor.plan(PerformanceId(9), None, Some(2));
        assert_eq!(moved(&plan), vec![(2, 3), (3, 4), (4, 5)]);
        assert_eq!(plan.final_rank, Some(2));
    }

    #[test]
    fn desire_past_the_end_is_clamped() {
        let compactor = siblings(&[(1, 1), (2, 2), (3, 3)]);
        let plan = compactor.plan(PerformanceId(9), Some(1), Some(99));
        assert!(plan.sibling_changes.is_empty());
        assert_eq!(plan.final_rank, Some(4));
        assert_eq!(
            plan.mutated,
            Some(RankChange {
                performance_id: PerformanceId(9),
                from: Some(1),
                to: Some(4)
            })
        );
    }

    #[test]
    fn gaps_are_closed_while_reserving() {
        let compactor = siblings(&[(5, 10), (6, 4), (7, 7)]);
        let plan = compactor.plan(PerformanceId(1), Some(2), Some(1));
        assert_eq!(moved(&plan), vec![(6, 2), (7, 3), (5, 4)]);
        assert_eq!(plan.final_rank, Some(1));
        assert_eq!(plan.mutated.map(|c| c.to), Some(Some(1)));
    }

    #[test]
    fn settled_lineup_plans_nothing() {
        let compactor = siblings(&[(1, 1), (3, 3)]);
        let plan = compactor.plan(PerformanceId(2), Some(2), Some(2));
        assert!(plan.is_settled());
    }

    #[test]
    fn null_desire_only_clears_the_mutated_rank() {
        let compactor = siblings(&[(1, 1), (3, 5)]);
        let plan = compactor.plan(PerformanceId(2), Some(2), None);
        assert!(plan.sibling_changes.is_empty());
        assert_eq!(plan.final_rank, None);
        assert_eq!(plan.mutated.map(|c| c.to), Some(None));

        assert!(compactor.plan(PerformanceId(2), None, None).is_settled());
    }

    #[test]
    fn close_gaps_renumbers_from_one() {
        let compactor = siblings(&[(1, 2), (2, 5), (3, 6)]);
        let changes = compactor.close_gaps();
        let to: Vec<(u64, Option<u32>)> = changes.iter().map(|c| (c.performance_id.0, c.to)).collect();
        assert_eq!(to, vec![(1, Some(1)), (2, Some(2)), (3, Some(3))]);
    }
}
