//! Monthly summary and the single aggregation rule.
//!
//! The server builds summaries by folding `Summary::apply` over committed
//! transactions, and the optimistic projection applies the exact same
//! function for a provisional entry, so the two can never drift.

use serde::{Deserialize, Serialize};

use super::transaction::TransactionType;

/// Spending totals per non-saving bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpentBreakdown {
    #[serde(rename = "FIXED")]
    pub fixed: f64,
    #[serde(rename = "VARIABLE")]
    pub variable: f64,
    #[serde(rename = "EXTRA")]
    pub extra: f64,
}

/// Aggregated view of one month for one scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub income_total: f64,
    pub spent_breakdown: SpentBreakdown,
    pub spent_total: f64,
    pub saving_total: f64,
    pub net_total: f64,
    pub goal_monthly: f64,
    pub progress: f64,
}

impl Summary {
    /// Empty summary for a given income and savings goal.
    pub fn new(income_total: f64, goal_monthly: f64) -> Self {
        let mut summary = Self {
            income_total,
            spent_breakdown: SpentBreakdown::default(),
            spent_total: 0.0,
            saving_total: 0.0,
            net_total: 0.0,
            goal_monthly,
            progress: 0.0,
        };
        summary.recompute();
        summary
    }

    /// Fold one transaction into the summary: SAVING accrues toward the
    /// goal, everything else lands in its spending bucket.
    pub fn apply(&mut self, tx_type: TransactionType, amount: f64) {
        match tx_type {
            TransactionType::Saving => self.saving_total += amount,
            TransactionType::Fixed => self.spent_breakdown.fixed += amount,
            TransactionType::Variable => self.spent_breakdown.variable += amount,
            TransactionType::Extra => self.spent_breakdown.extra += amount,
        }
        self.recompute();
    }

    /// Build a summary from scratch over committed transactions.
    pub fn build(
        income_total: f64,
        goal_monthly: f64,
        entries: impl IntoIterator<Item = (TransactionType, f64)>,
    ) -> Self {
        let mut summary = Self::new(income_total, goal_monthly);
        for (tx_type, amount) in entries {
            summary.apply(tx_type, amount);
        }
        summary
    }

    fn recompute(&mut self) {
        self.spent_total =
            self.spent_breakdown.fixed + self.spent_breakdown.variable + self.spent_breakdown.extra;
        self.net_total = self.income_total - self.spent_total - self.saving_total;
        self.progress = if self.goal_monthly > 0.0 {
            (self.saving_total / self.goal_monthly * 100.0).min(100.0)
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_matches_incremental_apply() {
        // The projection delta must equal the server-side rebuild.
        let server = Summary::build(
            1000.0,
            100.0,
            vec![
                (TransactionType::Fixed, 100.0),
                (TransactionType::Saving, 50.0),
            ],
        );

        let mut projected = Summary::build(1000.0, 100.0, vec![(TransactionType::Fixed, 100.0)]);
        projected.apply(TransactionType::Saving, 50.0);

        assert_eq!(server, projected);
        assert_eq!(projected.saving_total, 50.0);
        assert_eq!(projected.progress, 50.0);
        assert_eq!(projected.net_total, 850.0);
    }

    #[test]
    fn test_progress_caps_at_hundred() {
        let summary = Summary::build(0.0, 100.0, vec![(TransactionType::Saving, 250.0)]);
        assert_eq!(summary.progress, 100.0);
    }

    #[test]
    fn test_zero_goal_has_zero_progress() {
        let summary = Summary::build(0.0, 0.0, vec![(TransactionType::Saving, 50.0)]);
        assert_eq!(summary.progress, 0.0);
    }

    #[test]
    fn test_spent_total_sums_all_buckets() {
        let summary = Summary::build(
            500.0,
            0.0,
            vec![
                (TransactionType::Fixed, 10.0),
                (TransactionType::Variable, 20.0),
                (TransactionType::Extra, 30.0),
            ],
        );
        assert_eq!(summary.spent_total, 60.0);
        assert_eq!(summary.net_total, 440.0);
    }
}
