//! Report aggregation - summary counts plus per-password findings.
//!
//! The shapes here are what external renderers consume: either the JSON
//! produced by [`AssessmentReport::to_json`] or the plain summary lines of
//! [`ReportSummary`]'s `Display` implementation.

use std::fmt;

use serde::Serialize;

use crate::assessor::{AssessError, AssessmentResult};
use crate::scorer::Classification;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub cracked: usize,
    /// Classified `WEAK`.
    pub weak: usize,
    /// Classified `STRONG` or `VERY_STRONG`.
    pub strong: usize,
    /// Crack test timed out, so resistance is unknown.
    pub inconclusive: usize,
    /// Crack test could not run at all.
    pub crack_unavailable: usize,
    /// Inputs rejected before assessment (empty or malformed password, unknown profile).
    pub rejected: usize,
}

impl ReportSummary {
    pub fn tally<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a AssessmentResult>,
    {
        results.into_iter().fold(Self::default(), |mut summary, result| {
            summary.total += 1;
            if result.crack.cracked {
                summary.cracked += 1;
            }
            if result.crack.timed_out() {
                summary.inconclusive += 1;
            }
            if !result.crack.attempted {
                summary.crack_unavailable += 1;
            }
            match result.strength.classification {
                Classification::Weak => summary.weak += 1,
                Classification::Strong | Classification::VeryStrong => summary.strong += 1,
                Classification::Moderate => {}
            }
            summary
        })
    }

    /// Share of `count` in the total, in percent. 0 for an empty report.
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        count as f64 * 100.0 / self.total as f64
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total passwords tested: {}", self.total)?;
        writeln!(f, "Passwords cracked: {}", self.cracked)?;
        writeln!(f, "Weak passwords: {}", self.weak)?;
        writeln!(f, "Strong passwords: {}", self.strong)?;
        writeln!(f, "Inconclusive crack tests: {}", self.inconclusive)?;
        writeln!(f, "Crack tests unavailable: {}", self.crack_unavailable)?;
        if self.rejected > 0 {
            writeln!(f, "Rejected inputs: {}", self.rejected)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentReport {
    pub summary: ReportSummary,
    pub entries: Vec<AssessmentResult>,
}

impl AssessmentReport {
    pub fn from_results(entries: Vec<AssessmentResult>) -> Self {
        Self {
            summary: ReportSummary::tally(&entries),
            entries,
        }
    }

    /// Builds a report from batch output, counting rejected inputs.
    pub fn from_batch(batch: Vec<Result<AssessmentResult, AssessError>>) -> Self {
        let mut rejected = 0;
        let entries: Vec<AssessmentResult> = batch
            .into_iter()
            .filter_map(|result| match result {
                Ok(result) => Some(result),
                Err(_) => {
                    rejected += 1;
                    None
                }
            })
            .collect();

        let mut report = Self::from_results(entries);
        report.summary.rejected = rejected;
        report
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
