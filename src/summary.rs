//! Human-readable report of a merge's per-section counters.

use std::fmt;

use crate::types::SectionChange;

/// Plain-text merge report.
///
/// Sections that gained or lost entries get a block of their own; the rest
/// only contribute to the closing totals line.
#[derive(Debug, Clone, Copy)]
pub struct DiffSummary<'a> {
    changes: &'a [SectionChange],
}

impl<'a> DiffSummary<'a> {
    pub fn new(changes: &'a [SectionChange]) -> Self {
        Self { changes }
    }

    pub fn total_added(&self) -> usize {
        self.changes.iter().map(|c| c.added).sum()
    }

    pub fn total_removed(&self) -> usize {
        self.changes.iter().map(|c| c.removed).sum()
    }
}

impl fmt::Display for DiffSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Merge Summary:")?;
        writeln!(f)?;

        for change in self.changes {
            if change.added == 0 && change.removed == 0 {
                continue;
            }
            writeln!(f, "[{}]", change.section)?;
            if change.added > 0 {
                writeln!(f, "  + {} added", change.added)?;
            }
            if change.removed > 0 {
                writeln!(f, "  - {} removed", change.removed)?;
            }
            writeln!(f, "  = {} unchanged", change.unchanged)?;
            writeln!(f)?;
        }

        write!(
            f,
            "Total: +{} / -{}",
            self.total_added(),
            self.total_removed()
        )
    }
}

/// Render the report for `changes` as a string.
pub fn generate_diff_summary(changes: &[SectionChange]) -> String {
    DiffSummary::new(changes).to_string()
}
