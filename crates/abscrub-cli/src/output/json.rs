use abscrub_core::error::AbscrubError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Batch totals printed after `extract` and `redact`.
#[derive(Debug, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    /// Documents per outcome label.
    pub counts: BTreeMap<String, usize>,
    /// Documents that carry a failure reason, with that reason.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub problems: BTreeMap<String, String>,
}

impl BatchSummary {
    pub fn from_outcomes<'a>(
        outcomes: impl IntoIterator<Item = (&'a str, &'static str, Option<&'a str>)>,
    ) -> Self {
        let mut summary = BatchSummary::default();
        for (id, label, reason) in outcomes {
            summary.total += 1;
            *summary.counts.entry(label.to_string()).or_default() += 1;
            if let Some(reason) = reason {
                summary.problems.insert(id.to_string(), reason.to_string());
            }
        }
        summary
    }
}

pub fn print_summary<'a>(
    outcomes: impl IntoIterator<Item = (&'a str, &'static str, Option<&'a str>)>,
) -> Result<(), AbscrubError> {
    let summary = BatchSummary::from_outcomes(outcomes);
    let json = serde_json::to_string_pretty(&summary)?;
    println!("{json}");
    Ok(())
}
