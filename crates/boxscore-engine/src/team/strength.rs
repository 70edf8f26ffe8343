// League category strength: each team's totals against the rest of the league.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::team::aggregate::TeamSnapshot;

/// Five-step label for a team's standing in one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthTier {
    VeryWeak,
    Weak,
    Average,
    Strong,
    VeryStrong,
}

impl StrengthTier {
    pub fn from_percentile(percentile: f64) -> Self {
        if percentile >= 80.0 {
            StrengthTier::VeryStrong
        } else if percentile >= 60.0 {
            StrengthTier::Strong
        } else if percentile >= 40.0 {
            StrengthTier::Average
        } else if percentile >= 20.0 {
            StrengthTier::Weak
        } else {
            StrengthTier::VeryWeak
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStrength {
    pub value: f64,
    pub league_mean: f64,
    /// Oriented: positive is good.
    pub zscore: f64,
    /// Rough percentile from the z-score, `(z + 3) / 6` clamped to [0, 100].
    pub percentile: f64,
    pub tier: StrengthTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStrength {
    pub team_id: String,
    pub categories: BTreeMap<String, CategoryStrength>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

/// Compare every team's category totals with the league's team totals.
///
/// Spread is the population deviation across teams.
pub fn league_strength(teams: &[TeamSnapshot], config: &EngineConfig) -> Vec<TeamStrength> {
    let mut reports: Vec<TeamStrength> = teams
        .iter()
        .map(|t| TeamStrength {
            team_id: t.team_id.clone(),
            categories: BTreeMap::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
        })
        .collect();
    if teams.is_empty() {
        return reports;
    }

    for cat in &config.categories {
        let values: Vec<f64> = teams
            .iter()
            .map(|t| t.totals.value(&cat.name).unwrap_or(0.0))
            .collect();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let stdev = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

        for (report, &value) in reports.iter_mut().zip(&values) {
            let zscore = if stdev > 0.0 {
                cat.direction() * (value - mean) / stdev
            } else {
                0.0
            };
            let percentile = ((zscore + 3.0) / 6.0).clamp(0.0, 1.0) * 100.0;
            let tier = StrengthTier::from_percentile(percentile);
            match tier {
                StrengthTier::Strong | StrengthTier::VeryStrong => {
                    report.strengths.push(cat.name.clone())
                }
                StrengthTier::Weak | StrengthTier::VeryWeak => {
                    report.weaknesses.push(cat.name.clone())
                }
                StrengthTier::Average => {}
            }
            report.categories.insert(
                cat.name.clone(),
                CategoryStrength {
                    value,
                    league_mean: mean,
                    zscore,
                    percentile,
                    tier,
                },
            );
        }
    }

    reports
}
