use std::fmt;

use serde::Serialize;

use crate::individual::{Stage, StageCounts};

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub ticks: u64,
    pub initial: StageCounts,
    #[serde(rename = "final")]
    pub final_counts: StageCounts,
    pub deaths: StageCounts,
    pub regulated_deaths: u64,
    pub natural_deaths: u64,
    pub total_eggs: u64,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario '{}' ran for {} hours", self.scenario, self.ticks)?;
        writeln!(f, "{:<8}{:>10}{:>10}{:>10}", "stage", "initial", "final", "deaths")?;
        for stage in Stage::ALL {
            writeln!(
                f,
                "{:<8}{:>10}{:>10}{:>10}",
                stage.to_string(),
                self.initial[stage],
                self.final_counts[stage],
                self.deaths[stage]
            )?;
        }
        writeln!(
            f,
            "deaths: {} natural, {} regulated",
            self.natural_deaths, self.regulated_deaths
        )?;
        write!(f, "eggs laid: {}", self.total_eggs)
    }
}
