use serde::Serialize;

/// Number of rows kept by the hub ranking and, per zone, by the zone ranking.
pub const DEFAULT_TOP_N: usize = 20;

/// How a day's impact value treats records with a missing GPS or manual distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ImpactNullPolicy {
    /// Leave the record out of both the sum and the count.
    #[default]
    Exclude,
    /// Any missing operand makes the whole day's value unknown.
    Poison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    pub top_n: usize,
    pub impact_policy: ImpactNullPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            impact_policy: ImpactNullPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_impact_policy(mut self, policy: ImpactNullPolicy) -> Self {
        self.impact_policy = policy;
        self
    }
}
