use serde::Serialize;

/// Mean and population standard deviation of one gene's dropout-masked values.
/// `None` marks an undefined statistic.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeneStat {
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

impl GeneStat {
    pub fn undefined() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    pub fn variance(&self) -> Option<f64> {
        self.std.map(|s| s * s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    ZeroRowMaximum,
    AllDropout,
}

impl UndefinedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UndefinedReason::ZeroRowMaximum => "zero_row_maximum",
            UndefinedReason::AllDropout => "all_dropout",
        }
    }
}

/// A gene whose mean/std could not be computed at one time point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndefinedStatistic {
    pub time_point: String,
    pub gene: String,
    pub reason: UndefinedReason,
}
