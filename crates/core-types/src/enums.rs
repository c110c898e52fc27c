use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The reference price an ROI percentage is expressed against.
///
/// The tracker has computed ROI against both averages at different points in its
/// history. `BuyAverage` is the canonical basis; `SellAverage` is kept so that the
/// other reading stays reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoiBasis {
    #[default]
    BuyAverage,
    SellAverage,
}

impl RoiBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoiBasis::BuyAverage => "buy_average",
            RoiBasis::SellAverage => "sell_average",
        }
    }
}

impl fmt::Display for RoiBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoiBasis {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "buy_average" => Ok(RoiBasis::BuyAverage),
            "sell" | "sell_average" => Ok(RoiBasis::SellAverage),
            other => Err(CoreError::InvalidInput(
                "roi_basis".to_string(),
                format!("expected 'buy_average' or 'sell_average', got '{}'", other),
            )),
        }
    }
}
