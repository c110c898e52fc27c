use core_types::{ItemSnapshot, RoiBasis};
use rust_decimal::Decimal;

/// A stateless calculator for deriving trading metrics from item snapshots.
///
/// The only configuration is the ROI basis; every call is independent.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsEngine {
    basis: RoiBasis,
}

impl MetricsEngine {
    pub fn new(basis: RoiBasis) -> Self {
        Self { basis }
    }

    pub fn basis(&self) -> RoiBasis {
        self.basis
    }

    /// Price spread between the buy and sell averages. See [`margin`].
    pub fn margin(&self, snapshot: &ItemSnapshot) -> Decimal {
        margin(snapshot)
    }

    /// Margin as a percentage of this engine's reference price. See [`roi`].
    pub fn roi(&self, snapshot: &ItemSnapshot) -> Decimal {
        roi(snapshot, self.basis)
    }
}

/// Buy average minus sell average.
///
/// Returns zero when either average is missing, since a spread against a price
/// nobody traded at carries no signal.
pub fn margin(snapshot: &ItemSnapshot) -> Decimal {
    match (snapshot.buy_price(), snapshot.sell_price()) {
        (Some(buy), Some(sell)) => buy - sell,
        _ => Decimal::ZERO,
    }
}

/// Margin as a percentage of the average selected by `basis`.
///
/// Returns zero when the reference price is zero or the quotient cannot be
/// represented.
pub fn roi(snapshot: &ItemSnapshot, basis: RoiBasis) -> Decimal {
    let denominator = match basis {
        RoiBasis::BuyAverage => snapshot.buy_average,
        RoiBasis::SellAverage => snapshot.sell_average,
    };
    if denominator.is_zero() {
        return Decimal::ZERO;
    }

    margin(snapshot)
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(buy: Decimal, sell: Decimal) -> ItemSnapshot {
        ItemSnapshot {
            id: 2,
            name: "Cannonball".to_string(),
            buy_average: buy,
            sell_average: sell,
            overall_average: (buy + sell) / dec!(2),
            buy_quantity: 401_412,
            sell_quantity: 762_568,
            overall_quantity: 1_163_980,
            members: true,
            sp: dec!(5),
        }
    }

    #[test]
    fn margin_is_buy_minus_sell() {
        assert_eq!(margin(&snapshot(dec!(160), dec!(159))), dec!(1));
        assert_eq!(margin(&snapshot(dec!(150), dec!(155))), dec!(-5));
    }

    #[test]
    fn margin_is_zero_when_either_average_is_missing() {
        assert_eq!(margin(&snapshot(dec!(0), dec!(159))), Decimal::ZERO);
        assert_eq!(margin(&snapshot(dec!(160), dec!(0))), Decimal::ZERO);
    }

    #[test]
    fn roi_against_buy_average() {
        let s = snapshot(dec!(160), dec!(159));
        assert_eq!(roi(&s, RoiBasis::BuyAverage), dec!(0.625));
    }

    #[test]
    fn roi_against_sell_average() {
        let s = snapshot(dec!(160), dec!(159));
        assert_eq!(roi(&s, RoiBasis::SellAverage).round_dp(3), dec!(0.629));
    }

    #[test]
    fn roi_is_zero_when_denominator_is_zero_regardless_of_margin() {
        assert_eq!(roi(&snapshot(dec!(0), dec!(159)), RoiBasis::BuyAverage), Decimal::ZERO);
        assert_eq!(roi(&snapshot(dec!(160), dec!(0)), RoiBasis::SellAverage), Decimal::ZERO);
    }

    #[test]
    fn engine_uses_its_configured_basis() {
        let s = snapshot(dec!(200), dec!(100));
        assert_eq!(MetricsEngine::default().roi(&s), dec!(50));
        assert_eq!(MetricsEngine::new(RoiBasis::SellAverage).roi(&s), dec!(100));
        assert_eq!(MetricsEngine::default().margin(&s), dec!(100));
    }

    #[test]
    fn repeated_calls_do_not_influence_each_other() {
        let engine = MetricsEngine::default();
        let profitable = snapshot(dec!(200), dec!(100));
        let missing = snapshot(dec!(0), dec!(100));

        assert_eq!(engine.roi(&profitable), dec!(50));
        assert_eq!(engine.roi(&missing), Decimal::ZERO);
        assert_eq!(engine.roi(&profitable), dec!(50));
    }
}
