use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;

use crate::models::{PriceTable, SeatCategory};

/// Расчёт суммы заказа. Внутри - полная точность, округление только при выводе.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub price_per_seat: Decimal,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

impl PriceBreakdown {
    pub fn has_discount(&self) -> bool {
        self.discount_amount > Decimal::ZERO
    }
}

pub fn price_per_seat(prices: &PriceTable, category: SeatCategory) -> Decimal {
    match category {
        SeatCategory::Premium => prices.premium,
        SeatCategory::Standard => prices.standard,
    }
}

/// subtotal = seats * price, discount = subtotal * percent / 100, total = subtotal - discount.
pub fn price(seats: usize, prices: &PriceTable, category: SeatCategory, discount_percent: Decimal) -> PriceBreakdown {
    let per_seat = price_per_seat(prices, category);
    let subtotal = Decimal::from(seats as u64) * per_seat;
    let discount_amount = subtotal * discount_percent / Decimal::ONE_HUNDRED;
    PriceBreakdown {
        price_per_seat: per_seat,
        subtotal,
        discount_amount,
        total: subtotal - discount_amount,
    }
}

/// Денежная сумма для показа пользователю: "$18.00".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money(pub Decimal);

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "${:.2}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn prices() -> PriceTable {
        PriceTable { standard: Decimal::from(10), premium: Decimal::from(15) }
    }

    #[test]
    fn two_standard_seats_without_promo() {
        let p = price(2, &prices(), SeatCategory::Standard, Decimal::ZERO);
        assert_eq!(p.subtotal, Decimal::from(20));
        assert!(!p.has_discount());
        assert_eq!(Money(p.total).to_string(), "$20.00");
    }

    #[test]
    fn ten_percent_promo() {
        let p = price(2, &prices(), SeatCategory::Standard, Decimal::from(10));
        assert_eq!(p.discount_amount, Decimal::from(2));
        assert_eq!(Money(p.total).to_string(), "$18.00");
    }

    #[test]
    fn premium_uses_premium_price() {
        let p = price(3, &prices(), SeatCategory::Premium, Decimal::ZERO);
        assert_eq!(p.price_per_seat, Decimal::from(15));
        assert_eq!(p.total, Decimal::from(45));
    }

    #[test]
    fn rounding_happens_only_on_display() {
        // 3 * 9.99 * 0.85 = 25.4745
        let table = PriceTable { standard: Decimal::new(999, 2), premium: Decimal::from(15) };
        let p = price(3, &table, SeatCategory::Standard, Decimal::from(15));
        assert_eq!(p.total, Decimal::new(254745, 4));
        assert_eq!(Money(p.total).to_string(), "$25.47");
    }

    fn cents() -> impl Strategy<Value = Decimal> {
        (0i64..100_000).prop_map(|c| Decimal::new(c, 2))
    }

    fn percent() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000).prop_map(|p| Decimal::new(p, 2))
    }

    proptest! {
        #[test]
        fn total_grows_with_seat_count(
            std_price in cents(),
            prem_price in cents(),
            premium in any::<bool>(),
            discount in percent(),
            seats in 0usize..50,
        ) {
            let table = PriceTable { standard: std_price, premium: prem_price };
            let category = if premium { SeatCategory::Premium } else { SeatCategory::Standard };
            let fewer = price(seats, &table, category, discount);
            let more = price(seats + 1, &table, category, discount);
            prop_assert!(more.total >= fewer.total);
        }

        #[test]
        fn total_shrinks_with_discount(
            std_price in cents(),
            seats in 0usize..50,
            low in percent(),
            high in percent(),
        ) {
            let (low, high) = if low <= high { (low, high) } else { (high, low) };
            let table = PriceTable { standard: std_price, premium: std_price };
            let a = price(seats, &table, SeatCategory::Standard, low);
            let b = price(seats, &table, SeatCategory::Standard, high);
            prop_assert!(b.total <= a.total);
        }
    }
}
