//! Payment-processor order record.

use serde::{Deserialize, Serialize};

/// An order created and paid against a single quantity-1 line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Integer minor-unit amount (cents).
    pub amount: i64,
    pub currency: String,
    /// Creation time, unix seconds.
    pub created: i64,
}

impl Order {
    /// Amount as a decimal string in major units, two fixed decimals:
    /// 4250 minor units render as "42.50".
    pub fn amount_decimal(&self) -> String {
        format_minor_units(self.amount)
    }
}

/// Minor-unit integer to fixed two-decimal major-unit text.
pub fn format_minor_units(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_amount_decimal() {
        let order = Order {
            id: "or_1".into(),
            amount: 4250,
            currency: "usd".into(),
            created: 0,
        };
        assert_eq!(order.amount_decimal(), "42.50");
        assert_eq!(format_minor_units(0), "0.00");
        assert_eq!(format_minor_units(5), "0.05");
        assert_eq!(format_minor_units(100), "1.00");
        assert_eq!(format_minor_units(999), "9.99");
    }

    proptest! {
        #[test]
        fn prop_amount_has_two_decimals_and_round_trips(amount in 0i64..1_000_000_000_000) {
            let text = format_minor_units(amount);
            let (major, minor) = text.split_once('.').expect("decimal point");
            prop_assert_eq!(minor.len(), 2);
            let reassembled = major.parse::<i64>().unwrap() * 100 + minor.parse::<i64>().unwrap();
            prop_assert_eq!(reassembled, amount);
        }
    }
}
