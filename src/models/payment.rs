use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Способы оплаты. Само списание делает внешний сервис.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "card")]
    Card,
    #[serde(rename = "paypal")]
    PayPal,
    #[serde(rename = "googlepay")]
    GooglePay,
    #[serde(rename = "applepay")]
    ApplePay,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Card,
        PaymentMethod::PayPal,
        PaymentMethod::GooglePay,
        PaymentMethod::ApplePay,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::PayPal => "paypal",
            PaymentMethod::GooglePay => "googlepay",
            PaymentMethod::ApplePay => "applepay",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PaymentMethod::Card => "Credit/Debit Card",
            PaymentMethod::PayPal => "PayPal",
            PaymentMethod::GooglePay => "Google Pay",
            PaymentMethod::ApplePay => "Apple Pay",
        }
    }

    /// Нужна ли форма с данными карты.
    pub fn needs_card_details(self) -> bool {
        self == PaymentMethod::Card
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown payment method '{}', expected one of: card, paypal, googlepay, applepay", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ids_round_trip() {
        for method in PaymentMethod::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.id()));
            assert_eq!(method.id().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }
}
