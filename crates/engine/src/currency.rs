use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// ISO currency code a user picks to display amounts in.
///
/// Stored amounts are always kept in the canonical currency ([`Currency::Eur`]);
/// the preference only affects presentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Chf,
    Pln,
    Czk,
    Sek,
    Nok,
    Dkk,
    Huf,
}

impl Currency {
    /// Every supported currency, in the order they are offered to users.
    pub const ALL: [Currency; 10] = [
        Currency::Eur,
        Currency::Usd,
        Currency::Gbp,
        Currency::Chf,
        Currency::Pln,
        Currency::Czk,
        Currency::Sek,
        Currency::Nok,
        Currency::Dkk,
        Currency::Huf,
    ];

    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Chf => "CHF",
            Currency::Pln => "PLN",
            Currency::Czk => "CZK",
            Currency::Sek => "SEK",
            Currency::Nok => "NOK",
            Currency::Dkk => "DKK",
            Currency::Huf => "HUF",
        }
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|c| c.code())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = ValidationError;

    /// Codes are matched exactly; `"eur"` is not accepted.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == value)
            .ok_or_else(|| {
                ValidationError::new(
                    "currency",
                    format!("Currency must be one of: {}", Self::supported_list()),
                )
            })
    }
}
