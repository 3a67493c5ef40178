//! The fixed set of zerocoin denominations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::amount::{Amount, NonNegative, COIN};

/// A zerocoin denomination.
///
/// Coins can only be minted and spent in these eight fixed sizes; anything
/// else is not a zerocoin.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Denomination {
    /// A one coin denomination.
    One,
    /// A five coin denomination.
    Five,
    /// A ten coin denomination.
    Ten,
    /// A fifty coin denomination.
    Fifty,
    /// A one hundred coin denomination.
    OneHundred,
    /// A five hundred coin denomination.
    FiveHundred,
    /// A one thousand coin denomination.
    OneThousand,
    /// A five thousand coin denomination.
    FiveThousand,
}

impl Denomination {
    /// Every denomination, in ascending value order.
    pub const ALL: [Denomination; 8] = [
        Denomination::One,
        Denomination::Five,
        Denomination::Ten,
        Denomination::Fifty,
        Denomination::OneHundred,
        Denomination::FiveHundred,
        Denomination::OneThousand,
        Denomination::FiveThousand,
    ];

    /// The face value of this denomination, in whole coins.
    pub fn coins(&self) -> u64 {
        match self {
            Denomination::One => 1,
            Denomination::Five => 5,
            Denomination::Ten => 10,
            Denomination::Fifty => 50,
            Denomination::OneHundred => 100,
            Denomination::FiveHundred => 500,
            Denomination::OneThousand => 1_000,
            Denomination::FiveThousand => 5_000,
        }
    }

    /// The face value of this denomination, in satoshis.
    pub fn amount(&self) -> Amount<NonNegative> {
        Amount::new_from_coins(self.coins() as i64)
    }

    /// Look up the denomination with the given whole-coin face value.
    pub fn from_coins(coins: u64) -> Option<Denomination> {
        Denomination::ALL
            .into_iter()
            .find(|denomination| denomination.coins() == coins)
    }

    /// Look up the denomination whose face value is exactly `amount`.
    ///
    /// Mint outputs carry their denomination as the output value, so any
    /// output value that is not exactly a denomination is not a mint.
    pub fn from_amount(amount: Amount<NonNegative>) -> Option<Denomination> {
        let satoshis = amount.satoshis();
        if satoshis % COIN != 0 {
            return None;
        }
        Denomination::from_coins((satoshis / COIN) as u64)
    }

    /// A short static name, used as a metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            Denomination::One => "1",
            Denomination::Five => "5",
            Denomination::Ten => "10",
            Denomination::Fifty => "50",
            Denomination::OneHundred => "100",
            Denomination::FiveHundred => "500",
            Denomination::OneThousand => "1000",
            Denomination::FiveThousand => "5000",
        }
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
