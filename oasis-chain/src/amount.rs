//! Strongly-typed satoshi amounts that prevent under/overflows.
//!
//! The [`Amount`] type is parameterized by a [`Constraint`] implementation
//! that declares the range of allowed values. In contrast to regular
//! arithmetic operations, which return values, arithmetic on [`Amount`]s
//! returns [`Result`](std::result::Result)s.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    ops::RangeInclusive,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The result of an amount operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One coin, in satoshis.
pub const COIN: i64 = 100_000_000;

/// One hundredth of a coin, in satoshis.
pub const CENT: i64 = 1_000_000;

/// An absolute upper bound on any oasis amount, in satoshis.
///
/// # Consensus
///
/// This is a serialization sanity bound, chosen above every network's
/// outstanding-supply cap. The per-network cap is
/// `NetworkParameters::max_money_out`, and monetary rules must check against
/// that, not against this constant.
pub const MAX_MONEY: i64 = 100_000_000 * COIN;

/// A runtime validated type for representing amounts of satoshis.
#[derive(Clone, Copy, Serialize, Deserialize, Default)]
#[serde(try_from = "i64")]
#[serde(into = "i64")]
#[serde(bound = "C: Constraint + Clone")]
pub struct Amount<C = NegativeAllowed>(
    /// The inner amount value.
    i64,
    /// Used for [`Constraint`] type inference.
    #[serde(skip)]
    PhantomData<C>,
);

impl<C> fmt::Display for Amount<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sats = self.satoshis();

        f.pad_integral(sats >= 0, "", &sats.to_string())
    }
}

impl<C> fmt::Debug for Amount<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(&format!("Amount<{}>", std::any::type_name::<C>()))
            .field(&self.0)
            .finish()
    }
}

impl<C> Amount<C> {
    /// Convert this amount to a different Amount type if it satisfies the new
    /// constraint.
    pub fn constrain<C2>(self) -> Result<Amount<C2>>
    where
        C2: Constraint,
    {
        self.0.try_into()
    }

    /// Returns the number of satoshis in this amount.
    pub fn satoshis(&self) -> i64 {
        self.0
    }

    /// Create a zero `Amount`.
    pub fn zero() -> Amount<C>
    where
        C: Constraint,
    {
        0.try_into().expect("an amount of 0 is always valid")
    }
}

impl Amount<NonNegative> {
    /// Create a new non-negative [`Amount`] from a provided whole-coin value.
    ///
    /// # Panics
    ///
    /// If the value is outside the valid amount range. Only use this for
    /// hard-coded constants.
    pub fn new_from_coins(coins: i64) -> Self {
        let sats = coins
            .checked_mul(COIN)
            .expect("hard-coded coin value fits in an i64");
        sats.try_into()
            .expect("hard-coded coin value is a valid amount")
    }
}

impl<C> std::ops::Add<Amount<C>> for Amount<C>
where
    C: Constraint,
{
    type Output = Result<Amount<C>>;

    fn add(self, rhs: Amount<C>) -> Self::Output {
        let value = self
            .0
            .checked_add(rhs.0)
            .expect("adding two constrained Amounts is always within an i64");
        value.try_into()
    }
}

impl<C> std::ops::Add<Amount<C>> for Result<Amount<C>>
where
    C: Constraint,
{
    type Output = Result<Amount<C>>;

    fn add(self, rhs: Amount<C>) -> Self::Output {
        self? + rhs
    }
}

impl<C> std::ops::Sub<Amount<C>> for Amount<C>
where
    C: Constraint,
{
    type Output = Result<Amount<C>>;

    fn sub(self, rhs: Amount<C>) -> Self::Output {
        let value = self
            .0
            .checked_sub(rhs.0)
            .expect("subtracting two constrained Amounts is always within an i64");
        value.try_into()
    }
}

impl<C> std::ops::Sub<Amount<C>> for Result<Amount<C>>
where
    C: Constraint,
{
    type Output = Result<Amount<C>>;

    fn sub(self, rhs: Amount<C>) -> Self::Output {
        self? - rhs
    }
}

impl<C> PartialEq for Amount<C> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<C> Eq for Amount<C> {}

impl<C> PartialOrd for Amount<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Amount<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<C> Hash for Amount<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<C> From<Amount<C>> for i64 {
    fn from(amount: Amount<C>) -> Self {
        amount.0
    }
}

impl<C> TryFrom<i64> for Amount<C>
where
    C: Constraint,
{
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        C::validate(value).map(|v| Self(v, PhantomData))
    }
}

/// An error in the range of an [`Amount`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("amount {value} is outside the valid range {range:?}")]
pub struct Error {
    value: i64,
    range: RangeInclusive<i64>,
}

/// Marker type for `Amount` that allows negative values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct NegativeAllowed;

impl Constraint for NegativeAllowed {
    fn valid_range() -> RangeInclusive<i64> {
        -MAX_MONEY..=MAX_MONEY
    }
}

/// Marker type for `Amount` that requires nonnegative values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct NonNegative;

impl Constraint for NonNegative {
    fn valid_range() -> RangeInclusive<i64> {
        0..=MAX_MONEY
    }
}

/// The constraint applied to amount values.
pub trait Constraint {
    /// The range of values that are valid under this constraint.
    fn valid_range() -> RangeInclusive<i64>;

    /// Check if an input value is within the valid range.
    fn validate(value: i64) -> Result<i64, Error> {
        let range = Self::valid_range();

        if !range.contains(&value) {
            Err(Error { value, range })
        } else {
            Ok(value)
        }
    }
}
