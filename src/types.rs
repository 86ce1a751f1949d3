use crate::error::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one of the two computing parties.
///
/// [`Party0`] is the coordinator: it accepts the connection, generates sub task ids
/// and leads every header exchange.
///
/// [`Party0`]: Id::Party0
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Id {
    Party0,
    Party1,
}

impl Id {
    /// The id of the other party.
    pub fn peer(self) -> Id {
        match self {
            Id::Party0 => Id::Party1,
            Id::Party1 => Id::Party0,
        }
    }
}

impl TryFrom<u32> for Id {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Id::Party0),
            1 => Ok(Id::Party1),
            id => Err(Error::InvalidPartyId(id)),
        }
    }
}

impl From<Id> for u32 {
    fn from(value: Id) -> Self {
        match value {
            Id::Party0 => 0,
            Id::Party1 => 1,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "party{}", u32::from(*self))
    }
}

/// [`Share`] represents either a [`Arithmetic`] or [`Binary`] share.
///
/// [`Arithmetic`]: Share::Arithmetic
/// [`Binary`]: Share::Binary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Share {
    Arithmetic(u64),
    Binary(u64),
}

impl From<Share> for u64 {
    fn from(value: Share) -> Self {
        match value {
            Share::Arithmetic(v) => v,
            Share::Binary(v) => v,
        }
    }
}

/// Share `x` with given [`Share`] type.
pub fn x_to_shares(x: Share) -> (Share, Share) {
    let mut rng = rand::thread_rng();
    let share0: u64 = rng.gen();

    match x {
        Share::Arithmetic(x) => {
            let share1 = x.wrapping_sub(share0);
            (Share::Arithmetic(share0), Share::Arithmetic(share1))
        }
        Share::Binary(x) => {
            let share1 = x ^ share0;
            (Share::Binary(share0), Share::Binary(share1))
        }
    }
}

/// Reconstruct `x` from given [`Share`]s.
pub fn shares_to_x(shares: (Share, Share)) -> Result<u64> {
    match shares {
        (Share::Arithmetic(share0), Share::Arithmetic(share1)) => Ok(share0.wrapping_add(share1)),
        (Share::Binary(share0), Share::Binary(share1)) => Ok(share0 ^ share1),
        _ => Err(Error::DifferentShareTypes),
    }
}
