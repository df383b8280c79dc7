//! 256-bit unsigned integer backing the reward-per-share accumulator
//!
//! Only the operations the accumulator needs: widening multiply, addition,
//! multiplication by a `u128` and long division by a `u128`.

use borsh::{BorshDeserialize, BorshSerialize};
use std::cmp::Ordering;

const LOW_MASK: u128 = u64::MAX as u128;

/// 256-bit unsigned integer represented as two u128 values
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U256 {
    /// High 128 bits
    pub hi: u128,
    /// Low 128 bits
    pub lo: u128,
}

impl U256 {
    pub const ZERO: Self = Self { hi: 0, lo: 0 };

    pub const MAX: Self = Self { hi: u128::MAX, lo: u128::MAX };

    pub const fn from_u128(val: u128) -> Self {
        Self { hi: 0, lo: val }
    }

    pub const fn new(hi: u128, lo: u128) -> Self {
        Self { hi, lo }
    }

    pub fn is_zero(&self) -> bool {
        self.hi == 0 && self.lo == 0
    }

    /// Full product of two u128 values, computed on 64-bit limbs
    pub fn widening_mul(a: u128, b: u128) -> Self {
        let (a0, a1) = (a & LOW_MASK, a >> 64);
        let (b0, b1) = (b & LOW_MASK, b >> 64);

        let p00 = a0 * b0;
        let p01 = a0 * b1;
        let p10 = a1 * b0;
        let p11 = a1 * b1;

        // Sum of everything landing on bits 64..128, plus its carry into hi
        let mid = (p00 >> 64) + (p01 & LOW_MASK) + (p10 & LOW_MASK);

        let lo = (p00 & LOW_MASK) | (mid << 64);
        let hi = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);

        Self { hi, lo }
    }

    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let (lo, carry) = self.lo.overflowing_add(other.lo);
        let hi = self.hi.checked_add(other.hi)?.checked_add(carry as u128)?;
        Some(Self { hi, lo })
    }

    pub fn checked_mul_u128(&self, rhs: u128) -> Option<Self> {
        let low = Self::widening_mul(self.lo, rhs);
        let high = Self::widening_mul(self.hi, rhs);
        if high.hi != 0 {
            return None;
        }
        let hi = low.hi.checked_add(high.lo)?;
        Some(Self { hi, lo: low.lo })
    }

    /// Floor division by a u128, returning quotient and remainder
    pub fn checked_div_rem(&self, divisor: u128) -> Option<(Self, u128)> {
        if divisor == 0 {
            return None;
        }
        if self.hi == 0 {
            return Some((Self::from_u128(self.lo / divisor), self.lo % divisor));
        }

        let mut quotient = Self::ZERO;
        let mut remainder: u128 = 0;
        for index in (0..256u32).rev() {
            // remainder < divisor, so a carried-out top bit means the shifted
            // value exceeds the divisor and the wrapped subtraction is exact
            let carry = remainder >> 127;
            remainder = (remainder << 1) | self.bit(index);
            if carry == 1 || remainder >= divisor {
                remainder = remainder.wrapping_sub(divisor);
                quotient.set_bit(index);
            }
        }

        Some((quotient, remainder))
    }

    pub fn checked_div_u128(&self, divisor: u128) -> Option<Self> {
        self.checked_div_rem(divisor).map(|(quotient, _)| quotient)
    }

    /// Narrow to u128, `None` if the high half is set
    pub fn to_u128(&self) -> Option<u128> {
        if self.hi == 0 {
            Some(self.lo)
        } else {
            None
        }
    }

    fn bit(&self, index: u32) -> u128 {
        if index >= 128 {
            (self.hi >> (index - 128)) & 1
        } else {
            (self.lo >> index) & 1
        }
    }

    fn set_bit(&mut self, index: u32) {
        if index >= 128 {
            self.hi |= 1u128 << (index - 128);
        } else {
            self.lo |= 1u128 << index;
        }
    }
}

impl From<u128> for U256 {
    fn from(val: u128) -> Self {
        Self::from_u128(val)
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hi.cmp(&other.hi).then(self.lo.cmp(&other.lo))
    }
}
