use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, program_error::ProgramError};

use crate::error::StakingMiningError;

/// Funded emission period `[start_timestamp, end_timestamp]`.
///
/// The end only ever moves forward: it is recomputed from the cumulative
/// funded total on every funding, `start + total_funded / rate`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmissionWindow {
    pub reward_rate_per_second: u64,
    pub start_timestamp: UnixTimestamp,
    pub end_timestamp: UnixTimestamp,   // start until the first funding
    pub total_funded_rewards: u64,
}

impl EmissionWindow {
    pub const LEN: usize = 8 + 8 + 8 + 8;

    pub fn new(
        reward_rate_per_second: u64,
        start_timestamp: UnixTimestamp,
    ) -> Result<Self, ProgramError> {
        if reward_rate_per_second == 0 {
            return Err(StakingMiningError::InvalidRewardRate.into());
        }

        Ok(Self {
            reward_rate_per_second,
            start_timestamp,
            end_timestamp: start_timestamp,
            total_funded_rewards: 0,
        })
    }

    /// Clamp a timestamp into the window
    pub fn clamp(&self, timestamp: UnixTimestamp) -> UnixTimestamp {
        timestamp.max(self.start_timestamp).min(self.end_timestamp)
    }

    /// Seconds of `(from, to]` that fall inside the window
    pub fn eligible_elapsed(&self, from: UnixTimestamp, to: UnixTimestamp) -> u64 {
        let elapsed = self.clamp(to).saturating_sub(self.clamp(from));
        elapsed.max(0) as u64
    }

    /// Funding is refused once `now` has passed the end of the window
    pub fn is_closed(&self, now: UnixTimestamp) -> bool {
        now > self.end_timestamp
    }

    /// Add `amount` to the funded total and return the new end timestamp
    pub fn record_funding(&mut self, amount: u64) -> Result<UnixTimestamp, ProgramError> {
        let total = self
            .total_funded_rewards
            .checked_add(amount)
            .ok_or(StakingMiningError::ArithmeticOverflow)?;

        // Floor: any remainder below one second of emission is never emitted
        let duration = total / self.reward_rate_per_second;
        let duration =
            i64::try_from(duration).map_err(|_| StakingMiningError::ArithmeticOverflow)?;
        let end = self
            .start_timestamp
            .checked_add(duration)
            .ok_or(StakingMiningError::ArithmeticOverflow)?;

        self.total_funded_rewards = total;
        self.end_timestamp = end;
        Ok(end)
    }

    /// Reward emitted by the whole farm up to `now`
    pub fn emitted_until(&self, now: UnixTimestamp) -> u128 {
        let elapsed = self.eligible_elapsed(self.start_timestamp, now);
        elapsed as u128 * self.reward_rate_per_second as u128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded_window() -> EmissionWindow {
        // rate 10/s from t=1000, funded 3600 => ends at t=1360
        let mut window = EmissionWindow::new(10, 1_000).unwrap();
        window.record_funding(3_600).unwrap();
        window
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert_eq!(
            EmissionWindow::new(0, 1_000),
            Err(StakingMiningError::InvalidRewardRate.into())
        );
    }

    #[test]
    fn test_unfunded_window_is_empty() {
        let window = EmissionWindow::new(10, 1_000).unwrap();
        assert_eq!(window.end_timestamp, 1_000);
        assert_eq!(window.eligible_elapsed(0, 5_000), 0);
        assert!(!window.is_closed(1_000));
        assert!(window.is_closed(1_001));
    }

    #[test]
    fn test_funding_extends_end() {
        let mut window = funded_window();
        assert_eq!(window.end_timestamp, 1_360);

        // Remainder below one second of emission is floored away
        let end = window.record_funding(15).unwrap();
        assert_eq!(end, 1_361);
        assert_eq!(window.total_funded_rewards, 3_615);

        let end = window.record_funding(5).unwrap();
        assert_eq!(end, 1_362);
    }

    #[test]
    fn test_clamp() {
        let window = funded_window();
        assert_eq!(window.clamp(500), 1_000);
        assert_eq!(window.clamp(1_200), 1_200);
        assert_eq!(window.clamp(9_999), 1_360);
    }

    #[test]
    fn test_eligible_elapsed() {
        let window = funded_window();

        // Entirely before the window
        assert_eq!(window.eligible_elapsed(0, 999), 0);
        // Straddling the start
        assert_eq!(window.eligible_elapsed(900, 1_100), 100);
        // Inside
        assert_eq!(window.eligible_elapsed(1_100, 1_200), 100);
        // Straddling the end
        assert_eq!(window.eligible_elapsed(1_300, 2_000), 60);
        // Entirely after the window
        assert_eq!(window.eligible_elapsed(1_400, 2_000), 0);
        // Reversed interval
        assert_eq!(window.eligible_elapsed(1_200, 1_100), 0);
    }

    #[test]
    fn test_emitted_until() {
        let window = funded_window();
        assert_eq!(window.emitted_until(999), 0);
        assert_eq!(window.emitted_until(1_100), 1_000);
        assert_eq!(window.emitted_until(5_000), 3_600);
    }

    #[test]
    fn test_funding_overflow() {
        let mut window = EmissionWindow::new(1, 0).unwrap();
        window.record_funding(u64::MAX).unwrap_err();
        assert_eq!(window.total_funded_rewards, 0);

        let mut window = EmissionWindow::new(1, 0).unwrap();
        window.record_funding(u64::MAX - 1).unwrap_err();
        window.record_funding(10).unwrap();
        assert!(window.record_funding(u64::MAX).is_err());
        assert_eq!(window.total_funded_rewards, 10);
    }
}
