//! Claim eligibility.
//!
//! An account may claim at most `min(kid_count, pup_count)` comics across all
//! of its orders. Missing holder rows count as zero.

use crate::Balances;

/// Rejection message returned to callers whose order would exceed the limit.
pub const INELIGIBLE_MESSAGE: &str = "Sorry, you're not eligible to order that many comics.";

/// An order that would push the account past its eligible count.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("requested {requested} with {existing} already ordered exceeds eligible count {eligible}")]
pub struct Ineligible {
    pub requested: i64,
    pub existing: i64,
    pub eligible: i64,
}

/// Snapshot of everything the eligibility rule looks at for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    /// Sum of the counts of all existing orders.
    pub existing: i64,
    /// `min(kid_count, pup_count)` with absent counts treated as zero.
    pub eligible: i64,
}

impl Eligibility {
    /// Build a snapshot from holder balances and the existing order total.
    #[must_use]
    pub fn new(balances: Balances, existing: i64) -> Self {
        let kid = i64::from(balances.kid_count.unwrap_or(0));
        let pup = i64::from(balances.pup_count.unwrap_or(0));

        Self {
            existing,
            eligible: kid.min(pup),
        }
    }

    /// Check whether `requested` more units fit under the limit.
    ///
    /// # Errors
    ///
    /// Returns [`Ineligible`] if `requested + existing > eligible`.
    pub fn check(&self, requested: i32) -> Result<(), Ineligible> {
        let requested = i64::from(requested);
        if requested.saturating_add(self.existing) > self.eligible {
            return Err(Ineligible {
                requested,
                existing: self.existing,
                eligible: self.eligible,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balances(kid: Option<i32>, pup: Option<i32>) -> Balances {
        Balances {
            kid_count: kid,
            pup_count: pup,
        }
    }

    #[test]
    fn test_eligible_is_min_of_holder_counts() {
        assert_eq!(Eligibility::new(balances(Some(5), Some(3)), 0).eligible, 3);
        assert_eq!(Eligibility::new(balances(Some(2), Some(9)), 0).eligible, 2);
    }

    #[test]
    fn test_missing_holder_counts_as_zero() {
        assert_eq!(Eligibility::new(balances(None, Some(3)), 0).eligible, 0);
        assert_eq!(Eligibility::new(balances(Some(3), None), 0).eligible, 0);
        assert_eq!(Eligibility::new(Balances::default(), 0).eligible, 0);
    }

    #[test]
    fn test_check_allows_exactly_the_limit() {
        let eligibility = Eligibility::new(balances(Some(5), Some(3)), 1);
        assert!(eligibility.check(2).is_ok());
    }

    #[test]
    fn test_check_rejects_one_over_the_limit() {
        let eligibility = Eligibility::new(balances(Some(5), Some(3)), 3);
        assert_eq!(
            eligibility.check(1),
            Err(Ineligible {
                requested: 1,
                existing: 3,
                eligible: 3,
            })
        );
    }

    #[test]
    fn test_check_does_not_overflow_on_large_counts() {
        let eligibility =
            Eligibility::new(balances(Some(i32::MAX), Some(i32::MAX)), i64::from(i32::MAX));
        assert!(eligibility.check(i32::MAX).is_err());
    }

    #[test]
    fn test_ineligible_display() {
        let err = Ineligible {
            requested: 2,
            existing: 3,
            eligible: 4,
        };
        assert_eq!(
            err.to_string(),
            "requested 2 with 3 already ordered exceeds eligible count 4"
        );
    }
}
