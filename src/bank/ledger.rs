//! # Bank Ledger
//!
//! The bank's global allocation state and the Banker's Algorithm that guards it.
//!
//! [`Ledger`] is plain synchronous data. It is owned by exactly one
//! [`BankActor`](super::BankActor), whose sequential message loop makes every
//! `request`/`release` atomic with respect to every other customer. Keeping the
//! algorithm free of channels and tasks also lets tests drive it directly.

use crate::config::{check_claims, ConfigError};
use crate::model::{CustomerId, ResourceVector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::BankError;

/// Allocation state for every customer and resource type.
#[derive(Debug, Clone)]
pub struct Ledger {
    total: ResourceVector,
    available: ResourceVector,
    allocation: Vec<ResourceVector>,
    maximum: Vec<ResourceVector>,
    // Vector granted for each (customer, transaction index) that has not been released yet
    grants: HashMap<(CustomerId, usize), ResourceVector>,
}

impl Ledger {
    /// Build a ledger with everything available and nothing allocated.
    ///
    /// Each row of `maximum` is one customer's claim and must have one entry per
    /// resource type, none above the total for that type.
    pub fn new(total: ResourceVector, maximum: Vec<ResourceVector>) -> Result<Self, ConfigError> {
        check_claims(&total, &maximum)?;

        Ok(Self {
            available: total.clone(),
            allocation: vec![ResourceVector::zeros(total.len()); maximum.len()],
            total,
            maximum,
            grants: HashMap::new(),
        })
    }

    pub fn resource_types(&self) -> usize {
        self.total.len()
    }

    pub fn customers(&self) -> usize {
        self.maximum.len()
    }

    pub fn total(&self) -> &ResourceVector {
        &self.total
    }

    pub fn available(&self) -> &ResourceVector {
        &self.available
    }

    pub fn allocation(&self, customer: CustomerId) -> Result<&ResourceVector, BankError> {
        let row = self.row(customer)?;
        Ok(&self.allocation[row])
    }

    pub fn maximum(&self, customer: CustomerId) -> Result<&ResourceVector, BankError> {
        let row = self.row(customer)?;
        Ok(&self.maximum[row])
    }

    /// `Maximum - Allocation` for one customer.
    pub fn need(&self, customer: CustomerId) -> Result<ResourceVector, BankError> {
        let row = self.row(customer)?;
        Ok(need_of(&self.maximum[row], &self.allocation[row]))
    }

    /// Number of grants not yet released.
    pub fn outstanding_grants(&self) -> usize {
        self.grants.len()
    }

    /// Ask for `request` on behalf of one transaction.
    ///
    /// Returns `Ok(true)` and commits the allocation if the resulting state is
    /// safe, `Ok(false)` with the state untouched if the units are not
    /// available or granting them could lead to deadlock. Errors are protocol
    /// violations and also leave the state untouched.
    pub fn request(
        &mut self,
        customer: CustomerId,
        index: usize,
        request: &ResourceVector,
    ) -> Result<bool, BankError> {
        self.check_len(request)?;
        let row = self.row(customer)?;

        if self.grants.contains_key(&(customer, index)) {
            return Err(BankError::DuplicateGrant { customer, index });
        }

        let need = need_of(&self.maximum[row], &self.allocation[row]);
        if !request.fits_within(&need) {
            return Err(BankError::ExceedsNeed {
                customer,
                index,
                request: request.clone(),
                need,
            });
        }

        if request.is_zero() {
            self.grants.insert((customer, index), request.clone());
            return Ok(true);
        }

        if !request.fits_within(&self.available) {
            return Ok(false);
        }

        // Tentatively hand the units over, then check the state we would end up in
        self.available.sub_assign(request);
        self.allocation[row].add_assign(request);

        if self.is_safe() {
            self.grants.insert((customer, index), request.clone());
            Ok(true)
        } else {
            self.allocation[row].sub_assign(request);
            self.available.add_assign(request);
            Ok(false)
        }
    }

    /// Return the units granted to one transaction.
    ///
    /// `request` must be exactly the vector granted for `(customer, index)`.
    pub fn release(
        &mut self,
        customer: CustomerId,
        index: usize,
        request: &ResourceVector,
    ) -> Result<(), BankError> {
        self.check_len(request)?;
        let row = self.row(customer)?;

        match self.grants.get(&(customer, index)) {
            Some(granted) if granted == request => {}
            granted => {
                return Err(BankError::ReleaseMismatch {
                    customer,
                    index,
                    expected: granted.cloned(),
                    found: request.clone(),
                })
            }
        }

        self.grants.remove(&(customer, index));
        self.allocation[row].sub_assign(request);
        self.available.add_assign(request);
        Ok(())
    }

    /// An order in which every customer could obtain its remaining need and
    /// finish, or `None` if the current state is unsafe.
    pub fn safe_sequence(&self) -> Option<Vec<CustomerId>> {
        safe_sequence(&self.available, &self.allocation, &self.maximum)
    }

    pub fn is_safe(&self) -> bool {
        self.safe_sequence().is_some()
    }

    /// `Available + sum(Allocation) == Total` for every resource type.
    pub fn is_conserved(&self) -> bool {
        is_conserved(&self.total, &self.available, &self.allocation)
    }

    pub fn snapshot(&self) -> BankSnapshot {
        BankSnapshot {
            total: self.total.clone(),
            available: self.available.clone(),
            allocation: self.allocation.clone(),
            maximum: self.maximum.clone(),
        }
    }

    fn row(&self, customer: CustomerId) -> Result<usize, BankError> {
        if customer.index() < self.maximum.len() {
            Ok(customer.index())
        } else {
            Err(BankError::UnknownCustomer(customer))
        }
    }

    fn check_len(&self, vector: &ResourceVector) -> Result<(), BankError> {
        if vector.len() == self.total.len() {
            Ok(())
        } else {
            Err(BankError::DimensionMismatch {
                expected: self.total.len(),
                found: vector.len(),
            })
        }
    }
}

/// Point-in-time copy of the bank's state, for display and test harnesses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub total: ResourceVector,
    pub available: ResourceVector,
    pub allocation: Vec<ResourceVector>,
    pub maximum: Vec<ResourceVector>,
}

impl BankSnapshot {
    pub fn need(&self, customer: CustomerId) -> Option<ResourceVector> {
        let i = customer.index();
        Some(need_of(self.maximum.get(i)?, self.allocation.get(i)?))
    }

    pub fn is_safe(&self) -> bool {
        safe_sequence(&self.available, &self.allocation, &self.maximum).is_some()
    }

    pub fn is_conserved(&self) -> bool {
        is_conserved(&self.total, &self.available, &self.allocation)
    }

    /// True when no customer holds more than it declared.
    pub fn within_claims(&self) -> bool {
        self.allocation
            .iter()
            .zip(&self.maximum)
            .all(|(held, max)| held.fits_within(max))
    }
}

fn need_of(maximum: &ResourceVector, allocation: &ResourceVector) -> ResourceVector {
    // The ledger never lets allocation pass maximum, so this cannot underflow
    maximum
        .checked_sub(allocation)
        .unwrap_or_else(|| ResourceVector::zeros(maximum.len()))
}

/// The safety scan of the Banker's Algorithm.
///
/// Starting from `available`, repeatedly pick any customer whose remaining need
/// fits in the simulated free units, pretend it runs to completion and returns
/// everything it holds, and continue until either every customer is picked or
/// no further customer fits.
fn safe_sequence(
    available: &ResourceVector,
    allocation: &[ResourceVector],
    maximum: &[ResourceVector],
) -> Option<Vec<CustomerId>> {
    let mut work = available.clone();
    let mut finished = vec![false; allocation.len()];
    let mut order = Vec::with_capacity(allocation.len());

    loop {
        let mut progressed = false;

        for (i, (held, max)) in allocation.iter().zip(maximum).enumerate() {
            if finished[i] {
                continue;
            }
            let fits = max
                .checked_sub(held)
                .is_some_and(|need| need.fits_within(&work));
            if fits {
                work.add_assign(held);
                finished[i] = true;
                order.push(CustomerId(i));
                progressed = true;
            }
        }

        if order.len() == allocation.len() {
            return Some(order);
        }
        if !progressed {
            return None;
        }
    }
}

fn is_conserved(
    total: &ResourceVector,
    available: &ResourceVector,
    allocation: &[ResourceVector],
) -> bool {
    let held = allocation
        .iter()
        .fold(available.clone(), |sum, row| sum.plus(row));
    &held == total
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn v<const N: usize>(units: [u32; N]) -> ResourceVector {
        ResourceVector::from(units)
    }

    fn c(id: usize) -> CustomerId {
        CustomerId(id)
    }

    /// Total [10,5,7], three customers, allocation [[0,1,0],[2,0,0],[3,0,2]].
    fn classic_ledger() -> Ledger {
        let mut ledger = Ledger::new(
            v([10, 5, 7]),
            vec![v([7, 5, 3]), v([3, 2, 2]), v([9, 0, 2])],
        )
        .unwrap();
        assert!(ledger.request(c(0), 0, &v([0, 1, 0])).unwrap());
        assert!(ledger.request(c(1), 0, &v([2, 0, 0])).unwrap());
        assert!(ledger.request(c(2), 0, &v([3, 0, 2])).unwrap());
        assert_eq!(ledger.available(), &v([5, 4, 5]));
        ledger
    }

    #[test]
    fn test_new_rejects_claim_above_total() {
        let err = Ledger::new(v([3, 3]), vec![v([1, 4])]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ClaimExceedsTotal { resource: 1, claim: 4, total: 3, .. }
        ));
    }

    #[test]
    fn test_new_rejects_short_maximum_row() {
        let err = Ledger::new(v([3, 3]), vec![v([1])]).unwrap_err();
        assert!(matches!(err, ConfigError::DimensionMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_single_resource_scenario() {
        let mut ledger = Ledger::new(v([10]), vec![v([5]), v([5]), v([5])]).unwrap();

        assert!(ledger.request(c(0), 0, &v([5])).unwrap());
        assert_eq!(ledger.available(), &v([5]));

        assert!(ledger.request(c(1), 0, &v([5])).unwrap());
        assert_eq!(ledger.available(), &v([0]));

        // Nothing left for a third customer
        assert!(!ledger.request(c(2), 0, &v([5])).unwrap());
        assert_eq!(ledger.available(), &v([0]));

        ledger.release(c(0), 0, &v([5])).unwrap();
        assert_eq!(ledger.available(), &v([5]));

        assert!(ledger.request(c(2), 0, &v([5])).unwrap());
        assert_eq!(ledger.available(), &v([0]));
        assert!(ledger.is_conserved());
    }

    #[test]
    fn test_classic_request_beyond_need_is_rejected_unchanged() {
        let mut ledger = classic_ledger();
        let before = ledger.snapshot();

        // customer_2 already holds [3,0,2] of [9,0,2]; [1,0,2] exceeds the third entry
        let err = ledger.request(c(2), 1, &v([1, 0, 2])).unwrap_err();
        assert!(matches!(err, BankError::ExceedsNeed { .. }));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_classic_safe_request_is_granted() {
        let mut ledger = classic_ledger();

        assert!(ledger.request(c(2), 1, &v([1, 0, 0])).unwrap());
        assert_eq!(ledger.available(), &v([4, 4, 5]));
        assert_eq!(ledger.allocation(c(2)).unwrap(), &v([4, 0, 2]));
        assert_eq!(
            ledger.safe_sequence(),
            Some(vec![c(1), c(2), c(0)])
        );
    }

    #[test]
    fn test_classic_unsafe_request_is_denied_unchanged() {
        let mut ledger = classic_ledger();
        let before = ledger.snapshot();

        // Would leave [5,1,5] free: nobody's remaining need fits
        assert!(!ledger.request(c(0), 1, &v([0, 3, 0])).unwrap());
        assert_eq!(ledger.snapshot(), before);

        // Same request against the same state is denied again
        assert!(!ledger.request(c(0), 1, &v([0, 3, 0])).unwrap());
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_crossed_philosophers_are_denied() {
        // Two philosophers, two chopsticks, each needs both
        let mut ledger = Ledger::new(v([1, 1]), vec![v([1, 1]), v([1, 1])]).unwrap();

        assert!(ledger.request(c(0), 0, &v([1, 0])).unwrap());
        assert!(!ledger.request(c(1), 0, &v([0, 1])).unwrap());
        assert!(ledger.request(c(0), 1, &v([0, 1])).unwrap());
    }

    #[test]
    fn test_zero_request_is_always_granted() {
        let mut ledger = Ledger::new(v([1]), vec![v([1]), v([1])]).unwrap();
        assert!(ledger.request(c(0), 0, &v([1])).unwrap());
        assert!(ledger.request(c(1), 0, &v([0])).unwrap());
        ledger.release(c(1), 0, &v([0])).unwrap();
        assert_eq!(ledger.available(), &v([0]));
    }

    #[test]
    fn test_duplicate_grant_is_rejected() {
        let mut ledger = Ledger::new(v([4]), vec![v([4])]).unwrap();
        assert!(ledger.request(c(0), 0, &v([1])).unwrap());
        assert_eq!(
            ledger.request(c(0), 0, &v([1])),
            Err(BankError::DuplicateGrant { customer: c(0), index: 0 })
        );
    }

    #[test]
    fn test_release_must_match_grant() {
        let mut ledger = Ledger::new(v([4]), vec![v([4])]).unwrap();
        assert!(ledger.request(c(0), 0, &v([2])).unwrap());
        let before = ledger.snapshot();

        let err = ledger.release(c(0), 0, &v([1])).unwrap_err();
        assert_eq!(
            err,
            BankError::ReleaseMismatch {
                customer: c(0),
                index: 0,
                expected: Some(v([2])),
                found: v([1]),
            }
        );
        assert!(ledger.release(c(0), 1, &v([2])).is_err());
        assert_eq!(ledger.snapshot(), before);

        ledger.release(c(0), 0, &v([2])).unwrap();
        assert_eq!(ledger.outstanding_grants(), 0);
    }

    #[test]
    fn test_unknown_customer_and_bad_length() {
        let mut ledger = Ledger::new(v([4]), vec![v([4])]).unwrap();
        assert_eq!(
            ledger.request(c(3), 0, &v([1])),
            Err(BankError::UnknownCustomer(c(3)))
        );
        assert_eq!(
            ledger.request(c(0), 0, &v([1, 1])),
            Err(BankError::DimensionMismatch { expected: 1, found: 2 })
        );
    }

    #[test]
    fn test_every_committed_state_is_safe() {
        let mut rng = StdRng::seed_from_u64(7);
        let total = v([9, 6, 8, 4]);
        let maximum: Vec<ResourceVector> = (0..6)
            .map(|_| {
                ResourceVector::new(
                    total.iter().map(|&t| rng.random_range(0..=t)).collect(),
                )
            })
            .collect();
        let mut ledger = Ledger::new(total.clone(), maximum).unwrap();
        let mut open: Vec<Vec<(usize, ResourceVector)>> = vec![Vec::new(); 6];
        let mut next_index = 0;

        for _ in 0..2_000 {
            let customer = rng.random_range(0..6);
            if !open[customer].is_empty() && rng.random_bool(0.4) {
                let pick = rng.random_range(0..open[customer].len());
                let (index, vector) = open[customer].swap_remove(pick);
                ledger.release(c(customer), index, &vector).unwrap();
            } else {
                let need = ledger.need(c(customer)).unwrap();
                let request =
                    ResourceVector::new(need.iter().map(|&n| rng.random_range(0..=n)).collect());
                next_index += 1;
                let before = ledger.snapshot();
                if ledger.request(c(customer), next_index, &request).unwrap() {
                    open[customer].push((next_index, request));
                } else {
                    assert_eq!(ledger.snapshot(), before);
                }
            }

            let snapshot = ledger.snapshot();
            assert!(snapshot.is_safe());
            assert!(snapshot.is_conserved());
            assert!(snapshot.within_claims());
        }
    }
}
