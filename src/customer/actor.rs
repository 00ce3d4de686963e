//! # Customer Actor
//!
//! One customer runs in its own task and drives its transactions through
//! `waiting -> pending -> finished`, asking its [`Arbiter`] before it takes
//! anything from the [`ResourcePools`].

use super::handle::{CustomerHandle, CustomerStatus};
use super::picker::Picker;
use super::CustomerError;
use crate::bank::{Arbiter, BankClient, ResourcePools};
use crate::config::{Pacing, Selection};
use crate::model::{CustomerId, ResourceVector, Transaction, TransactionStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// How a customer paces itself and chooses its work.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerOptions {
    pub pacing: Pacing,
    pub selection: Selection,
    /// Seed for pacing and selection. Random when absent.
    pub seed: Option<u64>,
}

/// What a customer did, returned when its task finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerReport {
    pub customer: CustomerId,
    pub transactions: usize,
    pub grants: usize,
    pub denials: usize,
    pub releases: usize,
}

pub struct Customer<A: Arbiter = BankClient> {
    id: CustomerId,
    maximum: ResourceVector,
    arbiter: A,
    pools: Arc<ResourcePools>,
    receiver: mpsc::Receiver<ResourceVector>,
    status: watch::Sender<CustomerStatus>,
    transactions: Vec<Transaction>,
    finished: usize,
    closed: bool,
    picker: Picker,
    pacing: Pacing,
    rng: StdRng,
    grants: usize,
    denials: usize,
}

impl<A: Arbiter> Customer<A> {
    /// Creates a customer and the handle used to feed it transactions.
    ///
    /// Fetches the customer's maximum claim from the arbiter once; every
    /// transaction added later is checked against it.
    pub async fn new(
        id: CustomerId,
        arbiter: A,
        pools: Arc<ResourcePools>,
        options: CustomerOptions,
    ) -> Result<(Self, CustomerHandle), CustomerError> {
        let maximum = arbiter.maximum_claim(id).await?;
        let (sender, receiver) = mpsc::channel(32);
        let (status, status_rx) = watch::channel(CustomerStatus::default());
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let handle = CustomerHandle::new(id, maximum.clone(), sender, status_rx);
        let customer = Self {
            id,
            maximum,
            arbiter,
            pools,
            receiver,
            status,
            transactions: Vec::new(),
            finished: 0,
            closed: false,
            picker: Picker::new(options.selection),
            pacing: options.pacing,
            rng,
            grants: 0,
            denials: 0,
        };
        Ok((customer, handle))
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    /// Runs until closed with every transaction finished, or until an error.
    pub async fn run(mut self) -> Result<CustomerReport, CustomerError> {
        info!(customer = %self.id, maximum = %self.maximum, "Customer started");

        let result = self.drive().await;
        match &result {
            Ok(report) => info!(
                customer = %self.id,
                transactions = report.transactions,
                denials = report.denials,
                "Customer done"
            ),
            Err(CustomerError::Bank(e)) if e.is_protocol_violation() => {
                error!(customer = %self.id, error = %e, "Bank rejected customer")
            }
            Err(e) => error!(customer = %self.id, error = %e, "Customer failed"),
        }
        result
    }

    fn is_done(&self) -> bool {
        self.closed && self.finished == self.transactions.len()
    }

    async fn drive(&mut self) -> Result<CustomerReport, CustomerError> {
        loop {
            self.drain_commands()?;
            if self.is_done() {
                return Ok(self.report());
            }

            if self.finished == self.transactions.len() {
                // Idle until a transaction is appended or the handle closes
                match self.receiver.recv().await {
                    Some(request) => self.append(request)?,
                    None => self.close(),
                }
                continue;
            }

            let delay = self.pacing.delay(&mut self.rng);
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }

            if let Some(index) = self.picker.pick(&self.transactions, &mut self.rng) {
                self.step(index).await?;
            }
        }
    }

    fn drain_commands(&mut self) -> Result<(), CustomerError> {
        while !self.closed {
            match self.receiver.try_recv() {
                Ok(request) => self.append(request)?,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.close(),
            }
        }
        Ok(())
    }

    fn append(&mut self, request: ResourceVector) -> Result<(), CustomerError> {
        // Open transactions must fit in the maximum together, or a waiting one
        // could ask for more than the remaining need
        let open = self
            .transactions
            .iter()
            .filter(|txn| !txn.is_finished())
            .fold(ResourceVector::zeros(self.maximum.len()), |sum, txn| {
                sum.plus(&txn.request)
            });
        let fits = open
            .checked_plus(&request)
            .is_some_and(|sum| sum.fits_within(&self.maximum));
        if !fits {
            return Err(CustomerError::ClaimExceeded {
                customer: self.id,
                open,
                request,
                maximum: self.maximum.clone(),
            });
        }

        debug!(customer = %self.id, index = self.transactions.len(), %request, "Transaction added");
        self.transactions.push(Transaction::new(request));
        self.publish();
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            debug!(customer = %self.id, "Closed");
            self.closed = true;
            self.publish();
        }
    }

    async fn step(&mut self, index: usize) -> Result<(), CustomerError> {
        let request = self.transactions[index].request.clone();

        match self.transactions[index].status() {
            TransactionStatus::Waiting => {
                info!(customer = %self.id, index, %request, "Requesting");
                if self.arbiter.request(self.id, index, request.clone()).await? {
                    // The bank has reserved these units, so the pools have them free
                    self.pools.acquire_all(&request).await?;
                    self.transactions[index].advance();
                    self.grants += 1;
                } else {
                    self.denials += 1;
                    debug!(customer = %self.id, index, "Denied, will retry");
                }
            }
            TransactionStatus::Pending => {
                info!(customer = %self.id, index, %request, "Releasing");
                // Physical units go back first so the pools never lag the ledger
                self.pools.release_all(&request);
                if let Err(e) = self.arbiter.release(self.id, index, request).await {
                    error!(
                        customer = %self.id,
                        index,
                        pool_free = %self.pools.free(),
                        "Release failed after units went back to the pools"
                    );
                    return Err(e.into());
                }
                self.transactions[index].advance();
                self.finished += 1;
            }
            TransactionStatus::Finished => {
                return Err(CustomerError::InvalidTransition {
                    customer: self.id,
                    index,
                })
            }
        }

        self.publish();
        Ok(())
    }

    fn publish(&self) {
        self.status.send_replace(CustomerStatus {
            transactions: self.transactions.len(),
            finished: self.finished,
            closed: self.closed,
        });
    }

    fn report(&self) -> CustomerReport {
        CustomerReport {
            customer: self.id,
            transactions: self.transactions.len(),
            grants: self.grants,
            denials: self.denials,
            releases: self.finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::BankError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Request(usize),
        Release(usize),
    }

    /// Grants everything after denying the first `deny` requests, and records
    /// every call it sees.
    #[derive(Clone)]
    struct ScriptedArbiter {
        maximum: ResourceVector,
        deny: Arc<Mutex<usize>>,
        calls: Arc<Mutex<Vec<Call>>>,
        fail_release: bool,
    }

    impl ScriptedArbiter {
        fn new(maximum: impl Into<ResourceVector>, deny: usize) -> Self {
            Self {
                maximum: maximum.into(),
                deny: Arc::new(Mutex::new(deny)),
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_release: false,
            }
        }

        /// Every release answers as if the bank had gone away.
        fn failing_release(mut self) -> Self {
            self.fail_release = true;
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Arbiter for ScriptedArbiter {
        async fn request(
            &self,
            _customer: CustomerId,
            index: usize,
            _request: ResourceVector,
        ) -> Result<bool, BankError> {
            self.calls.lock().unwrap().push(Call::Request(index));
            let mut deny = self.deny.lock().unwrap();
            if *deny > 0 {
                *deny -= 1;
                return Ok(false);
            }
            Ok(true)
        }

        async fn release(
            &self,
            _customer: CustomerId,
            index: usize,
            _request: ResourceVector,
        ) -> Result<(), BankError> {
            self.calls.lock().unwrap().push(Call::Release(index));
            if self.fail_release {
                return Err(BankError::ActorClosed);
            }
            Ok(())
        }

        async fn maximum_claim(&self, _customer: CustomerId) -> Result<ResourceVector, BankError> {
            Ok(self.maximum.clone())
        }
    }

    fn round_robin() -> CustomerOptions {
        CustomerOptions {
            pacing: Pacing::none(),
            selection: Selection::RoundRobin,
            seed: Some(1),
        }
    }

    #[tokio::test]
    async fn test_round_robin_requests_then_releases() {
        let arbiter = ScriptedArbiter::new([4, 4], 0);
        let pools = Arc::new(ResourcePools::new(&ResourceVector::from([4, 4])));
        let (customer, mut handle) =
            Customer::new(CustomerId(0), arbiter.clone(), pools.clone(), round_robin())
                .await
                .unwrap();

        handle.add_request(ResourceVector::from([1, 2])).await.unwrap();
        handle.add_request(ResourceVector::from([2, 1])).await.unwrap();
        handle.close();

        let report = customer.run().await.unwrap();
        assert_eq!(report.grants, 2);
        assert_eq!(report.releases, 2);
        assert_eq!(report.denials, 0);
        assert_eq!(
            arbiter.calls(),
            vec![Call::Request(0), Call::Request(1), Call::Release(0), Call::Release(1)]
        );
        assert_eq!(pools.free(), ResourceVector::from([4, 4]));
        assert_eq!(pools.contended(), 0);
        assert!(handle.is_done());
    }

    #[tokio::test]
    async fn test_denied_request_is_retried() {
        let arbiter = ScriptedArbiter::new([3], 2);
        let pools = Arc::new(ResourcePools::new(&ResourceVector::from([3])));
        let (customer, mut handle) =
            Customer::new(CustomerId(0), arbiter.clone(), pools, round_robin())
                .await
                .unwrap();

        handle.add_request(ResourceVector::from([3])).await.unwrap();
        handle.close();

        let report = customer.run().await.unwrap();
        assert_eq!(report.denials, 2);
        assert_eq!(
            arbiter.calls(),
            vec![
                Call::Request(0),
                Call::Request(0),
                Call::Request(0),
                Call::Release(0)
            ]
        );
    }

    #[tokio::test]
    async fn test_idle_customer_waits_for_work() {
        let arbiter = ScriptedArbiter::new([2], 0);
        let pools = Arc::new(ResourcePools::new(&ResourceVector::from([2])));
        let (customer, mut handle) = Customer::new(CustomerId(3), arbiter, pools, round_robin())
            .await
            .unwrap();
        let task = tokio::spawn(customer.run());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());
        assert_eq!(handle.status(), CustomerStatus::default());

        handle.add_request(ResourceVector::from([2])).await.unwrap();
        handle.close();

        let status = handle.wait_done().await.unwrap();
        assert_eq!(status.finished, 1);
        assert_eq!(task.await.unwrap().unwrap().releases, 1);
    }

    #[tokio::test]
    async fn test_requests_beyond_maximum_stop_the_customer() {
        let arbiter = ScriptedArbiter::new([3], 0);
        let pools = Arc::new(ResourcePools::new(&ResourceVector::from([3])));
        let (customer, mut handle) = Customer::new(CustomerId(1), arbiter, pools, round_robin())
            .await
            .unwrap();

        handle.add_request(ResourceVector::from([2])).await.unwrap();
        handle.add_request(ResourceVector::from([2])).await.unwrap();
        handle.close();

        let err = customer.run().await.unwrap_err();
        assert!(matches!(err, CustomerError::ClaimExceeded { .. }));
        assert_eq!(handle.wait_done().await, Err(CustomerError::Stopped(CustomerId(1))));
    }

    #[tokio::test]
    async fn test_request_sum_overflow_is_a_claim_violation() {
        let arbiter = ScriptedArbiter::new([u32::MAX], 0);
        let pools = Arc::new(ResourcePools::new(&ResourceVector::from([u32::MAX])));
        let (customer, mut handle) = Customer::new(CustomerId(2), arbiter, pools, round_robin())
            .await
            .unwrap();

        handle.add_request(ResourceVector::from([u32::MAX])).await.unwrap();
        handle.add_request(ResourceVector::from([1])).await.unwrap();
        handle.close();

        let err = customer.run().await.unwrap_err();
        assert!(matches!(err, CustomerError::ClaimExceeded { .. }));
    }

    #[tokio::test]
    async fn test_failed_release_leaves_pools_ahead_of_bank() {
        let arbiter = ScriptedArbiter::new([3], 0).failing_release();
        let pools = Arc::new(ResourcePools::new(&ResourceVector::from([3])));
        let (customer, mut handle) =
            Customer::new(CustomerId(0), arbiter.clone(), pools.clone(), round_robin())
                .await
                .unwrap();

        handle.add_request(ResourceVector::from([2])).await.unwrap();
        handle.close();

        let err = customer.run().await.unwrap_err();
        assert_eq!(err, CustomerError::Bank(BankError::ActorClosed));
        assert_eq!(arbiter.calls(), vec![Call::Request(0), Call::Release(0)]);
        // Units are back in the pool although the bank still counts them as held
        assert_eq!(pools.free(), ResourceVector::from([3]));
    }

    #[tokio::test]
    async fn test_closed_handle_rejects_requests() {
        let arbiter = ScriptedArbiter::new([1, 1], 0);
        let pools = Arc::new(ResourcePools::new(&ResourceVector::from([1, 1])));
        let (_customer, mut handle) = Customer::new(CustomerId(0), arbiter, pools, round_robin())
            .await
            .unwrap();

        assert_eq!(
            handle.add_request(ResourceVector::from([1])).await,
            Err(CustomerError::DimensionMismatch { expected: 2, found: 1 })
        );
        handle.close();
        assert_eq!(
            handle.add_request(ResourceVector::from([1, 1])).await,
            Err(CustomerError::Closed(CustomerId(0)))
        );
    }
}
