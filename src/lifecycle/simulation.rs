use crate::bank::{self, BankClient, BankError, BankSnapshot, Ledger, ResourcePools};
use crate::config::{ConfigError, ScenarioConfig};
use crate::customer::{
    random_requests, Customer, CustomerError, CustomerHandle, CustomerOptions, CustomerReport,
    CustomerStatus,
};
use crate::model::{CustomerId, ResourceVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Errors from starting or finishing a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Customer failed: {0}")]
    Customer(#[from] CustomerError),

    #[error("Bank failed: {0}")]
    Bank(#[from] BankError),

    #[error("Task failed: {0}")]
    Join(String),
}

/// Summary of a finished simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub total: ResourceVector,
    /// Ledger's view of free units at the end.
    pub available: ResourceVector,
    /// Pools' view of free units at the end.
    pub pool_free: ResourceVector,
    /// Pool acquires that had to wait. Zero when grants and pools stay in step.
    pub contended_acquires: u64,
    pub outstanding_grants: usize,
    pub customers: Vec<CustomerReport>,
}

impl SimulationReport {
    /// Everything was returned and the pools never disagreed with the ledger.
    pub fn is_consistent(&self) -> bool {
        self.available == self.total
            && self.pool_free == self.total
            && self.outstanding_grants == 0
            && self.contended_acquires == 0
    }
}

/// Runtime orchestrator for one simulation run.
///
/// `Simulation` is responsible for:
/// - **Wiring**: building the bank and its pools from a [`ScenarioConfig`],
///   then one customer per maximum-claim row
/// - **Loading**: giving each customer its request vectors, explicit or
///   generated, and closing it
/// - **Join barrier**: [`wait`](Simulation::wait) returns once every customer
///   is done, then shuts the bank down
///
/// # Example
///
/// ```rust
/// use banker_sim::config::{Pacing, ScenarioBuilder};
/// use banker_sim::lifecycle::Simulation;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ScenarioBuilder::new()
///         .seed(1)
///         .random_resources(3)
///         .random_maximum(4)
///         .pacing(Pacing::none())
///         .build()?;
///
///     let simulation = Simulation::start(&config).await?;
///     let report = simulation.wait().await?;
///     assert!(report.is_consistent());
///     Ok(())
/// }
/// ```
pub struct Simulation {
    bank: BankClient,
    pools: Arc<ResourcePools>,
    customers: Vec<CustomerHandle>,
    handles: Vec<JoinHandle<Result<CustomerReport, CustomerError>>>,
    bank_handle: JoinHandle<Ledger>,
}

impl Simulation {
    /// Validates `config`, starts the bank and every customer, and loads the
    /// customers' transactions.
    ///
    /// If loading fails part way, the customers already started are closed
    /// and joined and the bank is shut down before the error is returned.
    pub async fn start(config: &ScenarioConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let ledger = Ledger::new(config.total.clone(), config.maximum.clone())?;
        let (bank_actor, bank) = bank::new(ledger);
        let bank_handle = tokio::spawn(bank_actor.run());

        let mut simulation = Self {
            bank,
            pools: Arc::new(ResourcePools::new(&config.total)),
            customers: Vec::with_capacity(config.customers()),
            handles: Vec::with_capacity(config.customers()),
            bank_handle,
        };

        if let Err(e) = simulation.load(config).await {
            error!(error = %e, "Simulation failed to start");
            let _ = simulation.wait().await;
            return Err(e);
        }

        info!(
            customers = simulation.customers.len(),
            total = %config.total,
            "Simulation started"
        );
        Ok(simulation)
    }

    async fn load(&mut self, config: &ScenarioConfig) -> Result<(), SimulationError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        for i in 0..config.customers() {
            let id = CustomerId(i);
            let options = CustomerOptions {
                pacing: config.pacing,
                selection: config.selection,
                seed: config.seed.map(|seed| seed.wrapping_add(i as u64 + 1)),
            };
            let (customer, mut handle) =
                Customer::new(id, self.bank.clone(), self.pools.clone(), options).await?;
            self.handles.push(tokio::spawn(customer.run()));

            let requests = match &config.requests {
                Some(lists) => lists[i].clone(),
                None => random_requests(handle.maximum(), config.requests_per_customer, &mut rng),
            };
            for request in requests {
                handle.add_request(request).await?;
            }
            handle.close();
            self.customers.push(handle);
        }
        Ok(())
    }

    pub fn pools(&self) -> &ResourcePools {
        &self.pools
    }

    pub fn customers(&self) -> &[CustomerHandle] {
        &self.customers
    }

    /// Current free units according to the bank.
    pub async fn available(&self) -> Result<ResourceVector, SimulationError> {
        Ok(self.bank.available().await?)
    }

    pub async fn snapshot(&self) -> Result<BankSnapshot, SimulationError> {
        Ok(self.bank.snapshot().await?)
    }

    pub fn statuses(&self) -> Vec<CustomerStatus> {
        self.customers.iter().map(CustomerHandle::status).collect()
    }

    /// Wait for every customer to finish, then shut the bank down.
    ///
    /// The bank is always joined. If any customer failed, the first failure
    /// is returned after all the others have been joined.
    pub async fn wait(self) -> Result<SimulationReport, SimulationError> {
        let Simulation {
            bank,
            pools,
            customers,
            handles,
            bank_handle,
        } = self;

        // Closes any customer that was never closed
        drop(customers);

        let mut reports = Vec::with_capacity(handles.len());
        let mut failure = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(e)) => {
                    failure.get_or_insert(SimulationError::Customer(e));
                }
                Err(e) => {
                    error!("Customer task failed: {:?}", e);
                    failure.get_or_insert(SimulationError::Join(e.to_string()));
                }
            }
        }

        // Dropping the last client closes the bank's channel
        drop(bank);
        let ledger = bank_handle
            .await
            .map_err(|e| SimulationError::Join(e.to_string()))?;

        if let Some(e) = failure {
            warn!(
                available = %ledger.available(),
                outstanding = ledger.outstanding_grants(),
                "Simulation ended with a failed customer"
            );
            return Err(e);
        }

        let report = SimulationReport {
            total: ledger.total().clone(),
            available: ledger.available().clone(),
            pool_free: pools.free(),
            contended_acquires: pools.contended(),
            outstanding_grants: ledger.outstanding_grants(),
            customers: reports,
        };
        info!(
            available = %report.available,
            pool_free = %report.pool_free,
            contended = report.contended_acquires,
            "Simulation complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_wait_joins_bank_after_customer_failure() {
        let total = ResourceVector::from([4]);
        let ledger = Ledger::new(total.clone(), vec![ResourceVector::from([4])]).unwrap();
        let (bank_actor, bank) = bank::new(ledger);
        let (stopped_tx, mut stopped_rx) = oneshot::channel();
        let bank_handle = tokio::spawn(async move {
            let ledger = bank_actor.run().await;
            let _ = stopped_tx.send(());
            ledger
        });

        let failed: JoinHandle<Result<CustomerReport, CustomerError>> =
            tokio::spawn(async { Err(CustomerError::Stopped(CustomerId(0))) });
        let simulation = Simulation {
            bank,
            pools: Arc::new(ResourcePools::new(&total)),
            customers: Vec::new(),
            handles: vec![failed],
            bank_handle,
        };

        let result = simulation.wait().await;
        assert!(matches!(
            result,
            Err(SimulationError::Customer(CustomerError::Stopped(CustomerId(0))))
        ));
        assert!(stopped_rx.try_recv().is_ok());
    }
}
