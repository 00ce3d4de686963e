//! # Bank Actor
//!
//! The "server" half of the bank. It owns the [`Ledger`] and processes
//! messages one at a time, which makes its message loop the single
//! serialization point for every grant and release in the system.

use super::client::BankClient;
use super::ledger::Ledger;
use super::message::BankRequest;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// The arbiter that decides which requests may be granted.
///
/// **Concurrency Model**:
/// Any number of customers may hold a [`BankClient`], but the actor handles
/// their messages strictly in arrival order. Handling a message never awaits,
/// so no customer can stall the bank while it decides.
pub struct BankActor {
    receiver: mpsc::Receiver<BankRequest>,
    ledger: Ledger,
}

impl BankActor {
    /// Creates a new `BankActor` and its associated `BankClient`.
    ///
    /// # Arguments
    ///
    /// * `ledger` - The initial allocation state, usually fresh from [`Ledger::new`].
    /// * `buffer_size` - The capacity of the MPSC channel. If the channel is full,
    ///   calls to the client wait until there is space.
    pub fn new(ledger: Ledger, buffer_size: usize) -> (Self, BankClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self { receiver, ledger };
        (actor, BankClient::new(sender))
    }

    /// Runs the actor's event loop until every client has been dropped.
    ///
    /// Returns the final ledger so the caller can inspect the end state.
    pub async fn run(mut self) -> Ledger {
        info!(
            customers = self.ledger.customers(),
            total = %self.ledger.total(),
            "Bank started"
        );

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                BankRequest::Request {
                    customer,
                    index,
                    request,
                    respond_to,
                } => {
                    let result = self.ledger.request(customer, index, &request);
                    match &result {
                        Ok(true) => {
                            info!(%customer, index, %request, available = %self.ledger.available(), "Granted");
                            debug!(sequence = ?self.ledger.safe_sequence(), "Safe sequence");
                            debug_assert!(self.ledger.is_safe(), "granted into an unsafe state");
                            debug_assert!(self.ledger.is_conserved(), "units lost or created");
                        }
                        Ok(false) => {
                            info!(%customer, index, %request, available = %self.ledger.available(), "Denied");
                        }
                        Err(e) => error!(%customer, index, %request, error = %e, "Request rejected"),
                    }
                    let _ = respond_to.send(result);
                }
                BankRequest::Release {
                    customer,
                    index,
                    request,
                    respond_to,
                } => {
                    let result = self.ledger.release(customer, index, &request);
                    match &result {
                        Ok(()) => {
                            info!(%customer, index, %request, available = %self.ledger.available(), "Released");
                            debug_assert!(self.ledger.is_conserved(), "units lost or created");
                        }
                        Err(e) => error!(%customer, index, %request, error = %e, "Release rejected"),
                    }
                    let _ = respond_to.send(result);
                }
                BankRequest::MaximumClaim {
                    customer,
                    respond_to,
                } => {
                    let result = self.ledger.maximum(customer).cloned();
                    debug!(%customer, found = result.is_ok(), "MaximumClaim");
                    let _ = respond_to.send(result);
                }
                BankRequest::Available { respond_to } => {
                    let _ = respond_to.send(Ok(self.ledger.available().clone()));
                }
                BankRequest::Snapshot { respond_to } => {
                    let _ = respond_to.send(Ok(self.ledger.snapshot()));
                }
            }
        }

        info!(
            available = %self.ledger.available(),
            outstanding = self.ledger.outstanding_grants(),
            "Bank shutdown"
        );
        self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::BankError;
    use crate::model::{CustomerId, ResourceVector};

    #[tokio::test]
    async fn test_bank_actor_grants_and_releases() {
        let ledger = Ledger::new(
            ResourceVector::from([10]),
            vec![ResourceVector::from([5]), ResourceVector::from([5])],
        )
        .unwrap();
        let (actor, client) = BankActor::new(ledger, 8);
        let handle = tokio::spawn(actor.run());

        let a = CustomerId(0);
        let b = CustomerId(1);
        assert!(client.request(a, 0, ResourceVector::from([5])).await.unwrap());
        assert!(client.request(b, 0, ResourceVector::from([5])).await.unwrap());
        assert_eq!(client.available().await.unwrap(), ResourceVector::from([0]));

        client.release(a, 0, ResourceVector::from([5])).await.unwrap();
        assert_eq!(client.available().await.unwrap(), ResourceVector::from([5]));

        assert_eq!(
            client.maximum_claim(CustomerId(9)).await,
            Err(BankError::UnknownCustomer(CustomerId(9)))
        );

        drop(client);
        let ledger = handle.await.unwrap();
        assert_eq!(ledger.outstanding_grants(), 1);
        assert!(ledger.is_conserved());
    }
}
