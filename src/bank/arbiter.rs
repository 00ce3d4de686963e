//! # Arbiter Trait
//!
//! The seam between customers and whatever decides their requests.
//!
//! Customers are generic over [`Arbiter`] so their driving loop can be tested
//! against a scripted arbiter without spawning a bank.

use super::{BankClient, BankError};
use crate::model::{CustomerId, ResourceVector};
use async_trait::async_trait;

/// The operations a customer needs from the bank.
#[async_trait]
pub trait Arbiter: Clone + Send + Sync + 'static {
    async fn request(
        &self,
        customer: CustomerId,
        index: usize,
        request: ResourceVector,
    ) -> Result<bool, BankError>;

    async fn release(
        &self,
        customer: CustomerId,
        index: usize,
        request: ResourceVector,
    ) -> Result<(), BankError>;

    async fn maximum_claim(&self, customer: CustomerId) -> Result<ResourceVector, BankError>;
}

#[async_trait]
impl Arbiter for BankClient {
    async fn request(
        &self,
        customer: CustomerId,
        index: usize,
        request: ResourceVector,
    ) -> Result<bool, BankError> {
        BankClient::request(self, customer, index, request).await
    }

    async fn release(
        &self,
        customer: CustomerId,
        index: usize,
        request: ResourceVector,
    ) -> Result<(), BankError> {
        BankClient::release(self, customer, index, request).await
    }

    async fn maximum_claim(&self, customer: CustomerId) -> Result<ResourceVector, BankError> {
        BankClient::maximum_claim(self, customer).await
    }
}
