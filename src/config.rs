//! # Scenario Configuration
//!
//! Everything a simulation needs before the first customer starts: resource
//! totals, the maximum-claim matrix, what each customer will request, and how
//! customers pace and pick their work.
//!
//! A [`ScenarioConfig`] is either built by [`ScenarioBuilder`] (explicit or
//! random totals and claims) or loaded from a JSON file. Either way it is
//! checked once by [`ScenarioConfig::validate`]; a simulation never starts
//! from an invalid configuration.

use crate::model::{CustomerId, ResourceVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const MIN_RESOURCE_TYPES: usize = 1;
pub const MAX_RESOURCE_TYPES: usize = 10;
pub const DEFAULT_REQUESTS_PER_CUSTOMER: usize = 3;

/// Range the random builder draws each resource total from.
pub const RANDOM_TOTAL_UNITS: RangeInclusive<u32> = 5..=20;

/// Errors found while building or validating a scenario.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{count} resource types requested, needs to be between {min} and {max}")]
    InvalidResourceCount { count: usize, min: usize, max: usize },

    #[error("At least one resource type is required")]
    NoResources,

    #[error("At least one customer is required")]
    NoCustomers,

    #[error("{what} has {found} entries, expected {expected}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("{customer} claims {claim} of resource {resource}, only {total} exist")]
    ClaimExceedsTotal {
        customer: CustomerId,
        resource: usize,
        claim: u32,
        total: u32,
    },

    #[error("Requests for {customer} add up to {sum}, above its maximum {maximum}")]
    RequestsExceedClaim {
        customer: CustomerId,
        sum: ResourceVector,
        maximum: ResourceVector,
    },

    #[error("Pacing minimum {min_ms}ms is above maximum {max_ms}ms")]
    InvalidPacing { min_ms: u64, max_ms: u64 },

    #[error("Cannot read scenario file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scenario file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How long a customer pauses before each step, drawn uniformly from
/// `min_ms..=max_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Pacing {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// No pauses at all. Used by tests that only care about the protocol.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn delay(&self, rng: &mut impl Rng) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.random_range(self.min_ms..=self.max_ms))
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(1_000, 5_000)
    }
}

/// How a customer picks its next unfinished transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    /// Uniformly at random among unfinished transactions.
    #[default]
    Random,
    /// The next unfinished transaction after the previous pick.
    RoundRobin,
}

fn default_requests_per_customer() -> usize {
    DEFAULT_REQUESTS_PER_CUSTOMER
}

/// A complete, self-contained description of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Units of each resource type.
    pub total: ResourceVector,
    /// One row per customer: the most it will ever hold at once.
    pub maximum: Vec<ResourceVector>,
    /// Explicit request vectors per customer. Generated randomly when absent.
    #[serde(default)]
    pub requests: Option<Vec<Vec<ResourceVector>>>,
    /// Number of generated requests per customer when `requests` is absent.
    #[serde(default = "default_requests_per_customer")]
    pub requests_per_customer: usize,
    #[serde(default)]
    pub pacing: Pacing,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ScenarioConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn resource_types(&self) -> usize {
        self.total.len()
    }

    pub fn customers(&self) -> usize {
        self.maximum.len()
    }

    /// Check every startup constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_resource_count(self.total.len())?;
        if self.maximum.is_empty() {
            return Err(ConfigError::NoCustomers);
        }
        check_claims(&self.total, &self.maximum)?;

        if let Some(requests) = &self.requests {
            if requests.len() != self.maximum.len() {
                return Err(ConfigError::DimensionMismatch {
                    what: "request lists".to_string(),
                    expected: self.maximum.len(),
                    found: requests.len(),
                });
            }
            for (i, (list, maximum)) in requests.iter().zip(&self.maximum).enumerate() {
                let customer = CustomerId(i);
                let mut sum = ResourceVector::zeros(self.total.len());
                for request in list {
                    if request.len() != self.total.len() {
                        return Err(ConfigError::DimensionMismatch {
                            what: format!("request for {}", customer),
                            expected: self.total.len(),
                            found: request.len(),
                        });
                    }
                    sum = match sum.checked_plus(request) {
                        Some(sum) => sum,
                        None => {
                            return Err(ConfigError::RequestsExceedClaim {
                                customer,
                                sum: sum.saturating_plus(request),
                                maximum: maximum.clone(),
                            })
                        }
                    };
                }
                if !sum.fits_within(maximum) {
                    return Err(ConfigError::RequestsExceedClaim {
                        customer,
                        sum,
                        maximum: maximum.clone(),
                    });
                }
            }
        }

        if self.pacing.min_ms > self.pacing.max_ms {
            return Err(ConfigError::InvalidPacing {
                min_ms: self.pacing.min_ms,
                max_ms: self.pacing.max_ms,
            });
        }
        Ok(())
    }
}

pub(crate) fn check_resource_count(count: usize) -> Result<(), ConfigError> {
    if (MIN_RESOURCE_TYPES..=MAX_RESOURCE_TYPES).contains(&count) {
        Ok(())
    } else {
        Err(ConfigError::InvalidResourceCount {
            count,
            min: MIN_RESOURCE_TYPES,
            max: MAX_RESOURCE_TYPES,
        })
    }
}

/// Every maximum row has one entry per resource type, none above its total.
pub(crate) fn check_claims(
    total: &ResourceVector,
    maximum: &[ResourceVector],
) -> Result<(), ConfigError> {
    if total.is_empty() {
        return Err(ConfigError::NoResources);
    }
    for (i, row) in maximum.iter().enumerate() {
        if row.len() != total.len() {
            return Err(ConfigError::DimensionMismatch {
                what: format!("maximum row for {}", CustomerId(i)),
                expected: total.len(),
                found: row.len(),
            });
        }
        if let Some(j) = (0..total.len()).find(|&j| row[j] > total[j]) {
            return Err(ConfigError::ClaimExceedsTotal {
                customer: CustomerId(i),
                resource: j,
                claim: row[j],
                total: total[j],
            });
        }
    }
    Ok(())
}

enum Totals {
    Explicit(ResourceVector),
    Random(usize),
}

enum Claims {
    Explicit(Vec<ResourceVector>),
    Random(usize),
}

/// Builds a [`ScenarioConfig`] from explicit or randomly generated parts.
///
/// ```rust
/// use banker_sim::config::ScenarioBuilder;
///
/// let config = ScenarioBuilder::new()
///     .seed(42)
///     .random_resources(3)
///     .random_maximum(5)
///     .build()
///     .unwrap();
/// assert_eq!(config.customers(), 5);
/// ```
pub struct ScenarioBuilder {
    totals: Option<Totals>,
    claims: Option<Claims>,
    requests: Option<Vec<Vec<ResourceVector>>>,
    requests_per_customer: usize,
    pacing: Pacing,
    selection: Selection,
    seed: Option<u64>,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self {
            totals: None,
            claims: None,
            requests: None,
            requests_per_customer: DEFAULT_REQUESTS_PER_CUSTOMER,
            pacing: Pacing::default(),
            selection: Selection::default(),
            seed: None,
        }
    }

    pub fn resources(mut self, total: impl Into<ResourceVector>) -> Self {
        self.totals = Some(Totals::Explicit(total.into()));
        self
    }

    /// `count` resource types, each with a random total from [`RANDOM_TOTAL_UNITS`].
    pub fn random_resources(mut self, count: usize) -> Self {
        self.totals = Some(Totals::Random(count));
        self
    }

    pub fn maximum(mut self, rows: Vec<ResourceVector>) -> Self {
        self.claims = Some(Claims::Explicit(rows));
        self
    }

    /// `customers` rows, each entry drawn from `0..=total` for its resource type.
    pub fn random_maximum(mut self, customers: usize) -> Self {
        self.claims = Some(Claims::Random(customers));
        self
    }

    pub fn requests(mut self, requests: Vec<Vec<ResourceVector>>) -> Self {
        self.requests = Some(requests);
        self
    }

    pub fn requests_per_customer(mut self, n: usize) -> Self {
        self.requests_per_customer = n;
        self
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<ScenarioConfig, ConfigError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let total = match self.totals.ok_or(ConfigError::NoResources)? {
            Totals::Explicit(total) => total,
            Totals::Random(count) => {
                check_resource_count(count)?;
                ResourceVector::new(
                    (0..count)
                        .map(|_| rng.random_range(RANDOM_TOTAL_UNITS))
                        .collect(),
                )
            }
        };

        let maximum = match self.claims.ok_or(ConfigError::NoCustomers)? {
            Claims::Explicit(rows) => rows,
            Claims::Random(customers) => (0..customers)
                .map(|_| {
                    ResourceVector::new(total.iter().map(|&t| rng.random_range(0..=t)).collect())
                })
                .collect(),
        };

        let config = ScenarioConfig {
            total,
            maximum,
            requests: self.requests,
            requests_per_customer: self.requests_per_customer,
            pacing: self.pacing,
            selection: self.selection,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}
