//! Random request vectors sized to a customer's maximum claim.

use crate::model::ResourceVector;
use rand::Rng;

/// Generate `count` request vectors whose sum never exceeds `maximum`.
///
/// Entry `j` of each vector is drawn from `1..=maximum[j] / count`, or is `0`
/// when `maximum[j]` is smaller than `count`.
pub fn random_requests(
    maximum: &ResourceVector,
    count: usize,
    rng: &mut impl Rng,
) -> Vec<ResourceVector> {
    if count == 0 {
        return Vec::new();
    }
    let share = |max: u32| max / count as u32;

    (0..count)
        .map(|_| {
            ResourceVector::new(
                maximum
                    .iter()
                    .map(|&max| match share(max) {
                        0 => 0,
                        cap => rng.random_range(1..=cap),
                    })
                    .collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_requests_sum_within_maximum() {
        let mut rng = StdRng::seed_from_u64(9);
        let maximum = ResourceVector::from([9, 2, 17, 0]);

        for count in 1..6 {
            let requests = random_requests(&maximum, count, &mut rng);
            assert_eq!(requests.len(), count);

            let sum = requests
                .iter()
                .fold(ResourceVector::zeros(4), |sum, r| sum.plus(r));
            assert!(sum.fits_within(&maximum), "{} > {}", sum, maximum);
        }
    }

    #[test]
    fn test_small_claims_produce_zero_entries() {
        let mut rng = StdRng::seed_from_u64(1);
        let requests = random_requests(&ResourceVector::from([2, 3]), 3, &mut rng);
        assert!(requests.iter().all(|r| r[0] == 0 && r[1] == 1));
    }
}
