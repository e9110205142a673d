//! Reviews

use jiff::Timestamp;

use crate::{chain::Address, products::ProductId};

/// Product review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    /// Review identifier
    pub id: String,

    /// Reviewed product
    pub product: ProductId,

    /// Reviewer wallet address
    pub reviewer: Address,

    /// Star rating, `1..=5`
    pub rating: u8,

    /// Review text
    pub comment: String,

    /// When the review was written
    pub created_at: Timestamp,
}

/// Mean rating of `reviews`, or zero when there are none.
pub fn average_rating<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> f64 {
    let (sum, count) = reviews
        .into_iter()
        .fold((0_u32, 0_u32), |(sum, count), review| {
            (sum + u32::from(review.rating), count + 1)
        });

    if count == 0 {
        return 0.0;
    }

    f64::from(sum) / f64::from(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: format!("rev-{rating}"),
            product: ProductId::new("prod-001"),
            reviewer: Address::new("0x4567"),
            rating,
            comment: String::new(),
            created_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn average_of_no_reviews_is_zero() {
        assert!(average_rating(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn average_of_ratings() {
        let reviews = [review(5), review(4)];

        assert!((average_rating(&reviews) - 4.5).abs() < f64::EPSILON);
    }
}
