//! Courses, prices, and embedded media assets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::Error;
use super::ids::{CourseId, UserId};

/// Largest price accepted, in minor units (one million in major units).
const MAX_MINOR_UNITS: i64 = 100_000_000;

/// A course price in minor currency units (e.g. paise).
///
/// The HTTP surface speaks major units with two decimal places; storing
/// minor units keeps arithmetic exact and matches what the payment gateway
/// expects.
///
/// # Examples
/// ```
/// use backend::domain::Price;
///
/// let price = Price::from_major_units(499.0).expect("valid price");
/// assert_eq!(price.minor_units(), 49_900);
/// assert!(!price.is_free());
/// assert_eq!(price.to_string(), "499.00");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// A free course.
    pub const FREE: Self = Self(0);

    /// Build a price from a major-unit amount as supplied over the wire.
    ///
    /// Rejects negative, non-finite, and absurdly large values; rounds to
    /// the nearest minor unit.
    pub fn from_major_units(amount: f64) -> Result<Self, Error> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::invalid_request("Price must be a non-negative number"));
        }
        let minor = (amount * 100.0).round();
        #[expect(
            clippy::cast_precision_loss,
            reason = "MAX_MINOR_UNITS is far below f64 integer precision"
        )]
        if minor > MAX_MINOR_UNITS as f64 {
            return Err(Error::invalid_request("Price is too large"));
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "bounds checked against MAX_MINOR_UNITS before the cast"
        )]
        let minor = minor as i64;
        Ok(Self(minor))
    }

    /// Build a price from stored minor units.
    pub fn from_minor_units(minor: i64) -> Result<Self, Error> {
        if !(0..=MAX_MINOR_UNITS).contains(&minor) {
            return Err(Error::internal("Stored price is out of range"));
        }
        Ok(Self(minor))
    }

    /// The exact minor-unit amount.
    pub fn minor_units(self) -> i64 {
        self.0
    }

    /// The major-unit amount for display and API responses.
    #[expect(
        clippy::cast_precision_loss,
        reason = "minor units are bounded well below f64 integer precision"
    )]
    pub fn major_units(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Whether enrolment requires no payment.
    pub fn is_free(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// A lecture video hosted on the external media service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoAsset {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    /// Identifier on the media host, used for deletion.
    pub external_id: String,
    pub uploaded_at: DateTime<Utc>,
}

/// The course thumbnail on the external media service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailAsset {
    pub url: String,
    pub external_id: String,
}

/// A course in the catalogue, with its media embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub instructor_id: UserId,
    pub thumbnail: ThumbnailAsset,
    pub videos: Vec<VideoAsset>,
    pub price: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Course plus derived data for the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub enrollment_count: u64,
}
