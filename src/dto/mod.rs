use serde::{Deserialize, Deserializer};

pub mod auth;
pub mod categories;
pub mod checkout;
pub mod coupons;
pub mod products;
pub mod uploads;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
