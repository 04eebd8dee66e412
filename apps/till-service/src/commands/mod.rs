//! # Service Commands
//!
//! One handler per command, grouped by resource:
//!
//! | Module       | Commands                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`product`]  | create/list/get/update/retire/reinstate/delete product     |
//! | [`sale`]     | record/get/list/reverse/replace sale, summary, receipt     |
//! | [`settings`] | get_settings, put_settings                                 |
//! | [`health`]   | health                                                     |
//!
//! Handlers take typed arguments and return DTOs with camelCase fields.
//! Money crosses the boundary as decimal strings (`"100.00"`) and rates as
//! percentages (`"5%"`), so callers never deal with minor units or basis
//! points.

pub mod health;
pub mod product;
pub mod sale;
pub mod settings;

use serde::Deserialize;
use till_core::validation::validate_id;

use crate::error::ApiResult;

/// Arguments for commands addressing one record by id.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdArgs {
    pub id: i64,
}

impl IdArgs {
    /// The id, or `INVALID_INPUT` when it is not positive.
    pub fn checked(self) -> ApiResult<i64> {
        checked_id("id", self.id)
    }
}

/// Store-assigned ids are always positive; anything else is a bad request
/// rather than a lookup miss.
pub fn checked_id(field: &str, id: i64) -> ApiResult<i64> {
    validate_id(field, id)?;
    Ok(id)
}
