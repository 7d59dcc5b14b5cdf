//! API query models for the analytics endpoint.
//!
//! The response types live in [`crate::analytics`], next to the aggregation
//! itself.

use crate::api::models::tools::Tool;
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Date window + optional tool filter for the analytics summary.
///
/// Both dates are calendar dates interpreted in UTC; `to` is inclusive of its
/// whole day. Defaults to the last 7 days when omitted.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct AnalyticsQuery {
    #[schema(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    pub tool: Option<Tool>,
}
