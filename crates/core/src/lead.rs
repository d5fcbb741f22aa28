//! Leads (buyer inquiries) and the per-dealer dashboard aggregate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

pub const LEAD_STATUS_NEW: &str = "new";
pub const LEAD_STATUS_CONTACTED: &str = "contacted";
pub const LEAD_STATUS_CONVERTED: &str = "converted";
pub const LEAD_STATUS_CLOSED: &str = "closed";

/// An inquiry against a listing.
///
/// `dealer_id` is copied from the listing when the lead is created and is
/// never looked up again. `status` is free text; the four constants above
/// are the values the dashboard knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: DbId,
    pub listing_id: DbId,
    pub dealer_id: DbId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    pub listing_id: DbId,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingLeadCount {
    pub listing_id: DbId,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadAnalytics {
    pub total_leads: i64,
    pub new_leads: i64,
    pub contacted_leads: i64,
    pub converted_leads: i64,
    pub leads_by_listing: Vec<ListingLeadCount>,
}

/// Bucket lead listing references by listing, busiest first. Ties keep
/// listing id order so the output is deterministic.
pub fn group_by_listing(listing_refs: &[DbId]) -> Vec<ListingLeadCount> {
    let mut counts: HashMap<DbId, i64> = HashMap::new();
    for listing_id in listing_refs {
        *counts.entry(*listing_id).or_default() += 1;
    }
    let mut grouped: Vec<_> = counts
        .into_iter()
        .map(|(listing_id, count)| ListingLeadCount { listing_id, count })
        .collect();
    grouped.sort_by(|a, b| b.count.cmp(&a.count).then(a.listing_id.cmp(&b.listing_id)));
    grouped
}
