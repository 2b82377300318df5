//! Domain models for mining tenements.
//!
//! A [`NewTenement`] is what a jurisdiction source emits after normalization;
//! a [`TenementRecord`] is the same data stamped with its derived identity and
//! the start time of the sync run that wrote it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity;

/// An Australian state or territory that issues mining tenements.
///
/// The declaration order is the canonical order used by full syncs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Jurisdiction {
    /// Western Australia (live ArcGIS feed).
    Wa,
    /// New South Wales.
    Nsw,
    /// Victoria.
    Vic,
    /// Northern Territory.
    Nt,
    /// Queensland.
    Qld,
    /// Tasmania.
    Tas,
}

impl Jurisdiction {
    /// All jurisdictions in canonical sync order.
    pub const ALL: [Jurisdiction; 6] = [
        Jurisdiction::Wa,
        Jurisdiction::Nsw,
        Jurisdiction::Vic,
        Jurisdiction::Nt,
        Jurisdiction::Qld,
        Jurisdiction::Tas,
    ];

    /// Returns the uppercase jurisdiction code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Wa => "WA",
            Self::Nsw => "NSW",
            Self::Vic => "VIC",
            Self::Nt => "NT",
            Self::Qld => "QLD",
            Self::Tas => "TAS",
        }
    }

    /// Returns the full state or territory name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Wa => "Western Australia",
            Self::Nsw => "New South Wales",
            Self::Vic => "Victoria",
            Self::Nt => "Northern Territory",
            Self::Qld => "Queensland",
            Self::Tas => "Tasmania",
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Jurisdiction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WA" => Ok(Self::Wa),
            "NSW" => Ok(Self::Nsw),
            "VIC" => Ok(Self::Vic),
            "NT" => Ok(Self::Nt),
            "QLD" => Ok(Self::Qld),
            "TAS" => Ok(Self::Tas),
            _ => Err(AppError::InvalidJurisdiction(s.to_string())),
        }
    }
}

impl TryFrom<String> for Jurisdiction {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A normalized tenement as produced by a jurisdiction source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTenement {
    pub jurisdiction: Jurisdiction,
    /// Jurisdiction-local tenement number, e.g. `"M 15/1789"`.
    pub number: String,
    pub tenement_type: Option<String>,
    pub status: Option<String>,
    pub holder_name: Option<String>,
    /// Area in hectares.
    pub area_ha: Option<f64>,
    pub grant_date: Option<NaiveDate>,
    pub application_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    /// Centroid latitude, when known.
    pub latitude: Option<f64>,
    /// Centroid longitude, when known.
    pub longitude: Option<f64>,
    /// Provenance reference into the upstream feature service.
    pub source_wfs_ref: Option<String>,
    /// Provenance reference into the upstream titles register.
    pub source_mto_ref: Option<String>,
}

impl NewTenement {
    /// Creates a tenement with only the identifying fields set.
    pub fn new(jurisdiction: Jurisdiction, number: impl Into<String>) -> Self {
        Self {
            jurisdiction,
            number: number.into(),
            tenement_type: None,
            status: None,
            holder_name: None,
            area_ha: None,
            grant_date: None,
            application_date: None,
            expiry_date: None,
            latitude: None,
            longitude: None,
            source_wfs_ref: None,
            source_mto_ref: None,
        }
    }
}

/// One page returned by a [`TenementSource`](crate::TenementSource).
///
/// `fetched` is the number of raw rows the upstream returned for the page.
/// It can exceed `records.len()` when rows fail normalization, and it is what
/// the next page offset advances by.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePage {
    pub records: Vec<NewTenement>,
    pub fetched: usize,
}

impl SourcePage {
    /// A page where every upstream row normalized cleanly.
    pub fn new(records: Vec<NewTenement>) -> Self {
        let fetched = records.len();
        Self { records, fetched }
    }

    /// True when the upstream returned no rows at all.
    pub fn is_empty(&self) -> bool {
        self.fetched == 0
    }

    /// Rows the upstream returned that did not normalize into a tenement.
    pub fn dropped(&self) -> usize {
        self.fetched.saturating_sub(self.records.len())
    }
}

/// A tenement row as written to the shared store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenementRecord {
    /// Identity derived from `(jurisdiction, number)`.
    pub id: Uuid,
    #[serde(flatten)]
    pub tenement: NewTenement,
    /// Start time of the sync run that last wrote this row.
    pub last_sync_at: DateTime<Utc>,
}

impl TenementRecord {
    /// Stamps a normalized tenement with its derived id and sync timestamp.
    pub fn from_new(tenement: NewTenement, last_sync_at: DateTime<Utc>) -> Self {
        Self {
            id: identity::derive(tenement.jurisdiction, &tenement.number),
            tenement,
            last_sync_at,
        }
    }
}
