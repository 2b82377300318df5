//! Synthetic tenement generators for jurisdictions without a live feed.
//!
//! NSW, VIC, NT, QLD and TAS do not yet have an integration. Their sources
//! generate plausible records from a per-jurisdiction profile. Record `i` is
//! always generated from the same seed, so paging is stable across calls and
//! a re-sync upserts the same rows instead of inserting new ones.

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tenement_core::error::AppError;
use tenement_core::traits::TenementSource;
use tenement_core::{Jurisdiction, NewTenement, SourcePage};

/// Maximum records a placeholder source returns per page.
pub const PLACEHOLDER_PAGE_SIZE: usize = 1000;

/// Provenance marker stored on every generated record.
pub const PLACEHOLDER_MTO_REF: &str = "PLACEHOLDER";

/// Static description of a jurisdiction's synthetic data.
#[derive(Debug)]
pub struct PlaceholderProfile {
    pub jurisdiction: Jurisdiction,
    /// `(number prefix, tenement type)` pairs.
    pub kinds: &'static [(&'static str, &'static str)],
    pub holders: &'static [&'static str],
    pub latitude: (f64, f64),
    pub longitude: (f64, f64),
    pub default_count: u64,
}

static NSW: PlaceholderProfile = PlaceholderProfile {
    jurisdiction: Jurisdiction::Nsw,
    kinds: &[
        ("EL", "Exploration Licence"),
        ("ML", "Mining Lease"),
        ("AL", "Assessment Lease"),
        ("CL", "Consolidated Coal Lease"),
    ],
    holders: &[
        "Hunter Valley Resources Pty Ltd",
        "Cobar Basin Minerals Ltd",
        "Lachlan Fold Gold Pty Ltd",
        "Broken Hill Exploration Ltd",
        "Gunnedah Coal Holdings Pty Ltd",
    ],
    latitude: (-37.5, -28.2),
    longitude: (141.0, 153.6),
    default_count: 2156,
};

static VIC: PlaceholderProfile = PlaceholderProfile {
    jurisdiction: Jurisdiction::Vic,
    kinds: &[
        ("EL", "Exploration Licence"),
        ("MIN", "Mining Licence"),
        ("RL", "Retention Licence"),
        ("PL", "Prospecting Licence"),
    ],
    holders: &[
        "Bendigo Goldfields Pty Ltd",
        "Ballarat Reef Mining Ltd",
        "Gippsland Minerals Pty Ltd",
        "Stawell Exploration Ltd",
    ],
    latitude: (-39.1, -34.0),
    longitude: (141.0, 149.9),
    default_count: 1834,
};

static NT: PlaceholderProfile = PlaceholderProfile {
    jurisdiction: Jurisdiction::Nt,
    kinds: &[
        ("EL", "Exploration Licence"),
        ("ML", "Mineral Lease"),
        ("ERL", "Exploration Retention Licence"),
        ("EMP", "Extractive Mineral Permit"),
    ],
    holders: &[
        "Tanami Desert Gold Pty Ltd",
        "Arnhem Land Resources Ltd",
        "Tennant Creek Minerals Pty Ltd",
        "McArthur Basin Exploration Ltd",
    ],
    latitude: (-26.0, -11.0),
    longitude: (129.0, 138.0),
    default_count: 987,
};

static QLD: PlaceholderProfile = PlaceholderProfile {
    jurisdiction: Jurisdiction::Qld,
    kinds: &[
        ("EPM", "Exploration Permit Minerals"),
        ("EPC", "Exploration Permit Coal"),
        ("MDL", "Mineral Development Licence"),
        ("ML", "Mining Lease"),
    ],
    holders: &[
        "Bowen Basin Coal Pty Ltd",
        "Mount Isa Base Metals Ltd",
        "Galilee Energy Resources Pty Ltd",
        "Charters Towers Gold Ltd",
        "Cape York Bauxite Pty Ltd",
    ],
    latitude: (-29.0, -10.7),
    longitude: (138.0, 153.5),
    default_count: 3421,
};

static TAS: PlaceholderProfile = PlaceholderProfile {
    jurisdiction: Jurisdiction::Tas,
    kinds: &[
        ("EL", "Exploration Licence"),
        ("ML", "Mining Lease"),
        ("RL", "Retention Licence"),
    ],
    holders: &[
        "West Coast Tin Pty Ltd",
        "Rosebery Zinc Holdings Ltd",
        "Tamar Valley Minerals Pty Ltd",
    ],
    latitude: (-43.6, -39.6),
    longitude: (144.6, 148.5),
    default_count: 1247,
};

impl PlaceholderProfile {
    /// Returns the profile for a jurisdiction, or `None` for WA which has a
    /// live feed.
    pub fn for_jurisdiction(jurisdiction: Jurisdiction) -> Option<&'static PlaceholderProfile> {
        match jurisdiction {
            Jurisdiction::Wa => None,
            Jurisdiction::Nsw => Some(&NSW),
            Jurisdiction::Vic => Some(&VIC),
            Jurisdiction::Nt => Some(&NT),
            Jurisdiction::Qld => Some(&QLD),
            Jurisdiction::Tas => Some(&TAS),
        }
    }
}

/// Deterministic synthetic source for one jurisdiction.
#[derive(Debug, Clone)]
pub struct PlaceholderSource {
    profile: &'static PlaceholderProfile,
    target_count: u64,
}

impl PlaceholderSource {
    /// Creates a source using the profile's default record count unless
    /// `target_count` overrides it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` for a jurisdiction without a
    /// placeholder profile.
    pub fn new(jurisdiction: Jurisdiction, target_count: Option<u64>) -> Result<Self, AppError> {
        let profile = PlaceholderProfile::for_jurisdiction(jurisdiction).ok_or_else(|| {
            AppError::ConfigError(format!(
                "{} has a live data source and no placeholder profile",
                jurisdiction
            ))
        })?;

        Ok(Self {
            profile,
            target_count: target_count.unwrap_or(profile.default_count),
        })
    }

    pub fn target_count(&self) -> u64 {
        self.target_count
    }

    /// Generates record `index`. The same index always yields the same record.
    pub fn generate(&self, index: u64) -> NewTenement {
        let profile = self.profile;
        let mut rng = StdRng::seed_from_u64(seed(profile.jurisdiction, index));

        let (prefix, kind) = profile.kinds[rng.random_range(0..profile.kinds.len())];
        let holder = profile.holders[rng.random_range(0..profile.holders.len())];
        let granted = rng.random_bool(0.85);

        let mut tenement =
            NewTenement::new(profile.jurisdiction, format!("{} {}", prefix, 1000 + index));
        tenement.tenement_type = Some(kind.to_string());
        tenement.holder_name = Some(holder.to_string());
        tenement.status = Some(if granted { "Granted" } else { "Pending" }.to_string());
        tenement.area_ha = Some((rng.random_range(5.0..50_000.0_f64) * 100.0).round() / 100.0);
        tenement.latitude = Some(rng.random_range(profile.latitude.0..profile.latitude.1));
        tenement.longitude = Some(rng.random_range(profile.longitude.0..profile.longitude.1));

        let applied = NaiveDate::from_ymd_opt(1995, 1, 1)
            .and_then(|base| base.checked_add_days(Days::new(rng.random_range(0..10_000))));
        let grant_lag = Days::new(rng.random_range(30..=365));
        let term = Days::new(365 * rng.random_range(3..=21));

        tenement.application_date = applied;
        if granted {
            tenement.grant_date = applied.and_then(|d| d.checked_add_days(grant_lag));
            tenement.expiry_date = tenement.grant_date.and_then(|d| d.checked_add_days(term));
        }
        tenement.source_mto_ref = Some(PLACEHOLDER_MTO_REF.to_string());
        tenement
    }
}

fn seed(jurisdiction: Jurisdiction, index: u64) -> u64 {
    ((jurisdiction as u64 + 1) << 48) ^ index
}

// =============================================================================
// Trait Implementation: TenementSource
// =============================================================================

impl TenementSource for PlaceholderSource {
    fn jurisdiction(&self) -> Jurisdiction {
        self.profile.jurisdiction
    }

    fn page_size(&self) -> usize {
        PLACEHOLDER_PAGE_SIZE
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.target_count)
    }

    async fn fetch_page(&self, offset: u64, limit: usize) -> Result<SourcePage, AppError> {
        let end = offset
            .saturating_add(limit.min(PLACEHOLDER_PAGE_SIZE) as u64)
            .min(self.target_count);
        Ok(SourcePage::new((offset..end).map(|i| self.generate(i)).collect()))
    }
}
