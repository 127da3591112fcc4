//! Sun port — sunrise, sunset and twilight times for the installation site.

use minerhub_domain::forecast::Sun;
use minerhub_domain::time::Timestamp;

/// Computes sun events for the day containing `at`.
pub trait SunProvider: Send + Sync {
    fn sun(&self, at: Timestamp) -> Sun;
}
