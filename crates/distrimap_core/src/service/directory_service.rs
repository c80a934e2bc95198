//! Directory use-case service.
//!
//! # Responsibility
//! - Combine store listing with proximity ranking for the listing endpoint.
//! - Provide stable CRUD entry points for API callers.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - With a reference point, pagination applies to the ranked list, never to
//!   the raw store order, so the closest matches are never paged away.
//! - Without a reference point, results keep store order and carry no
//!   distance.

use crate::geo::{filter_by_radius, nearest, Coordinates, ProximityResult};
use crate::model::distributeur::{Distributeur, DistributeurId};
use crate::repo::distributeur_repo::{
    DirectoryStats, DistributeurListQuery, DistributeurRepository, RepoError, RepoResult,
};
use log::{debug, info};
use std::time::Instant;

/// Radius applied when the caller supplies a location without one.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Location part of a listing request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityQuery {
    pub reference: Coordinates,
    /// Inclusive radius in kilometers.
    pub radius_km: f64,
}

impl ProximityQuery {
    pub fn new(reference: Coordinates, radius_km: Option<f64>) -> Self {
        Self {
            reference,
            radius_km: radius_km.unwrap_or(DEFAULT_RADIUS_KM),
        }
    }
}

/// Listing request: store filters and page, plus an optional location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingRequest {
    pub filter: DistributeurListQuery,
    pub proximity: Option<ProximityQuery>,
}

/// One listing row: the distributeur plus `distance` when ranked.
pub type ListedDistributeur = ProximityResult<Distributeur>;

/// Use-case service wrapper for the distributeur directory.
pub struct DirectoryService<R: DistributeurRepository> {
    repo: R,
}

impl<R: DistributeurRepository> DirectoryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists distributeurs, ranked by distance when a location is supplied.
    pub fn list(&self, request: &ListingRequest) -> RepoResult<Vec<ListedDistributeur>> {
        let started_at = Instant::now();

        let Some(proximity) = request.proximity else {
            let items = self
                .repo
                .list_distributeurs(&request.filter)?
                .into_iter()
                .map(ProximityResult::unranked)
                .collect::<Vec<_>>();
            info!(
                "event=listing module=service status=ok mode=plain returned={} duration_ms={}",
                items.len(),
                started_at.elapsed().as_millis()
            );
            return Ok(items);
        };

        let candidates = self
            .repo
            .list_distributeurs(&request.filter.unpaginated())?;
        let candidate_count = candidates.len();
        let ranked = filter_by_radius(candidates, Some(proximity.reference), proximity.radius_km);
        let in_radius = ranked.len();
        let items = paginate(ranked, request.filter.limit, request.filter.offset);

        info!(
            "event=listing module=service status=ok mode=proximity radius_km={} candidates={} in_radius={} returned={} duration_ms={}",
            proximity.radius_km,
            candidate_count,
            in_radius,
            items.len(),
            started_at.elapsed().as_millis()
        );
        Ok(items)
    }

    /// Returns the `limit` closest distributeurs matching `filter`, whatever
    /// their distance.
    pub fn find_nearest(
        &self,
        reference: Coordinates,
        filter: &DistributeurListQuery,
        limit: usize,
    ) -> RepoResult<Vec<ListedDistributeur>> {
        let candidates = self.repo.list_distributeurs(&filter.unpaginated())?;
        debug!(
            "event=nearest module=service status=ok candidates={} limit={}",
            candidates.len(),
            limit
        );
        Ok(nearest(candidates, reference, limit))
    }

    /// Creates a distributeur and returns it as stored (timestamps set).
    pub fn create(&mut self, distributeur: &Distributeur) -> RepoResult<Distributeur> {
        let id = self.repo.create_distributeur(distributeur)?;
        self.reload(id)
    }

    /// Replaces a distributeur and returns it as stored.
    pub fn update(&mut self, distributeur: &Distributeur) -> RepoResult<Distributeur> {
        self.repo.update_distributeur(distributeur)?;
        self.reload(distributeur.id)
    }

    pub fn get(&self, id: DistributeurId) -> RepoResult<Option<Distributeur>> {
        self.repo.get_distributeur(id)
    }

    pub fn delete(&mut self, id: DistributeurId) -> RepoResult<()> {
        self.repo.delete_distributeur(id)
    }

    pub fn villes(&self) -> RepoResult<Vec<String>> {
        self.repo.list_villes()
    }

    pub fn types(&self) -> RepoResult<Vec<String>> {
        self.repo.list_types()
    }

    pub fn stats(&self) -> RepoResult<DirectoryStats> {
        self.repo.directory_stats()
    }

    fn reload(&self, id: DistributeurId) -> RepoResult<Distributeur> {
        self.repo
            .get_distributeur(id)?
            .ok_or(RepoError::NotFound(id))
    }
}

fn paginate<T>(items: Vec<T>, limit: Option<u32>, offset: u32) -> Vec<T> {
    let skip = usize::try_from(offset).unwrap_or(usize::MAX);
    let take = limit.map_or(usize::MAX, |limit| {
        usize::try_from(limit).unwrap_or(usize::MAX)
    });
    items.into_iter().skip(skip).take(take).collect()
}

#[cfg(test)]
mod tests {
    use super::{paginate, ProximityQuery, DEFAULT_RADIUS_KM};
    use crate::geo::Coordinates;

    #[test]
    fn paginate_applies_offset_then_limit() {
        assert_eq!(paginate(vec![1, 2, 3, 4, 5], Some(2), 1), vec![2, 3]);
        assert_eq!(paginate(vec![1, 2, 3], None, 2), vec![3]);
        assert!(paginate(vec![1, 2, 3], Some(5), 10).is_empty());
    }

    #[test]
    fn proximity_query_defaults_radius() {
        let query = ProximityQuery::new(Coordinates::new(4.0, 9.0), None);
        assert_eq!(query.radius_km, DEFAULT_RADIUS_KM);
    }
}
