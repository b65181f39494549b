//! Claim listing and statistics

use std::sync::Arc;

use rcm_domain::constants::{CLAIMS_PATH, CLAIMS_REVALIDATE_PATH, CLAIMS_STATISTICS_PATH};
use rcm_domain::{Claim, ClaimFilter, Listing, RevalidationResponse, Statistics};
use tracing::{debug, instrument};

use super::errors::ApiError;
use super::request::ApiRequest;
use super::transport::AuthenticatedTransport;

/// Claims listing, detail, statistics and revalidation
#[derive(Clone)]
pub struct ClaimsApi {
    transport: Arc<AuthenticatedTransport>,
}

impl ClaimsApi {
    /// Client over a shared transport
    pub fn new(transport: Arc<AuthenticatedTransport>) -> Self {
        Self { transport }
    }

    /// List claims matching the filter
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ClaimFilter) -> Result<Listing<Claim>, ApiError> {
        let request = ApiRequest::get(CLAIMS_PATH).query(filter.to_query());
        let listing: Listing<Claim> = self.transport.send_json(request).await?;

        debug!(returned = listing.items().len(), total = listing.total(), "Claims listed");
        Ok(listing)
    }

    /// `GET /claims/{id}/`
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Claim, ApiError> {
        self.transport.send_json(ApiRequest::get(format!("{CLAIMS_PATH}{id}/"))).await
    }

    /// Aggregate counts and paid amounts by error type
    #[instrument(skip(self))]
    pub async fn statistics(&self) -> Result<Statistics, ApiError> {
        self.transport.send_json(ApiRequest::get(CLAIMS_STATISTICS_PATH)).await
    }

    /// Re-run validation for every stored claim with the active rules
    #[instrument(skip(self))]
    pub async fn revalidate(&self) -> Result<RevalidationResponse, ApiError> {
        self.transport.send_json(ApiRequest::post(CLAIMS_REVALIDATE_PATH)).await
    }
}
