use shared::domain::Identity;
use tracing::{info, warn};

use crate::{
    error::{describe, ClientError, ClientResult},
    transport::AttendanceBackend,
};

/// Loads today's selectable routes. Every failure shape (transport, status,
/// malformed body, `ok: false`) comes back as `CatalogUnavailable`.
pub async fn load_routes(
    backend: &dyn AttendanceBackend,
    identity: &Identity,
) -> ClientResult<Vec<String>> {
    let response = match backend.fetch_routes(identity).await {
        Ok(response) => response,
        Err(err) => {
            warn!(salesperson = %identity.display_name(), "route catalog fetch failed: {err:#}");
            return Err(ClientError::CatalogUnavailable(describe(&err)));
        }
    };

    match response.into_routes() {
        Ok(routes) => {
            info!(
                salesperson = %identity.display_name(),
                count = routes.len(),
                "loaded route catalog"
            );
            Ok(routes)
        }
        Err(err) => {
            warn!(salesperson = %identity.display_name(), "route catalog rejected: {err}");
            Err(ClientError::CatalogUnavailable(err.message))
        }
    }
}
