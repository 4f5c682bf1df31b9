//! # Platform Commands

use stockbook_core::export::to_records;
use stockbook_core::Platform;

use super::{render_listing, ListArgs};
use crate::error::ViewError;
use crate::state::{ClientState, ConfigState};

const COLUMNS: &[&str] = &["_id", "name", "manufacturer", "releaseYear", "region"];

/// Renders the platform table.
pub async fn list_platforms(
    client: &ClientState,
    config: &ConfigState,
    args: &ListArgs,
) -> Result<String, ViewError> {
    let platforms: Vec<Platform> = client.inner().fetch_many().await?;
    tracing::debug!(count = platforms.len(), "Listing platforms");

    Ok(render_listing(
        to_records(&platforms)?,
        COLUMNS,
        args,
        config.page_size,
        "platforms",
    ))
}
