//! Content category path extractor

use crate::error::MediaError;
use crate::storage::ContentCategory;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct CategoryParam {
    category: String,
}

/// The `{category}` route segment, parsed before the request body is read
///
/// Unknown names are rejected with [`MediaError::InvalidCategory`], so a
/// request to a bad category fails on the category alone, whatever its body.
///
/// # Example
///
/// ```rust,no_run
/// use euphony_media::extractors::CategoryPath;
///
/// async fn handler(CategoryPath(category): CategoryPath) -> String {
///     category.directory().to_string()
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPath(pub ContentCategory);

impl<S> FromRequestParts<S> for CategoryPath
where
    S: Send + Sync,
{
    type Rejection = MediaError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let name = Path::<CategoryParam>::from_request_parts(parts, state)
            .await
            .map_or_else(
                |rejection| {
                    tracing::debug!(error = %rejection, "Route has no category segment");
                    String::new()
                },
                |Path(param)| param.category,
            );

        ContentCategory::parse(&name).map(Self)
    }
}
