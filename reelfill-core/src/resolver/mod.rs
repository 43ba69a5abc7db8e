mod letterboxd;
pub mod page;
pub mod url;

use async_trait::async_trait;
use reelfill_model::MovieIdentity;

pub use letterboxd::LetterboxdResolver;
pub use page::{PageIdentity, identity_from_page};
pub use url::{
    canonical_film_url, find_review_url, normalize_review_url, slug_title,
};

/// Turns a review-site link into a best-effort film identity.
///
/// Implementations never fail: network and parse errors are logged and the
/// fields determined so far are returned, possibly none at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> MovieIdentity;
}
