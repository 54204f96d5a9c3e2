// SPDX-License-Identifier: MPL-2.0
//! Image loading port definition.
//!
//! The editor consumes images through [`ImageLoader`] so that the source
//! (network, disk, an in-memory test double) stays outside the core.

use crate::domain::error::LoadError;
use crate::domain::Bitmap;
use futures_util::future::BoxFuture;

/// Port for fetching an image by URL.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; loads run on background tasks.
///
/// # Errors
///
/// Every failure is reported as a [`LoadError`] with a readable message: a
/// non-200 response or an undecodable body never panics and never yields an
/// empty result without a reason.
pub trait ImageLoader: Send + Sync {
    /// Loads and decodes the image at `url`.
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bitmap, LoadError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Color;
    use futures_util::FutureExt;

    struct Fixed(Bitmap);

    impl ImageLoader for Fixed {
        fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bitmap, LoadError>> {
            let result = if url.is_empty() {
                Err(LoadError::InvalidUrl(url.to_string()))
            } else {
                Ok(self.0.clone())
            };
            async move { result }.boxed()
        }
    }

    #[tokio::test]
    async fn trait_objects_can_be_shared() {
        let loader: std::sync::Arc<dyn ImageLoader> =
            std::sync::Arc::new(Fixed(Bitmap::filled(1, 1, Color::WHITE)));
        assert!(loader.load("memory://a").await.is_ok());
        assert_eq!(
            loader.load("").await,
            Err(LoadError::InvalidUrl(String::new()))
        );
    }
}
