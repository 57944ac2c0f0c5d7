//! Builds an `object_store` client from resolved endpoint credentials.
//!
//! Kept separate from [`crate::byte_reader`] so the `object_store` builder
//! call — the one piece of this module that genuinely needs the concrete
//! crate type rather than the `ObjectStore` trait — has a single home.

use std::sync::Arc;

use mosaic_core::{Error, Result};
use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;

use crate::credentials::EndpointCredentials;

/// Builds an S3-compatible object store client scoped to `bucket`, reached
/// through `creds`'s endpoint.
pub fn build_store(creds: &EndpointCredentials, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
    let endpoint = format!("{}://{}", creds.scheme, creds.host);
    let store = AmazonS3Builder::new()
        .with_endpoint(endpoint)
        .with_access_key_id(&creds.access_key)
        .with_secret_access_key(&creds.secret_key)
        .with_virtual_hosted_style_request(false)
        .with_bucket_name(bucket)
        .with_allow_http(creds.scheme == "http")
        .build()
        .map_err(|e| Error::Io(format!("object store client: {e}")))?;
    Ok(Arc::new(store))
}
