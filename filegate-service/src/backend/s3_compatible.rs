use std::fmt;

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};

use super::ObjectBackend;
use super::common::{BackendError, BackendResult};
use crate::key;
use crate::objects::{ObjectDownload, ObjectEntry};

/// Object backend for S3 and S3-compatible services.
pub struct S3CompatibleObjects {
    bucket: Box<Bucket>,
}

/// Configuration for [`S3CompatibleObjects`].
pub struct S3CompatibleConfig<'a> {
    pub bucket: &'a str,
    pub region: &'a str,
    pub endpoint: Option<&'a str>,
    pub access_key: Option<&'a str>,
    pub secret_key: Option<&'a str>,
    pub path_style: bool,
}

impl S3CompatibleObjects {
    /// Creates a new S3-compatible backend bound to the given bucket.
    pub fn new(config: S3CompatibleConfig<'_>) -> anyhow::Result<Self> {
        let credentials = Credentials::new(
            config.access_key,
            config.secret_key,
            None,
            None,
            None,
        )?;

        let region = match config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.to_owned(),
                endpoint: endpoint.to_owned(),
            },
            None => config.region.parse()?,
        };

        let mut bucket = Bucket::new(config.bucket, region, credentials)?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket })
    }
}

impl fmt::Debug for S3CompatibleObjects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3CompatibleObjects")
            .field("bucket", &self.bucket.name())
            .field("endpoint", &self.bucket.host())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ObjectBackend for S3CompatibleObjects {
    fn name(&self) -> &'static str {
        "s3-compatible"
    }

    #[tracing::instrument(level = "trace", fields(key), skip_all)]
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        content: Bytes,
    ) -> BackendResult<()> {
        tracing::debug!("Writing to s3-compatible backend");
        self.bucket
            .put_object_with_content_type(key, &content, content_type)
            .await
            .map_err(|cause| BackendError::s3("put object", cause))?;

        Ok(())
    }

    #[tracing::instrument(level = "trace", fields(key), skip_all)]
    async fn get_object(&self, key: &str) -> BackendResult<Option<ObjectDownload>> {
        tracing::debug!("Reading from s3-compatible backend");
        let response = match self.bucket.get_object(key).await {
            Ok(response) if response.status_code() == 404 => return Ok(None),
            Ok(response) => response,
            Err(S3Error::HttpFailWithBody(404, _)) => return Ok(None),
            Err(cause) => return Err(BackendError::s3("get object", cause)),
        };

        let content_type = response
            .headers()
            .get("content-type")
            .cloned()
            .unwrap_or_else(|| key::resolve_content_type(None, key));

        // The S3 client hands back a fully buffered body, which is
        // forwarded as a single-chunk stream.
        let bytes = Bytes::from(response.to_vec());
        let stream = stream::once(async move { Ok(bytes) }).boxed();

        Ok(Some(ObjectDownload {
            content_type,
            stream,
        }))
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn list_objects(&self) -> BackendResult<Vec<ObjectEntry>> {
        tracing::debug!("Listing s3-compatible backend");
        // `list` follows continuation tokens until the listing is
        // exhausted, yielding one result page per request.
        let pages = self
            .bucket
            .list(String::new(), None)
            .await
            .map_err(|cause| BackendError::s3("list objects", cause))?;

        let entries = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| ObjectEntry {
                key: object.key,
                size: object.size,
                last_modified: object.last_modified,
            })
            .collect();

        Ok(entries)
    }
}
