pub mod error;
#[cfg(any(test, feature = "mocking"))]
pub mod mocking;
mod model;

pub use error::Error;

use opensearch::OpenSearch;
use opensearch::auth::Credentials;
use opensearch::cert::CertificateValidation;
use opensearch::http::StatusCode;
use opensearch::http::transport::SingleNodeConnectionPool;
use opensearch::http::transport::TransportBuilder;
use opensearch::indices::IndicesCreateParts;
use opensearch::indices::IndicesExistsParts;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use error::ResponseExt as _;

pub type Result<T> = std::result::Result<T, Error>;

/// One index per entity, mirroring the store table names
pub static PERSON_INDEX: &str = "person";
pub static DOCUMENT_INDEX: &str = "document";
pub static CONTENT_INDEX: &str = "content";

pub static INDICES: [&str; 3] = [PERSON_INDEX, DOCUMENT_INDEX, CONTENT_INDEX];

/// The text-search mirror of the store
///
/// Each record is indexed under its store identifier, with the full serialized
/// entity as the indexed document, so search hits deserialize straight back
/// into entities.
#[derive(Debug)]
pub enum SearchClient {
    Opensearch(OpensearchClient),
    #[cfg(any(test, feature = "mocking"))]
    Mocked(mocking::MockSearchClient),
}

impl SearchClient {
    /// Mirrors a record into the given index under its identifier
    pub async fn index<T: Serialize + Sync>(&self, index: &str, id: i64, doc: &T) -> Result<()> {
        match self {
            Self::Opensearch(client) => client.index(index, id, doc).await,
            #[cfg(any(test, feature = "mocking"))]
            Self::Mocked(mock) => {
                let value = serde_json::to_value(doc).map_err(|e| Error::Serialization {
                    details: e.to_string(),
                })?;
                mock.index_value(index, id, value);
                Ok(())
            }
        }
    }

    /// Removes a record from the given index, ignoring records that were never mirrored
    pub async fn delete(&self, index: &str, id: i64) -> Result<()> {
        match self {
            Self::Opensearch(client) => client.delete(index, id).await,
            #[cfg(any(test, feature = "mocking"))]
            Self::Mocked(mock) => {
                mock.delete_value(index, id);
                Ok(())
            }
        }
    }

    /// Runs a free-text query over the given index and deserializes the hits
    pub async fn search<T: DeserializeOwned>(&self, index: &str, query: &str) -> Result<Vec<T>> {
        match self {
            Self::Opensearch(client) => client.search(index, query).await,
            #[cfg(any(test, feature = "mocking"))]
            Self::Mocked(mock) => mock
                .search_values(index, query)
                .into_iter()
                .map(|value| {
                    serde_json::from_value(value).map_err(|e| Error::Deserialization {
                        details: e.to_string(),
                    })
                })
                .collect(),
        }
    }

    pub async fn health(&self) -> Result<()> {
        match self {
            Self::Opensearch(client) => client.health().await,
            #[cfg(any(test, feature = "mocking"))]
            Self::Mocked(_) => Ok(()),
        }
    }

    /// Checks if the index exists, if not it will create it with dynamic mappings
    pub async fn ensure_index_exists(&self, index: &str) -> Result<()> {
        match self {
            Self::Opensearch(client) => client.ensure_index_exists(index).await,
            #[cfg(any(test, feature = "mocking"))]
            Self::Mocked(_) => Ok(()),
        }
    }
}

#[cfg(any(test, feature = "mocking"))]
impl From<mocking::MockSearchClient> for SearchClient {
    fn from(mock: mocking::MockSearchClient) -> Self {
        Self::Mocked(mock)
    }
}

/// The OpenSearch-backed search client used outside of tests
#[derive(Debug, Clone)]
pub struct OpensearchClient {
    inner: OpenSearch,
}

impl OpensearchClient {
    pub fn new(url: Url, username: String, password: String) -> Result<Self> {
        let credentials = Credentials::Basic(username, password);
        let conn_pool = SingleNodeConnectionPool::new(url.clone());

        let cert_validation = if url.as_str().starts_with("https://localhost") {
            CertificateValidation::None
        } else {
            CertificateValidation::Default
        };
        let transport = TransportBuilder::new(conn_pool)
            .auth(credentials)
            .disable_proxy()
            .cert_validation(cert_validation)
            .build()?;
        Ok(Self {
            inner: OpenSearch::new(transport),
        })
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn health(&self) -> Result<()> {
        let response = self.inner.cat().health().send().await?;
        let status = response.status_code();

        if status != StatusCode::OK {
            return Err(Error::Request {
                status_code: status.as_u16(),
                message: "search cluster health check failed".to_owned(),
            });
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn ensure_index_exists(&self, index: &str) -> Result<()> {
        let exists = self
            .inner
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await?;

        let exists = exists.status_code().is_success();

        tracing::trace!(exists = ?exists, "checking if index exists");

        if !exists {
            tracing::info!(index, "index does not exist, creating...");
            self.inner
                .indices()
                .create(IndicesCreateParts::Index(index))
                .send()
                .await
                .map_client_error()
                .await?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, doc))]
    async fn index<T: Serialize + Sync>(&self, index: &str, id: i64, doc: &T) -> Result<()> {
        let id = id.to_string();
        self.inner
            .index(opensearch::IndexParts::IndexId(index, &id))
            .body(doc)
            .send()
            .await
            .map_client_error()
            .await?;
        tracing::trace!(%id, "record indexed successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, index: &str, id: i64) -> Result<()> {
        let id = id.to_string();
        let response = self
            .inner
            .delete(opensearch::DeleteParts::IndexId(index, &id))
            .send()
            .await?;
        // a record that was never mirrored is not an error to forget
        if response.status_code() == StatusCode::NOT_FOUND {
            tracing::trace!(%id, "record was not indexed");
            return Ok(());
        }
        response.map_client_error().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn search<T: DeserializeOwned>(&self, index: &str, query: &str) -> Result<Vec<T>> {
        let body = serde_json::json!({
            "query": {
                "query_string": {
                    "query": query,
                }
            },
            "size": 1000,
        });

        let response = self
            .inner
            .search(opensearch::SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_client_error()
            .await?;

        let result: model::SearchResponse<T> =
            response
                .json()
                .await
                .map_err(|e| Error::Deserialization {
                    details: e.to_string(),
                })?;

        Ok(result
            .hits
            .hits
            .into_iter()
            .map(|hit| hit.source)
            .collect())
    }
}
