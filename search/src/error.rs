use opensearch::http::StatusCode;
use opensearch::http::response::Response;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("error deserializing search response body: {details}")]
    Deserialization { details: String },
    #[error("error serializing index document: {details}")]
    Serialization { details: String },
    #[error("search request failed. status_code: {status_code} message: {message}")]
    Request { status_code: u16, message: String },
    #[error(transparent)]
    Build(#[from] opensearch::http::transport::BuildError),
    #[error(transparent)]
    Transport(#[from] opensearch::Error),
}

pub(crate) trait ResponseExt {
    #[allow(async_fn_in_trait)]
    async fn map_client_error(self) -> Result<Response, Error>;
}

impl ResponseExt for Response {
    async fn map_client_error(self) -> Result<Response, Error> {
        match self.status_code() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => Ok(self),
            _ => Err(Error::Request {
                status_code: self.status_code().as_u16(),
                message: self.text().await.unwrap_or_default(),
            }),
        }
    }
}

impl ResponseExt for Result<Response, opensearch::Error> {
    async fn map_client_error(self) -> Result<Response, Error> {
        match self {
            Ok(response) => response.map_client_error().await,
            Err(e) => Err(Error::Transport(e)),
        }
    }
}
