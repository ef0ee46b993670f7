use axum::extract::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use database::DbConnectionPoolV2;
use search::SearchClient;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

use super::people::SearchQueryParams;
use crate::error::DossierError;
use crate::error::InternalError;
use crate::error::Result;
use dossier_models::Document;
use dossier_models::prelude::*;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Couldn't find the document with the given document ID
    #[error("Document '{document_id}' could not be found")]
    NotFound { document_id: i64 },
    /// The document exists but no content row holds its bytes
    #[error("Document '{document_id}' has no stored content")]
    ContentNotFound { document_id: i64 },
    #[error("A new document cannot already have an identifier")]
    IdExists,
    #[error("An existing document identifier is required")]
    IdMissing,
    #[error("Cannot update document '{document_id}' as it does not exist")]
    UpdateUnknownId { document_id: i64 },
    #[error(transparent)]
    Database(#[from] dossier_models::Error),
}

impl DossierError for DocumentError {
    fn get_status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } | Self::ContentNotFound { .. } => StatusCode::NOT_FOUND,
            Self::IdExists | Self::IdMissing | Self::UpdateUnknownId { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn get_type(&self) -> &str {
        match self {
            Self::NotFound { .. } => "dossier:document:NotFound",
            Self::ContentNotFound { .. } => "dossier:document:ContentNotFound",
            Self::IdExists => "dossier:document:IdExists",
            Self::IdMissing => "dossier:document:IdMissing",
            Self::UpdateUnknownId { .. } => "dossier:document:UpdateUnknownId",
            Self::Database(_) => "dossier:document:Database",
        }
    }

    fn context(&self) -> std::collections::HashMap<String, serde_json::Value> {
        match self {
            Self::NotFound { document_id }
            | Self::ContentNotFound { document_id }
            | Self::UpdateUnknownId { document_id } => {
                [("document_id".to_string(), (*document_id).into())].into()
            }
            _ => Default::default(),
        }
    }
}

/// The payload of the document create and update endpoints
#[derive(Debug, Deserialize, ToSchema)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(in crate::views) struct DocumentForm {
    pub id: Option<i64>,
    pub title: String,
    pub mime_type: String,
    #[serde(default)]
    pub size: i64,
    pub person_id: Option<i64>,
    pub content_id: Option<i64>,
}

impl DocumentForm {
    fn into_document_changeset(self) -> Changeset<Document> {
        Document::changeset()
            .title(self.title)
            .mime_type(self.mime_type)
            .size(self.size)
            .person_id(self.person_id)
            .content_id(self.content_id)
    }
}

#[utoipa::path(
    post, path = "/api/documents",
    tag = "documents",
    request_body = DocumentForm,
    responses(
        (status = 201, body = Document, description = "The created document"),
        (status = 400, body = InternalError, description = "The payload already carries an identifier"),
    )
)]
pub(in crate::views) async fn create(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    State(search_client): State<Arc<SearchClient>>,
    Json(data): Json<DocumentForm>,
) -> Result<impl IntoResponse> {
    if data.id.is_some() {
        return Err(DocumentError::IdExists.into());
    }
    let document = data
        .into_document_changeset()
        .create(&mut db_pool.get().await?)
        .await
        .map_err(DocumentError::from)?;

    search_client
        .index(search::DOCUMENT_INDEX, document.id, &document)
        .await?;

    let location = format!("/api/documents/{}", document.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(document),
    ))
}

#[utoipa::path(
    put, path = "/api/documents",
    tag = "documents",
    request_body = DocumentForm,
    responses(
        (status = 200, body = Document, description = "The updated document"),
        (status = 400, body = InternalError, description = "The payload has no identifier or an unknown one"),
    )
)]
pub(in crate::views) async fn update(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    State(search_client): State<Arc<SearchClient>>,
    Json(data): Json<DocumentForm>,
) -> Result<Json<Document>> {
    let Some(document_id) = data.id else {
        return Err(DocumentError::IdMissing.into());
    };
    let document = data
        .into_document_changeset()
        .update_or_fail(&mut db_pool.get().await?, document_id, || {
            DocumentError::UpdateUnknownId { document_id }
        })
        .await?;

    search_client
        .index(search::DOCUMENT_INDEX, document.id, &document)
        .await?;

    Ok(Json(document))
}

#[utoipa::path(
    get, path = "/api/documents",
    tag = "documents",
    responses(
        (status = 200, body = Vec<Document>, description = "The list of documents"),
    )
)]
pub(in crate::views) async fn list(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
) -> Result<Json<Vec<Document>>> {
    let documents = Document::list(&mut db_pool.get().await?)
        .await
        .map_err(DocumentError::from)?;
    Ok(Json(documents))
}

#[utoipa::path(
    get, path = "/api/documents/{id}",
    tag = "documents",
    params(("id" = i64, Path, description = "A document identifier")),
    responses(
        (status = 200, body = Document, description = "The requested document"),
        (status = 404, body = InternalError, description = "The document was not found"),
    )
)]
pub(in crate::views) async fn get(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Path(document_id): Path<i64>,
) -> Result<Json<Document>> {
    let document = Document::retrieve_or_fail(db_pool.get().await?, document_id, || {
        DocumentError::NotFound { document_id }
    })
    .await?;
    Ok(Json(document))
}

#[utoipa::path(
    get, path = "/api/documents/{id}/$content",
    tag = "documents",
    params(("id" = i64, Path, description = "A document identifier")),
    responses(
        (status = 200, body = Vec<u8>, description = "The raw bytes of the document, with its MIME type and an attachment disposition"),
        (status = 404, body = InternalError, description = "The document or its content was not found"),
    )
)]
pub(in crate::views) async fn content(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Path(document_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let document = Document::retrieve_or_fail(db_pool.get().await?, document_id, || {
        DocumentError::NotFound { document_id }
    })
    .await?;
    let data = document
        .data(&mut db_pool.get().await?)
        .await
        .map_err(DocumentError::from)?
        .ok_or(DocumentError::ContentNotFound { document_id })?;

    // The stored MIME type and title are arbitrary strings, fall back to a
    // generic attachment when they cannot be carried in a header
    let content_type = header::HeaderValue::from_str(&document.mime_type)
        .unwrap_or_else(|_| header::HeaderValue::from_static("application/octet-stream"));
    let disposition = header::HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        document.title
    ))
    .unwrap_or_else(|_| header::HeaderValue::from_static("attachment"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}

#[utoipa::path(
    delete, path = "/api/documents/{id}",
    tag = "documents",
    params(("id" = i64, Path, description = "A document identifier")),
    responses(
        (status = 204, description = "The document was deleted successfully"),
        (status = 404, body = InternalError, description = "The document was not found"),
    )
)]
pub(in crate::views) async fn delete(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    State(search_client): State<Arc<SearchClient>>,
    Path(document_id): Path<i64>,
) -> Result<impl IntoResponse> {
    Document::delete_static_or_fail(&mut db_pool.get().await?, document_id, || {
        DocumentError::NotFound { document_id }
    })
    .await?;

    search_client
        .delete(search::DOCUMENT_INDEX, document_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get, path = "/api/_search/documents",
    tag = "documents",
    params(SearchQueryParams),
    responses(
        (status = 200, body = Vec<Document>, description = "The documents matching the query"),
    )
)]
pub(in crate::views) async fn search(
    State(search_client): State<Arc<SearchClient>>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<Vec<Document>>> {
    let documents = search_client
        .search::<Document>(search::DOCUMENT_INDEX, &params.query)
        .await?;
    Ok(Json(documents))
}

#[cfg(test)]
pub mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::views::test_app::TestAppBuilder;
    use dossier_models::fixtures::create_content;
    use dossier_models::fixtures::create_document;
    use dossier_models::fixtures::create_person;

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn document_post() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let owner = create_person(&mut db_pool.get_ok(), "owner").await;

        let request = app.post("/api/documents").json(&json!({
            "title": "report.pdf",
            "mime_type": "application/pdf",
            "size": 1024,
            "person_id": owner.id,
        }));
        let response: Document = app
            .fetch(request)
            .await
            .assert_status(StatusCode::CREATED)
            .json_into();

        let document = Document::retrieve(db_pool.get_ok(), response.id)
            .await
            .expect("Failed to retrieve document")
            .expect("Document not found");

        assert_eq!(document, response);
        assert_eq!(document.person_id, Some(owner.id));
        assert!(
            app.search_mock()
                .contains(search::DOCUMENT_INDEX, document.id)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn document_post_with_id_is_rejected() {
        let app = TestAppBuilder::default_app();

        let request = app.post("/api/documents").json(&json!({
            "id": 42,
            "title": "report.pdf",
            "mime_type": "application/pdf",
        }));
        app.fetch(request)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn document_put() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let created = create_document(&mut db_pool.get_ok(), "before.txt", None).await;

        let request = app.put("/api/documents").json(&json!({
            "id": created.id,
            "title": "after.txt",
            "mime_type": "text/plain",
            "size": 12,
        }));
        let response: Document = app
            .fetch(request)
            .await
            .assert_status(StatusCode::OK)
            .json_into();

        assert_eq!(response.id, created.id);
        assert_eq!(response.title, "after.txt");
        assert_eq!(response.size, 12);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn document_put_unknown_id_is_rejected() {
        let app = TestAppBuilder::default_app();

        let request = app.put("/api/documents").json(&json!({
            "id": 123456789,
            "title": "after.txt",
            "mime_type": "text/plain",
        }));
        app.fetch(request)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn document_get_not_found() {
        let app = TestAppBuilder::default_app();

        let request = app.get("/api/documents/123456789");
        app.fetch(request).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn document_content_streams_the_raw_bytes() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let content = create_content(&mut db_pool.get_ok(), b"raw bytes".to_vec()).await;
        let document = Document::changeset()
            .title("report.txt".to_owned())
            .mime_type("text/plain".to_owned())
            .size(9)
            .person_id(None)
            .content_id(Some(content.id))
            .create(&mut db_pool.get_ok())
            .await
            .expect("Failed to create document");

        let request = app.get(&format!("/api/documents/{}/$content", document.id));
        let response = app.fetch(request).await.assert_status(StatusCode::OK);

        assert_eq!(response.content_type(), "text/plain");
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"report.txt\""
        );
        assert_eq!(response.bytes(), b"raw bytes".to_vec());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn document_content_without_content_is_not_found() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let document = create_document(&mut db_pool.get_ok(), "empty.txt", None).await;

        let request = app.get(&format!("/api/documents/{}/$content", document.id));
        app.fetch(request).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn document_delete_removes_from_store_and_index() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let request = app.post("/api/documents").json(&json!({
            "title": "ephemeral.txt",
            "mime_type": "text/plain",
        }));
        let created: Document = app
            .fetch(request)
            .await
            .assert_status(StatusCode::CREATED)
            .json_into();
        assert!(
            app.search_mock()
                .contains(search::DOCUMENT_INDEX, created.id)
        );

        let request = app.delete(&format!("/api/documents/{}", created.id));
        app.fetch(request)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let exists = Document::exists(&mut db_pool.get_ok(), created.id)
            .await
            .expect("Failed to check if document exists");
        assert!(!exists);
        assert!(
            !app.search_mock()
                .contains(search::DOCUMENT_INDEX, created.id)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn document_search_delegates_to_the_index() {
        let app = TestAppBuilder::default_app();

        let request = app.post("/api/documents").json(&json!({
            "title": "quarterly-report.pdf",
            "mime_type": "application/pdf",
        }));
        let created: Document = app
            .fetch(request)
            .await
            .assert_status(StatusCode::CREATED)
            .json_into();

        let request = app.get("/api/_search/documents?query=quarterly");
        let response: Vec<Document> = app
            .fetch(request)
            .await
            .assert_status(StatusCode::OK)
            .json_into();

        assert_eq!(response, vec![created]);
    }
}
