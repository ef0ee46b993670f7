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
use serde_with::base64::Base64;
use serde_with::serde_as;
use std::sync::Arc;
use thiserror::Error;
use utoipa::IntoParams;
use utoipa::ToSchema;

use super::people::SearchQueryParams;
use crate::error::DossierError;
use crate::error::InternalError;
use crate::error::Result;
use dossier_models::Content;
use dossier_models::prelude::*;

#[derive(Debug, Error)]
pub enum ContentError {
    /// Couldn't find the content with the given content ID
    #[error("Content '{content_id}' could not be found")]
    NotFound { content_id: i64 },
    #[error("A new content cannot already have an identifier")]
    IdExists,
    #[error("An existing content identifier is required")]
    IdMissing,
    #[error("Cannot update content '{content_id}' as it does not exist")]
    UpdateUnknownId { content_id: i64 },
    #[error(transparent)]
    Database(#[from] dossier_models::Error),
}

impl DossierError for ContentError {
    fn get_status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::IdExists | Self::IdMissing | Self::UpdateUnknownId { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn get_type(&self) -> &str {
        match self {
            Self::NotFound { .. } => "dossier:content:NotFound",
            Self::IdExists => "dossier:content:IdExists",
            Self::IdMissing => "dossier:content:IdMissing",
            Self::UpdateUnknownId { .. } => "dossier:content:UpdateUnknownId",
            Self::Database(_) => "dossier:content:Database",
        }
    }

    fn context(&self) -> std::collections::HashMap<String, serde_json::Value> {
        match self {
            Self::NotFound { content_id } | Self::UpdateUnknownId { content_id } => {
                [("content_id".to_string(), (*content_id).into())].into()
            }
            _ => Default::default(),
        }
    }
}

/// The payload of the content create and update endpoints
///
/// The raw bytes travel base64-encoded.
#[serde_as]
#[derive(Debug, Deserialize, ToSchema)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(in crate::views) struct ContentForm {
    pub id: Option<i64>,
    #[serde_as(as = "Base64")]
    #[schema(value_type = String, format = Byte)]
    pub data: Vec<u8>,
}

impl ContentForm {
    fn into_content_changeset(self) -> Changeset<Content> {
        Content::changeset().data(self.data)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub(in crate::views) struct ContentListQueryParams {
    /// When set to `document-is-null`, only the contents no document points at are returned
    filter: Option<String>,
}

#[utoipa::path(
    post, path = "/api/contents",
    tag = "contents",
    request_body = ContentForm,
    responses(
        (status = 201, body = Content, description = "The created content"),
        (status = 400, body = InternalError, description = "The payload already carries an identifier"),
    )
)]
pub(in crate::views) async fn create(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    State(search_client): State<Arc<SearchClient>>,
    Json(data): Json<ContentForm>,
) -> Result<impl IntoResponse> {
    if data.id.is_some() {
        return Err(ContentError::IdExists.into());
    }
    let content = data
        .into_content_changeset()
        .create(&mut db_pool.get().await?)
        .await
        .map_err(ContentError::from)?;

    search_client
        .index(search::CONTENT_INDEX, content.id, &content)
        .await?;

    let location = format!("/api/contents/{}", content.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(content),
    ))
}

#[utoipa::path(
    put, path = "/api/contents",
    tag = "contents",
    request_body = ContentForm,
    responses(
        (status = 200, body = Content, description = "The updated content"),
        (status = 400, body = InternalError, description = "The payload has no identifier or an unknown one"),
    )
)]
pub(in crate::views) async fn update(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    State(search_client): State<Arc<SearchClient>>,
    Json(data): Json<ContentForm>,
) -> Result<Json<Content>> {
    let Some(content_id) = data.id else {
        return Err(ContentError::IdMissing.into());
    };
    let content = data
        .into_content_changeset()
        .update_or_fail(&mut db_pool.get().await?, content_id, || {
            ContentError::UpdateUnknownId { content_id }
        })
        .await?;

    search_client
        .index(search::CONTENT_INDEX, content.id, &content)
        .await?;

    Ok(Json(content))
}

#[utoipa::path(
    get, path = "/api/contents",
    tag = "contents",
    params(ContentListQueryParams),
    responses(
        (status = 200, body = Vec<Content>, description = "The list of contents"),
    )
)]
pub(in crate::views) async fn list(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Query(params): Query<ContentListQueryParams>,
) -> Result<Json<Vec<Content>>> {
    let mut conn = db_pool.get().await?;
    let contents = if params.filter.as_deref() == Some("document-is-null") {
        Content::list_without_document(&mut conn).await
    } else {
        Content::list(&mut conn).await
    }
    .map_err(ContentError::from)?;
    Ok(Json(contents))
}

#[utoipa::path(
    get, path = "/api/contents/{id}",
    tag = "contents",
    params(("id" = i64, Path, description = "A content identifier")),
    responses(
        (status = 200, body = Content, description = "The requested content"),
        (status = 404, body = InternalError, description = "The content was not found"),
    )
)]
pub(in crate::views) async fn get(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Path(content_id): Path<i64>,
) -> Result<Json<Content>> {
    let content = Content::retrieve_or_fail(db_pool.get().await?, content_id, || {
        ContentError::NotFound { content_id }
    })
    .await?;
    Ok(Json(content))
}

#[utoipa::path(
    delete, path = "/api/contents/{id}",
    tag = "contents",
    params(("id" = i64, Path, description = "A content identifier")),
    responses(
        (status = 204, description = "The content was deleted successfully"),
        (status = 404, body = InternalError, description = "The content was not found"),
    )
)]
pub(in crate::views) async fn delete(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    State(search_client): State<Arc<SearchClient>>,
    Path(content_id): Path<i64>,
) -> Result<impl IntoResponse> {
    Content::delete_static_or_fail(&mut db_pool.get().await?, content_id, || {
        ContentError::NotFound { content_id }
    })
    .await?;

    search_client
        .delete(search::CONTENT_INDEX, content_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get, path = "/api/_search/contents",
    tag = "contents",
    params(SearchQueryParams),
    responses(
        (status = 200, body = Vec<Content>, description = "The contents matching the query"),
    )
)]
pub(in crate::views) async fn search(
    State(search_client): State<Arc<SearchClient>>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<Vec<Content>>> {
    let contents = search_client
        .search::<Content>(search::CONTENT_INDEX, &params.query)
        .await?;
    Ok(Json(contents))
}

#[cfg(test)]
pub mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::views::test_app::TestAppBuilder;
    use dossier_models::fixtures::create_content;
    use dossier_models::fixtures::document_changeset;

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn content_post() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        // "raw payload" in base64
        let request = app.post("/api/contents").json(&json!({
            "data": "cmF3IHBheWxvYWQ=",
        }));
        let response: Content = app
            .fetch(request)
            .await
            .assert_status(StatusCode::CREATED)
            .json_into();

        let content = Content::retrieve(db_pool.get_ok(), response.id)
            .await
            .expect("Failed to retrieve content")
            .expect("Content not found");

        assert_eq!(content, response);
        assert_eq!(content.data, b"raw payload".to_vec());
        assert!(app.search_mock().contains(search::CONTENT_INDEX, content.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn content_post_with_id_is_rejected() {
        let app = TestAppBuilder::default_app();

        let request = app.post("/api/contents").json(&json!({
            "id": 42,
            "data": "cmF3IHBheWxvYWQ=",
        }));
        app.fetch(request)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn content_put() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let created = create_content(&mut db_pool.get_ok(), b"before".to_vec()).await;

        let request = app.put("/api/contents").json(&json!({
            "id": created.id,
            "data": "YWZ0ZXI=", // "after"
        }));
        let response: Content = app
            .fetch(request)
            .await
            .assert_status(StatusCode::OK)
            .json_into();

        assert_eq!(response.id, created.id);
        assert_eq!(response.data, b"after".to_vec());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn content_put_without_id_is_rejected() {
        let app = TestAppBuilder::default_app();

        let request = app.put("/api/contents").json(&json!({
            "data": "YWZ0ZXI=",
        }));
        app.fetch(request)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn content_get_not_found() {
        let app = TestAppBuilder::default_app();

        let request = app.get("/api/contents/123456789");
        app.fetch(request).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn content_list_document_is_null_filter() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let orphan = create_content(&mut db_pool.get_ok(), b"orphan".to_vec()).await;
        let linked = create_content(&mut db_pool.get_ok(), b"linked".to_vec()).await;
        document_changeset("linked.txt", None)
            .content_id(Some(linked.id))
            .create(&mut db_pool.get_ok())
            .await
            .expect("Failed to create document");

        let request = app.get("/api/contents?filter=document-is-null");
        let response: Vec<Content> = app
            .fetch(request)
            .await
            .assert_status(StatusCode::OK)
            .json_into();
        assert_eq!(response, vec![orphan.clone()]);

        let request = app.get("/api/contents");
        let response: Vec<Content> = app
            .fetch(request)
            .await
            .assert_status(StatusCode::OK)
            .json_into();
        assert_eq!(response, vec![orphan, linked]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn content_delete_removes_from_store_and_index() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let request = app.post("/api/contents").json(&json!({
            "data": "ZXBoZW1lcmFs", // "ephemeral"
        }));
        let created: Content = app
            .fetch(request)
            .await
            .assert_status(StatusCode::CREATED)
            .json_into();
        assert!(app.search_mock().contains(search::CONTENT_INDEX, created.id));

        let request = app.delete(&format!("/api/contents/{}", created.id));
        app.fetch(request)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let exists = Content::exists(&mut db_pool.get_ok(), created.id)
            .await
            .expect("Failed to check if content exists");
        assert!(!exists);
        assert!(!app.search_mock().contains(search::CONTENT_INDEX, created.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn content_search_delegates_to_the_index() {
        let app = TestAppBuilder::default_app();

        let request = app.post("/api/contents").json(&json!({
            "data": "cXVhcnRlcmx5", // "quarterly"
        }));
        let created: Content = app
            .fetch(request)
            .await
            .assert_status(StatusCode::CREATED)
            .json_into();

        // the mirror stores the payload in its base64 form, queries match it
        let request = app.get("/api/_search/contents?query=cXVhcnRlcmx5");
        let response: Vec<Content> = app
            .fetch(request)
            .await
            .assert_status(StatusCode::OK)
            .json_into();

        assert_eq!(response, vec![created]);
    }
}
