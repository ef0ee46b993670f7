use axum::extract::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use database::DbConnectionPoolV2;
use diesel_async::scoped_futures::ScopedFutureExt;
use search::SearchClient;
use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use utoipa::IntoParams;
use utoipa::ToSchema;

use crate::error::DossierError;
use crate::error::InternalError;
use crate::error::Result;
use dossier_models::Document;
use dossier_models::Person;
use dossier_models::prelude::*;

#[derive(Debug, Error)]
pub enum PersonError {
    /// Couldn't find the person with the given person ID
    #[error("Person '{person_id}' could not be found")]
    NotFound { person_id: i64 },
    #[error("A new person cannot already have an identifier")]
    IdExists,
    #[error("An existing person identifier is required")]
    IdMissing,
    #[error("Cannot update person '{person_id}' as it does not exist")]
    UpdateUnknownId { person_id: i64 },
    #[error(transparent)]
    Database(#[from] dossier_models::Error),
}

impl DossierError for PersonError {
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
            Self::NotFound { .. } => "dossier:person:NotFound",
            Self::IdExists => "dossier:person:IdExists",
            Self::IdMissing => "dossier:person:IdMissing",
            Self::UpdateUnknownId { .. } => "dossier:person:UpdateUnknownId",
            Self::Database(_) => "dossier:person:Database",
        }
    }

    fn context(&self) -> std::collections::HashMap<String, serde_json::Value> {
        match self {
            Self::NotFound { person_id } | Self::UpdateUnknownId { person_id } => {
                [("person_id".to_string(), (*person_id).into())].into()
            }
            _ => Default::default(),
        }
    }
}

/// A person together with the documents it owns
#[derive(Debug, Clone, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub struct PersonResponse {
    #[serde(flatten)]
    pub person: Person,
    pub documents: Vec<Document>,
}

impl PersonResponse {
    pub async fn try_fetch(
        conn: &mut database::DbConnection,
        person: Person,
    ) -> Result<Self, PersonError> {
        let documents = Document::list_by_person(conn, person.id).await?;
        Ok(Self { person, documents })
    }
}

/// The payload of the person create and update endpoints
#[derive(Debug, Deserialize, ToSchema)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(in crate::views) struct PersonForm {
    pub id: Option<i64>,
    pub model: String,
}

impl PersonForm {
    fn into_person_changeset(self) -> Changeset<Person> {
        Person::changeset().model(self.model)
    }
}

/// The query of the free-text search endpoints
#[derive(Debug, Deserialize, IntoParams)]
pub(in crate::views) struct SearchQueryParams {
    /// The free-text query forwarded to the search index
    pub query: String,
}

#[utoipa::path(
    post, path = "/api/people",
    tag = "people",
    request_body = PersonForm,
    responses(
        (status = 201, body = PersonResponse, description = "The created person"),
        (status = 400, body = InternalError, description = "The payload already carries an identifier"),
    )
)]
pub(in crate::views) async fn create(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    State(search_client): State<Arc<SearchClient>>,
    Json(data): Json<PersonForm>,
) -> Result<impl IntoResponse> {
    if data.id.is_some() {
        return Err(PersonError::IdExists.into());
    }
    let person = data
        .into_person_changeset()
        .create(&mut db_pool.get().await?)
        .await
        .map_err(PersonError::from)?;

    // Mirror into the search index. The store write is already committed: a
    // failure from here on leaves the mirror behind until the next reindex.
    search_client
        .index(search::PERSON_INDEX, person.id, &person)
        .await?;

    let location = format!("/api/people/{}", person.id);
    let response = PersonResponse {
        person,
        documents: Vec::new(),
    };
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(response),
    ))
}

#[utoipa::path(
    put, path = "/api/people",
    tag = "people",
    request_body = PersonForm,
    responses(
        (status = 200, body = PersonResponse, description = "The updated person"),
        (status = 400, body = InternalError, description = "The payload has no identifier or an unknown one"),
    )
)]
pub(in crate::views) async fn update(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    State(search_client): State<Arc<SearchClient>>,
    Json(data): Json<PersonForm>,
) -> Result<Json<PersonResponse>> {
    let Some(person_id) = data.id else {
        return Err(PersonError::IdMissing.into());
    };
    let person = data
        .into_person_changeset()
        .update_or_fail(&mut db_pool.get().await?, person_id, || {
            PersonError::UpdateUnknownId { person_id }
        })
        .await?;

    search_client
        .index(search::PERSON_INDEX, person.id, &person)
        .await?;

    let response = PersonResponse::try_fetch(&mut db_pool.get().await?, person).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get, path = "/api/people",
    tag = "people",
    responses(
        (status = 200, body = Vec<PersonResponse>, description = "The list of people"),
    )
)]
pub(in crate::views) async fn list(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
) -> Result<Json<Vec<PersonResponse>>> {
    let people = Person::list(&mut db_pool.get().await?)
        .await
        .map_err(PersonError::from)?;
    let results = people
        .into_iter()
        .zip(db_pool.iter_conn())
        .map(|(person, conn)| async move {
            PersonResponse::try_fetch(&mut conn.await?, person)
                .await
                .map_err(InternalError::from)
        });
    let results = futures::future::try_join_all(results).await?;
    Ok(Json(results))
}

#[utoipa::path(
    get, path = "/api/people/{id}",
    tag = "people",
    params(("id" = i64, Path, description = "A person identifier")),
    responses(
        (status = 200, body = PersonResponse, description = "The requested person"),
        (status = 404, body = InternalError, description = "The person was not found"),
    )
)]
pub(in crate::views) async fn get(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Path(person_id): Path<i64>,
) -> Result<Json<PersonResponse>> {
    let response = db_pool
        .get()
        .await?
        .transaction(|mut conn| {
            async move {
                let person = Person::retrieve_or_fail(conn.clone(), person_id, || {
                    PersonError::NotFound { person_id }
                })
                .await?;
                let response = PersonResponse::try_fetch(&mut conn, person).await?;
                Ok::<_, InternalError>(response)
            }
            .scope_boxed()
        })
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete, path = "/api/people/{id}",
    tag = "people",
    params(("id" = i64, Path, description = "A person identifier")),
    responses(
        (status = 204, description = "The person was deleted successfully"),
        (status = 404, body = InternalError, description = "The person was not found"),
    )
)]
pub(in crate::views) async fn delete(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    State(search_client): State<Arc<SearchClient>>,
    Path(person_id): Path<i64>,
) -> Result<impl IntoResponse> {
    Person::delete_static_or_fail(&mut db_pool.get().await?, person_id, || {
        PersonError::NotFound { person_id }
    })
    .await?;

    search_client.delete(search::PERSON_INDEX, person_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get, path = "/api/_search/people",
    tag = "people",
    params(SearchQueryParams),
    responses(
        (status = 200, body = Vec<Person>, description = "The people matching the query"),
    )
)]
pub(in crate::views) async fn search(
    State(search_client): State<Arc<SearchClient>>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<Vec<Person>>> {
    let people = search_client
        .search::<Person>(search::PERSON_INDEX, &params.query)
        .await?;
    Ok(Json(people))
}

#[cfg(test)]
pub mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::views::test_app::TestAppBuilder;
    use dossier_models::fixtures::create_document;
    use dossier_models::fixtures::create_person;

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_post() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let request = app.post("/api/people").json(&json!({
            "model": "archivist",
        }));
        let response: PersonResponse = app
            .fetch(request)
            .await
            .assert_status(StatusCode::CREATED)
            .json_into();

        let person = Person::retrieve(db_pool.get_ok(), response.person.id)
            .await
            .expect("Failed to retrieve person")
            .expect("Person not found");

        assert_eq!(person, response.person);
        assert_eq!(person.model, "archivist");
        assert!(app.search_mock().contains(search::PERSON_INDEX, person.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_post_with_id_is_rejected() {
        let app = TestAppBuilder::default_app();

        let request = app.post("/api/people").json(&json!({
            "id": 42,
            "model": "archivist",
        }));
        app.fetch(request)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_put() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let created = create_person(&mut db_pool.get_ok(), "before").await;

        let request = app.put("/api/people").json(&json!({
            "id": created.id,
            "model": "after",
        }));
        let response: PersonResponse = app
            .fetch(request)
            .await
            .assert_status(StatusCode::OK)
            .json_into();

        assert_eq!(response.person.id, created.id);
        assert_eq!(response.person.model, "after");

        let updated = Person::retrieve(db_pool.get_ok(), created.id)
            .await
            .expect("Failed to retrieve person")
            .expect("Person not found");
        assert_eq!(updated.model, "after");
        assert!(app.search_mock().contains(search::PERSON_INDEX, created.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_put_without_id_is_rejected() {
        let app = TestAppBuilder::default_app();

        let request = app.put("/api/people").json(&json!({
            "model": "after",
        }));
        app.fetch(request)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_put_unknown_id_is_rejected() {
        let app = TestAppBuilder::default_app();

        let request = app.put("/api/people").json(&json!({
            "id": 123456789,
            "model": "after",
        }));
        app.fetch(request)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_get() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let created = create_person(&mut db_pool.get_ok(), "archivist").await;
        let document =
            create_document(&mut db_pool.get_ok(), "report.txt", Some(created.id)).await;

        let request = app.get(&format!("/api/people/{}", created.id));
        let response: PersonResponse = app
            .fetch(request)
            .await
            .assert_status(StatusCode::OK)
            .json_into();

        assert_eq!(response.person, created);
        assert_eq!(response.documents, vec![document]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_get_not_found() {
        let app = TestAppBuilder::default_app();

        let request = app.get("/api/people/123456789");
        app.fetch(request).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_list() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let created = create_person(&mut db_pool.get_ok(), "archivist").await;

        let request = app.get("/api/people");
        let response: Vec<PersonResponse> = app
            .fetch(request)
            .await
            .assert_status(StatusCode::OK)
            .json_into();

        let retrieved = response
            .iter()
            .find(|r| r.person.id == created.id)
            .expect("Person not found");
        assert_eq!(retrieved.person, created);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_delete_removes_from_store_and_index() {
        let app = TestAppBuilder::default_app();
        let db_pool = app.db_pool();

        let request = app.post("/api/people").json(&json!({"model": "ephemeral"}));
        let created: PersonResponse = app
            .fetch(request)
            .await
            .assert_status(StatusCode::CREATED)
            .json_into();
        let person_id = created.person.id;
        assert!(app.search_mock().contains(search::PERSON_INDEX, person_id));

        let request = app.delete(&format!("/api/people/{person_id}"));
        app.fetch(request)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let exists = Person::exists(&mut db_pool.get_ok(), person_id)
            .await
            .expect("Failed to check if person exists");
        assert!(!exists);
        assert!(!app.search_mock().contains(search::PERSON_INDEX, person_id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_delete_not_found() {
        let app = TestAppBuilder::default_app();

        let request = app.delete("/api/people/123456789");
        app.fetch(request).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_search_delegates_to_the_index() {
        let app = TestAppBuilder::default_app();

        let request = app.post("/api/people").json(&json!({"model": "archivist"}));
        let created: PersonResponse = app
            .fetch(request)
            .await
            .assert_status(StatusCode::CREATED)
            .json_into();
        let request = app.post("/api/people").json(&json!({"model": "clerk"}));
        app.fetch(request).await.assert_status(StatusCode::CREATED);

        let request = app.get("/api/_search/people?query=archivist");
        let response: Vec<Person> = app
            .fetch(request)
            .await
            .assert_status(StatusCode::OK)
            .json_into();

        assert_eq!(response, vec![created.person]);
    }
}
