use utoipa::OpenApi;

use super::contents;
use super::documents;
use super::people;

/// The OpenAPI description of the whole REST surface
#[derive(OpenApi)]
#[openapi(
    info(
        title = "dossier",
        description = "CRUD record service backed by PostgreSQL and mirrored into a search index"
    ),
    paths(
        super::health,
        super::version,
        people::create,
        people::update,
        people::list,
        people::get,
        people::delete,
        people::search,
        documents::create,
        documents::update,
        documents::list,
        documents::get,
        documents::content,
        documents::delete,
        documents::search,
        contents::create,
        contents::update,
        contents::list,
        contents::get,
        contents::delete,
        contents::search,
    ),
    components(schemas(
        common::Version,
        crate::error::InternalError,
        dossier_models::Content,
        dossier_models::Document,
        dossier_models::Person,
        people::PersonResponse,
        people::PersonForm,
        documents::DocumentForm,
        contents::ContentForm,
    ))
)]
pub struct OpenApiRoot;

impl OpenApiRoot {
    pub fn build_openapi() -> utoipa::openapi::OpenApi {
        <Self as OpenApi>::openapi()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_describes_every_entity_surface() {
        let openapi = OpenApiRoot::build_openapi();
        let paths = &openapi.paths.paths;
        for path in [
            "/health",
            "/version",
            "/api/people",
            "/api/people/{id}",
            "/api/_search/people",
            "/api/documents",
            "/api/documents/{id}",
            "/api/documents/{id}/$content",
            "/api/_search/documents",
            "/api/contents",
            "/api/contents/{id}",
            "/api/_search/contents",
        ] {
            assert!(paths.contains_key(path), "missing path {path}");
        }
    }
}
