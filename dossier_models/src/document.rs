use std::ops::DerefMut;

use database::DbConnection;
use database::tables::document;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use futures_util::stream::TryStreamExt;
use serde::Deserialize;
use serde::Serialize;
use utoipa::ToSchema;

use crate::prelude::*;

/// A document record: title, MIME type and size of a stored file
///
/// The raw bytes live in the [crate::Content] row referenced by `content_id`.
/// `person_id` points at the owning [crate::Person], if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub mime_type: String,
    pub size: i64,
    pub person_id: Option<i64>,
    pub content_id: Option<i64>,
}

#[derive(Debug, Queryable)]
pub struct DocumentRow {
    id: i64,
    title: String,
    mime_type: String,
    size: i64,
    person_id: Option<i64>,
    content_id: Option<i64>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            mime_type: row.mime_type,
            size: row.size,
            person_id: row.person_id,
            content_id: row.content_id,
        }
    }
}

#[derive(Debug, Default, Queryable, AsChangeset, Insertable)]
#[diesel(table_name = document)]
pub struct DocumentChangeset {
    #[diesel(deserialize_as = String)]
    pub title: Option<String>,
    #[diesel(deserialize_as = String)]
    pub mime_type: Option<String>,
    #[diesel(deserialize_as = i64)]
    pub size: Option<i64>,
    #[diesel(deserialize_as = Option<i64>)]
    pub person_id: Option<Option<i64>>,
    #[diesel(deserialize_as = Option<i64>)]
    pub content_id: Option<Option<i64>>,
}

impl From<Document> for DocumentChangeset {
    fn from(document: Document) -> Self {
        Self {
            title: Some(document.title),
            mime_type: Some(document.mime_type),
            size: Some(document.size),
            person_id: Some(document.person_id),
            content_id: Some(document.content_id),
        }
    }
}

impl DocumentChangeset {
    #[must_use = "builder methods are intended to be chained"]
    pub fn title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    #[must_use = "builder methods are intended to be chained"]
    pub fn mime_type(mut self, mime_type: String) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    #[must_use = "builder methods are intended to be chained"]
    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use = "builder methods are intended to be chained"]
    pub fn person_id(mut self, person_id: Option<i64>) -> Self {
        self.person_id = Some(person_id);
        self
    }

    #[must_use = "builder methods are intended to be chained"]
    pub fn content_id(mut self, content_id: Option<i64>) -> Self {
        self.content_id = Some(content_id);
        self
    }
}

impl Model for Document {
    type Row = DocumentRow;
    type Changeset = DocumentChangeset;
    type Table = document::table;
}

impl crate::prelude::Identifiable for Document {
    fn get_id(&self) -> i64 {
        self.id
    }
}

impl Create<Document> for DocumentChangeset {
    #[tracing::instrument(name = "model:create<Document>", skip_all, err)]
    async fn create(self, conn: &mut DbConnection) -> Result<Document, crate::Error> {
        use database::tables::document::dsl;
        diesel::insert_into(document::table)
            .values(&self)
            .returning((
                dsl::id,
                dsl::title,
                dsl::mime_type,
                dsl::size,
                dsl::person_id,
                dsl::content_id,
            ))
            .get_result::<DocumentRow>(conn.write().await.deref_mut())
            .await
            .map(Into::into)
            .map_err(crate::Error::from)
    }
}

impl Retrieve<i64> for Document {
    #[tracing::instrument(name = "model:retrieve<Document>", skip_all, err, fields(query_id = id))]
    async fn retrieve(conn: DbConnection, id: i64) -> Result<Option<Document>, crate::Error> {
        use database::tables::document::dsl;
        dsl::document
            .filter(dsl::id.eq(id))
            .select((
                dsl::id,
                dsl::title,
                dsl::mime_type,
                dsl::size,
                dsl::person_id,
                dsl::content_id,
            ))
            .first::<DocumentRow>(conn.write().await.deref_mut())
            .await
            .optional()
            .map(|row| row.map(Into::into))
            .map_err(crate::Error::from)
    }
}

impl Exists<i64> for Document {
    #[tracing::instrument(name = "model:exists<Document>", skip_all, err, fields(query_id = id))]
    async fn exists(conn: &mut DbConnection, id: i64) -> Result<bool, crate::Error> {
        use database::tables::document::dsl;
        diesel::select(diesel::dsl::exists(dsl::document.filter(dsl::id.eq(id))))
            .get_result(conn.write().await.deref_mut())
            .await
            .map_err(crate::Error::from)
    }
}

impl Update<i64, Document> for DocumentChangeset {
    #[tracing::instrument(name = "model:update<Document>", skip_all, err, fields(query_id = id))]
    async fn update(
        self,
        conn: &mut DbConnection,
        id: i64,
    ) -> Result<Option<Document>, crate::Error> {
        use database::tables::document::dsl;
        diesel::update(dsl::document.filter(dsl::id.eq(id)))
            .set(&self)
            .returning((
                dsl::id,
                dsl::title,
                dsl::mime_type,
                dsl::size,
                dsl::person_id,
                dsl::content_id,
            ))
            .get_result::<DocumentRow>(conn.write().await.deref_mut())
            .await
            .optional()
            .map(|row| row.map(Into::into))
            .map_err(crate::Error::from)
    }
}

impl DeleteStatic<i64> for Document {
    #[tracing::instrument(name = "model:delete_static<Document>", skip_all, ret, err, fields(query_id = id))]
    async fn delete_static(conn: &mut DbConnection, id: i64) -> Result<bool, crate::Error> {
        use database::tables::document::dsl;
        diesel::delete(dsl::document.filter(dsl::id.eq(id)))
            .execute(conn.write().await.deref_mut())
            .await
            .map(|n| n == 1)
            .map_err(crate::Error::from)
    }
}

impl List for Document {
    #[tracing::instrument(name = "model:list<Document>", skip_all, err)]
    async fn list(conn: &mut DbConnection) -> Result<Vec<Document>, crate::Error> {
        use database::tables::document::dsl;
        dsl::document
            .order_by(dsl::id)
            .select((
                dsl::id,
                dsl::title,
                dsl::mime_type,
                dsl::size,
                dsl::person_id,
                dsl::content_id,
            ))
            .load_stream::<DocumentRow>(conn.write().await.deref_mut())
            .await
            .map_err(crate::Error::from)?
            .map_ok(<Document as Model>::from_row)
            .try_collect::<Vec<_>>()
            .await
            .map_err(crate::Error::from)
    }
}

impl Document {
    /// Lists the documents owned by a person, in identifier order
    #[tracing::instrument(name = "model:list_by_person<Document>", skip_all, err, fields(person_id = person_id))]
    pub async fn list_by_person(
        conn: &mut DbConnection,
        person_id: i64,
    ) -> Result<Vec<Document>, crate::Error> {
        use database::tables::document::dsl;
        dsl::document
            .filter(dsl::person_id.eq(person_id))
            .order_by(dsl::id)
            .select((
                dsl::id,
                dsl::title,
                dsl::mime_type,
                dsl::size,
                dsl::person_id,
                dsl::content_id,
            ))
            .load_stream::<DocumentRow>(conn.write().await.deref_mut())
            .await
            .map_err(crate::Error::from)?
            .map_ok(<Document as Model>::from_row)
            .try_collect::<Vec<_>>()
            .await
            .map_err(crate::Error::from)
    }

    /// Fetches the raw payload of the linked [crate::Content] row
    ///
    /// Returns `None` when the document has no content or the link is dangling.
    #[tracing::instrument(name = "model:data<Document>", skip_all, err)]
    pub async fn data(&self, conn: &mut DbConnection) -> Result<Option<Vec<u8>>, crate::Error> {
        use database::tables::content::dsl;
        let Some(content_id) = self.content_id else {
            return Ok(None);
        };
        dsl::content
            .filter(dsl::id.eq(content_id))
            .select(dsl::data)
            .first::<Vec<u8>>(conn.write().await.deref_mut())
            .await
            .optional()
            .map_err(crate::Error::from)
    }
}
