use std::collections::HashSet;
use std::ops::DerefMut;

use database::DbConnection;
use database::tables::content;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use futures_util::stream::TryStreamExt;
use serde::Deserialize;
use serde::Serialize;
use serde_with::base64::Base64;
use serde_with::serde_as;
use utoipa::ToSchema;

use crate::prelude::*;

/// The raw payload of a [crate::Document]
///
/// The owning document points here through `document.content_id`; a content
/// row with no document pointing at it is an orphan. The payload is carried
/// as base64 in JSON.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Content {
    pub id: i64,
    #[serde_as(as = "Base64")]
    #[schema(value_type = String, format = Byte)]
    pub data: Vec<u8>,
}

#[derive(Debug, Queryable)]
pub struct ContentRow {
    id: i64,
    data: Vec<u8>,
}

impl From<ContentRow> for Content {
    fn from(row: ContentRow) -> Self {
        Self {
            id: row.id,
            data: row.data,
        }
    }
}

#[derive(Debug, Default, Queryable, AsChangeset, Insertable)]
#[diesel(table_name = content)]
pub struct ContentChangeset {
    #[diesel(deserialize_as = Vec<u8>)]
    pub data: Option<Vec<u8>>,
}

impl From<Content> for ContentChangeset {
    fn from(content: Content) -> Self {
        Self {
            data: Some(content.data),
        }
    }
}

impl ContentChangeset {
    #[must_use = "builder methods are intended to be chained"]
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }
}

impl Model for Content {
    type Row = ContentRow;
    type Changeset = ContentChangeset;
    type Table = content::table;
}

impl crate::prelude::Identifiable for Content {
    fn get_id(&self) -> i64 {
        self.id
    }
}

impl Create<Content> for ContentChangeset {
    #[tracing::instrument(name = "model:create<Content>", skip_all, err)]
    async fn create(self, conn: &mut DbConnection) -> Result<Content, crate::Error> {
        use database::tables::content::dsl;
        diesel::insert_into(content::table)
            .values(&self)
            .returning((dsl::id, dsl::data))
            .get_result::<ContentRow>(conn.write().await.deref_mut())
            .await
            .map(Into::into)
            .map_err(crate::Error::from)
    }
}

impl Retrieve<i64> for Content {
    #[tracing::instrument(name = "model:retrieve<Content>", skip_all, err, fields(query_id = id))]
    async fn retrieve(conn: DbConnection, id: i64) -> Result<Option<Content>, crate::Error> {
        use database::tables::content::dsl;
        dsl::content
            .filter(dsl::id.eq(id))
            .select((dsl::id, dsl::data))
            .first::<ContentRow>(conn.write().await.deref_mut())
            .await
            .optional()
            .map(|row| row.map(Into::into))
            .map_err(crate::Error::from)
    }
}

impl Exists<i64> for Content {
    #[tracing::instrument(name = "model:exists<Content>", skip_all, err, fields(query_id = id))]
    async fn exists(conn: &mut DbConnection, id: i64) -> Result<bool, crate::Error> {
        use database::tables::content::dsl;
        diesel::select(diesel::dsl::exists(dsl::content.filter(dsl::id.eq(id))))
            .get_result(conn.write().await.deref_mut())
            .await
            .map_err(crate::Error::from)
    }
}

impl Update<i64, Content> for ContentChangeset {
    #[tracing::instrument(name = "model:update<Content>", skip_all, err, fields(query_id = id))]
    async fn update(
        self,
        conn: &mut DbConnection,
        id: i64,
    ) -> Result<Option<Content>, crate::Error> {
        use database::tables::content::dsl;
        diesel::update(dsl::content.filter(dsl::id.eq(id)))
            .set(&self)
            .returning((dsl::id, dsl::data))
            .get_result::<ContentRow>(conn.write().await.deref_mut())
            .await
            .optional()
            .map(|row| row.map(Into::into))
            .map_err(crate::Error::from)
    }
}

impl DeleteStatic<i64> for Content {
    #[tracing::instrument(name = "model:delete_static<Content>", skip_all, ret, err, fields(query_id = id))]
    async fn delete_static(conn: &mut DbConnection, id: i64) -> Result<bool, crate::Error> {
        use database::tables::content::dsl;
        diesel::delete(dsl::content.filter(dsl::id.eq(id)))
            .execute(conn.write().await.deref_mut())
            .await
            .map(|n| n == 1)
            .map_err(crate::Error::from)
    }
}

impl List for Content {
    #[tracing::instrument(name = "model:list<Content>", skip_all, err)]
    async fn list(conn: &mut DbConnection) -> Result<Vec<Content>, crate::Error> {
        use database::tables::content::dsl;
        dsl::content
            .order_by(dsl::id)
            .select((dsl::id, dsl::data))
            .load_stream::<ContentRow>(conn.write().await.deref_mut())
            .await
            .map_err(crate::Error::from)?
            .map_ok(<Content as Model>::from_row)
            .try_collect::<Vec<_>>()
            .await
            .map_err(crate::Error::from)
    }
}

impl Content {
    /// Lists the content rows no document points at
    #[tracing::instrument(name = "model:list_without_document<Content>", skip_all, err)]
    pub async fn list_without_document(
        conn: &mut DbConnection,
    ) -> Result<Vec<Content>, crate::Error> {
        use database::tables::document::dsl;
        let linked: Vec<Option<i64>> = dsl::document
            .filter(dsl::content_id.is_not_null())
            .select(dsl::content_id)
            .load(conn.write().await.deref_mut())
            .await
            .map_err(crate::Error::from)?;
        let linked: HashSet<i64> = linked.into_iter().flatten().collect();

        let contents = Self::list(conn).await?;
        Ok(contents
            .into_iter()
            .filter(|content| !linked.contains(&content.id))
            .collect())
    }
}
