use std::ops::DerefMut;

use database::DbConnection;
use database::tables::person;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use futures_util::stream::TryStreamExt;
use serde::Deserialize;
use serde::Serialize;
use utoipa::ToSchema;

use crate::prelude::*;

/// A person record
///
/// Owns a set of [crate::Document] rows through `document.person_id`, which
/// the store drops with it (`ON DELETE CASCADE`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Person {
    pub id: i64,
    pub model: String,
}

#[derive(Debug, Queryable)]
pub struct PersonRow {
    id: i64,
    model: String,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Self {
            id: row.id,
            model: row.model,
        }
    }
}

#[derive(Debug, Default, Queryable, AsChangeset, Insertable)]
#[diesel(table_name = person)]
pub struct PersonChangeset {
    #[diesel(deserialize_as = String)]
    pub model: Option<String>,
}

impl From<Person> for PersonChangeset {
    fn from(person: Person) -> Self {
        Self {
            model: Some(person.model),
        }
    }
}

impl PersonChangeset {
    #[must_use = "builder methods are intended to be chained"]
    pub fn model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }
}

impl Model for Person {
    type Row = PersonRow;
    type Changeset = PersonChangeset;
    type Table = person::table;
}

impl crate::prelude::Identifiable for Person {
    fn get_id(&self) -> i64 {
        self.id
    }
}

impl Create<Person> for PersonChangeset {
    #[tracing::instrument(name = "model:create<Person>", skip_all, err)]
    async fn create(self, conn: &mut DbConnection) -> Result<Person, crate::Error> {
        use database::tables::person::dsl;
        diesel::insert_into(person::table)
            .values(&self)
            .returning((dsl::id, dsl::model))
            .get_result::<PersonRow>(conn.write().await.deref_mut())
            .await
            .map(Into::into)
            .map_err(crate::Error::from)
    }
}

impl Retrieve<i64> for Person {
    #[tracing::instrument(name = "model:retrieve<Person>", skip_all, err, fields(query_id = id))]
    async fn retrieve(conn: DbConnection, id: i64) -> Result<Option<Person>, crate::Error> {
        use database::tables::person::dsl;
        dsl::person
            .filter(dsl::id.eq(id))
            .select((dsl::id, dsl::model))
            .first::<PersonRow>(conn.write().await.deref_mut())
            .await
            .optional()
            .map(|row| row.map(Into::into))
            .map_err(crate::Error::from)
    }
}

impl Exists<i64> for Person {
    #[tracing::instrument(name = "model:exists<Person>", skip_all, err, fields(query_id = id))]
    async fn exists(conn: &mut DbConnection, id: i64) -> Result<bool, crate::Error> {
        use database::tables::person::dsl;
        diesel::select(diesel::dsl::exists(dsl::person.filter(dsl::id.eq(id))))
            .get_result(conn.write().await.deref_mut())
            .await
            .map_err(crate::Error::from)
    }
}

impl Update<i64, Person> for PersonChangeset {
    #[tracing::instrument(name = "model:update<Person>", skip_all, err, fields(query_id = id))]
    async fn update(
        self,
        conn: &mut DbConnection,
        id: i64,
    ) -> Result<Option<Person>, crate::Error> {
        use database::tables::person::dsl;
        diesel::update(dsl::person.filter(dsl::id.eq(id)))
            .set(&self)
            .returning((dsl::id, dsl::model))
            .get_result::<PersonRow>(conn.write().await.deref_mut())
            .await
            .optional()
            .map(|row| row.map(Into::into))
            .map_err(crate::Error::from)
    }
}

impl DeleteStatic<i64> for Person {
    #[tracing::instrument(name = "model:delete_static<Person>", skip_all, ret, err, fields(query_id = id))]
    async fn delete_static(conn: &mut DbConnection, id: i64) -> Result<bool, crate::Error> {
        use database::tables::person::dsl;
        diesel::delete(dsl::person.filter(dsl::id.eq(id)))
            .execute(conn.write().await.deref_mut())
            .await
            .map(|n| n == 1)
            .map_err(crate::Error::from)
    }
}

impl List for Person {
    #[tracing::instrument(name = "model:list<Person>", skip_all, err)]
    async fn list(conn: &mut DbConnection) -> Result<Vec<Person>, crate::Error> {
        use database::tables::person::dsl;
        dsl::person
            .order_by(dsl::id)
            .select((dsl::id, dsl::model))
            .load_stream::<PersonRow>(conn.write().await.deref_mut())
            .await
            .map_err(crate::Error::from)?
            .map_ok(<Person as Model>::from_row)
            .try_collect::<Vec<_>>()
            .await
            .map_err(crate::Error::from)
    }
}

#[cfg(test)]
pub mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fixtures::create_person;
    use database::DbConnectionPoolV2;

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_retrieve() {
        let db_pool = DbConnectionPoolV2::for_tests();
        let created = create_person(&mut db_pool.get_ok(), "test_person_model").await;

        let person = Person::retrieve(db_pool.get_ok(), created.id)
            .await
            .expect("Failed to retrieve person")
            .expect("Person not found");

        assert_eq!(&created, &person);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_update_and_delete() {
        let db_pool = DbConnectionPoolV2::for_tests();
        let created = create_person(&mut db_pool.get_ok(), "before").await;

        let updated = Person::changeset()
            .model("after".to_owned())
            .update(&mut db_pool.get_ok(), created.id)
            .await
            .expect("Failed to update person")
            .expect("Person not found");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.model, "after");

        let deleted = Person::delete_static(&mut db_pool.get_ok(), created.id)
            .await
            .expect("Failed to delete person");
        assert!(deleted);

        let exists = Person::exists(&mut db_pool.get_ok(), created.id)
            .await
            .expect("Failed to check if person exists");
        assert!(!exists);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_save() {
        let db_pool = DbConnectionPoolV2::for_tests();
        let mut person = create_person(&mut db_pool.get_ok(), "before").await;

        person.model = "after".to_owned();
        person
            .save(&mut db_pool.get_ok())
            .await
            .expect("Failed to save person");

        let reloaded = Person::retrieve(db_pool.get_ok(), person.id)
            .await
            .expect("Failed to retrieve person")
            .expect("Person not found");
        assert_eq!(reloaded.model, "after");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn person_list() {
        let db_pool = DbConnectionPoolV2::for_tests();
        let first = create_person(&mut db_pool.get_ok(), "first").await;
        let second = create_person(&mut db_pool.get_ok(), "second").await;

        let people = Person::list(&mut db_pool.get_ok())
            .await
            .expect("Failed to list people");

        assert_eq!(people, vec![first, second]);
    }
}
