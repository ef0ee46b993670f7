use database::DbConnection;

use crate::Content;
use crate::Document;
use crate::Person;
use crate::prelude::*;

pub fn person_changeset(model: &str) -> Changeset<Person> {
    Person::changeset().model(model.to_owned())
}

pub async fn create_person(conn: &mut DbConnection, model: &str) -> Person {
    person_changeset(model)
        .create(conn)
        .await
        .expect("Failed to create person")
}

pub fn document_changeset(title: &str, person_id: Option<i64>) -> Changeset<Document> {
    Document::changeset()
        .title(title.to_owned())
        .mime_type("text/plain".to_owned())
        .size(0)
        .person_id(person_id)
        .content_id(None)
}

pub async fn create_document(
    conn: &mut DbConnection,
    title: &str,
    person_id: Option<i64>,
) -> Document {
    document_changeset(title, person_id)
        .create(conn)
        .await
        .expect("Failed to create document")
}

pub async fn create_content(conn: &mut DbConnection, data: Vec<u8>) -> Content {
    Content::changeset()
        .data(data)
        .create(conn)
        .await
        .expect("Failed to create content")
}
