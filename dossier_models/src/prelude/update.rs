use std::result::Result;

use database::DbConnection;
use diesel::result::Error::NotFound;

use super::Identifiable;
use super::Model;

/// Describes how a [Model] can be updated in the database
///
/// The models that implement this trait also implement [Save] which provide
/// a convenient way to update a model instance.
pub trait Update<K, M>: Sized
where
    K: Send,
    M: Model,
{
    /// Updates the row #`id` with the changeset values and returns the updated model
    async fn update(self, conn: &mut DbConnection, id: K) -> Result<Option<M>, crate::Error>;

    /// Just like [Update::update] but returns `Err(fail())` if the row was not found
    async fn update_or_fail<E, F>(self, conn: &mut DbConnection, id: K, fail: F) -> Result<M, E>
    where
        E: From<crate::Error>,
        F: FnOnce() -> E + Send,
    {
        match self.update(conn, id).await {
            Ok(Some(obj)) => Ok(obj),
            Ok(None) => Err(fail()),
            Err(e) => Err(E::from(e)),
        }
    }
}

/// Describes how a [Model] can be persisted to the database
///
/// This trait is automatically implemented for all models that implement
/// [Update].
pub trait Save<K: Send>: Model {
    /// Persists the model instance to the database
    async fn save(&mut self, conn: &mut DbConnection) -> Result<(), crate::Error>;
}

impl<K, M> Save<K> for M
where
    K: Send + Clone,
    M: Model + Identifiable<K> + Clone + Send,
    <M as Model>::Changeset: Update<K, M> + Send,
{
    async fn save(&mut self, conn: &mut DbConnection) -> Result<(), crate::Error> {
        let id = self.get_id();
        let changeset = <M as Model>::Changeset::from(self.clone());
        *self = changeset
            .update_or_fail(conn, id, || crate::Error::from(NotFound))
            .await?;
        Ok(())
    }
}
