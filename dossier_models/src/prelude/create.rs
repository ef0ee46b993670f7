use std::result::Result;

use database::DbConnection;

use super::Model;

/// Describes how a [Model] can be created in the database
pub trait Create<M: Model>: Sized {
    /// Creates a new row in the database with the values of the changeset and
    /// returns the created model instance
    async fn create(self, conn: &mut DbConnection) -> Result<M, crate::Error>;

    /// Just like [Create::create] but discards the error if any and returns `Err(fail())` instead
    async fn create_or_fail<E: From<crate::Error>, F: FnOnce() -> E + Send>(
        self,
        conn: &mut DbConnection,
        fail: F,
    ) -> Result<M, E> {
        match self.create(conn).await {
            Ok(obj) => Ok(obj),
            Err(_) => Err(fail()),
        }
    }
}
