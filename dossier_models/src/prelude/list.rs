use std::result::Result;

use database::DbConnection;

use super::Model;

/// Describes how all the rows of a [Model] can be listed from the database
pub trait List: Model {
    /// Lists every row of the model's table, in identifier order
    async fn list(conn: &mut DbConnection) -> Result<Vec<Self>, crate::Error>;
}
