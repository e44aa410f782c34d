use tracing::info;

use crate::{
    error::Result,
    sql::{
        engine::Catalog,
        executor::{Executor, ResultSet},
        schema::Table,
    },
};

/// CREATE TABLE executor
pub struct CreateTable {
    schema: Table,
}

impl CreateTable {
    pub fn new(schema: Table) -> Box<Self> {
        Box::new(Self { schema })
    }
}

impl<C: Catalog> Executor<C> for CreateTable {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let table_name = self.schema.name.clone();
        catalog.create_table(self.schema)?;
        info!(table = %table_name, "table created");
        Ok(ResultSet::CreateTable { table_name })
    }
}

/// DROP TABLE executor
pub struct DropTable {
    table_name: String,
}

impl DropTable {
    pub fn new(table_name: String) -> Box<Self> {
        Box::new(Self { table_name })
    }
}

impl<C: Catalog> Executor<C> for DropTable {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let table = catalog.drop_table(&self.table_name)?;
        info!(table = %table.name, rows = table.row_count(), "table dropped");
        Ok(ResultSet::DropTable {
            table_name: table.name,
        })
    }
}
