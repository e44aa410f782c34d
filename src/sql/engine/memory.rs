use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    sql::schema::Table,
};

use super::Catalog;

/// In-memory catalog, tables keyed by upper-cased name
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tables: BTreeMap<String, Table>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    fn key(table_name: &str) -> String {
        table_name.to_uppercase()
    }
}

impl Catalog for MemoryCatalog {
    fn create_table(&mut self, table: Table) -> Result<()> {
        let key = Self::key(&table.name);
        // Check if table already exists
        if self.tables.contains_key(&key) {
            return Err(Error::TableAlreadyExists(table.name));
        }
        self.tables.insert(key, table);
        Ok(())
    }

    fn drop_table(&mut self, table_name: &str) -> Result<Table> {
        self.tables
            .remove(&Self::key(table_name))
            .ok_or_else(|| Error::TableDoesNotExist(table_name.to_string()))
    }

    fn get_table(&self, table_name: &str) -> Option<&Table> {
        self.tables.get(&Self::key(table_name))
    }

    fn get_table_mut(&mut self, table_name: &str) -> Option<&mut Table> {
        self.tables.get_mut(&Self::key(table_name))
    }

    fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryCatalog;
    use crate::{
        error::{Error, Result},
        sql::{
            engine::Catalog,
            schema::{Column, Table},
            types::DataType,
        },
    };

    fn table(name: &str) -> Result<Table> {
        Table::new(name, vec![Column::new("A", DataType::Integer)])
    }

    #[test]
    fn test_catalog_unique_names() -> Result<()> {
        let mut catalog = MemoryCatalog::new();
        catalog.create_table(table("T1")?)?;
        assert_eq!(
            catalog.create_table(table("t1")?),
            Err(Error::TableAlreadyExists("t1".into()))
        );
        catalog.create_table(table("T2")?)?;
        assert_eq!(catalog.table_names(), vec!["T1".to_string(), "T2".to_string()]);
        Ok(())
    }

    #[test]
    fn test_catalog_drop_table() -> Result<()> {
        let mut catalog = MemoryCatalog::new();
        catalog.create_table(table("T1")?)?;
        assert_eq!(catalog.drop_table("T1")?.name, "T1");
        assert!(catalog.get_table("T1").is_none());
        assert_eq!(
            catalog.must_get_table("T1"),
            Err(Error::TableDoesNotExist("T1".into()))
        );
        assert_eq!(
            catalog.drop_table("T1"),
            Err(Error::TableDoesNotExist("T1".into()))
        );
        Ok(())
    }
}
