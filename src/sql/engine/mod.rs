use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::{
    executor::ResultSet,
    parser::{ast::Sequence, parse},
    plan::{normalize, Plan},
    schema::Table,
};

mod memory;

pub use memory::MemoryCatalog;

/// Table catalog the executors run against
///
/// Table names are case-normalised by the implementation.
pub trait Catalog {
    /// Adds a table, fails if the name is taken
    fn create_table(&mut self, table: Table) -> Result<()>;
    /// Removes a table and returns it
    fn drop_table(&mut self, table_name: &str) -> Result<Table>;
    fn get_table(&self, table_name: &str) -> Option<&Table>;
    fn get_table_mut(&mut self, table_name: &str) -> Option<&mut Table>;
    /// Names of all tables in the catalog, sorted
    fn table_names(&self) -> Vec<String>;

    /// Returns the table, returns error if it doesn't exist
    fn must_get_table(&self, table_name: &str) -> Result<&Table> {
        self.get_table(table_name)
            .ok_or_else(|| Error::TableDoesNotExist(table_name.to_string()))
    }

    fn must_get_table_mut(&mut self, table_name: &str) -> Result<&mut Table> {
        self.get_table_mut(table_name)
            .ok_or_else(|| Error::TableDoesNotExist(table_name.to_string()))
    }
}

/// Outcome of evaluating a sequence
///
/// Results of the commands that ran before a failing one are kept, as are
/// their effects on the catalog.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Evaluation {
    pub results: Vec<ResultSet>,
    pub error: Option<Error>,
}

impl Evaluation {
    /// Rendered results, one newline-terminated entry per command
    pub fn output(&self) -> String {
        self.results.iter().map(|r| format!("{}\n", r)).collect()
    }

    pub fn into_result(self) -> Result<String> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.output()),
        }
    }
}

/// Query engine owning a catalog of tables
pub struct Engine<C: Catalog = MemoryCatalog> {
    catalog: C,
}

impl Engine<MemoryCatalog> {
    pub fn new() -> Self {
        Self::with_catalog(MemoryCatalog::new())
    }
}

impl Default for Engine<MemoryCatalog> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Catalog + 'static> Engine<C> {
    pub fn with_catalog(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Evaluates a parsed sequence, halting at the first failing command
    pub fn evaluate(&mut self, seq: Sequence) -> Evaluation {
        let mut evaluation = Evaluation::default();
        let statements = match normalize(seq) {
            Ok(statements) => statements,
            Err(err) => {
                warn!(%err, "sequence rejected");
                evaluation.error = Some(err);
                return evaluation;
            }
        };

        for stmt in statements {
            match Plan::build(stmt).and_then(|plan| plan.execute(&mut self.catalog)) {
                Ok(result) => {
                    debug!(?result, "command evaluated");
                    evaluation.results.push(result);
                }
                Err(err) => {
                    warn!(%err, "evaluation halted");
                    evaluation.error = Some(err);
                    break;
                }
            }
        }
        evaluation
    }

    /// Parses and evaluates query text
    pub fn execute(&mut self, text: &str) -> Evaluation {
        match parse(text) {
            Ok(seq) => self.evaluate(seq),
            Err(err) => {
                warn!(%err, "parsing failed");
                Evaluation {
                    results: Vec::new(),
                    error: Some(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, Engine};
    use crate::{
        error::{Error, Result},
        sql::executor::ResultSet,
    };

    #[test]
    fn test_engine_keeps_effects_before_error() {
        let mut engine = Engine::new();
        let evaluation = engine.execute(
            "create table t (a int); insert into t values(1); insert into x values(2); insert into t values(3);",
        );
        assert_eq!(evaluation.output(), "Table 'T' has been created\nData Inserted\n");
        assert_eq!(evaluation.error, Some(Error::TableDoesNotExist("X".into())));
        assert_eq!(
            engine.catalog().get_table("t").map(|t| t.row_count()),
            Some(1)
        );
    }

    #[test]
    fn test_engine_parse_error_runs_nothing() {
        let mut engine = Engine::new();
        let evaluation = engine.execute("create table t (a int); select from t;");
        assert!(evaluation.results.is_empty());
        assert!(evaluation.error.is_some());
        assert!(engine.catalog().table_names().is_empty());
    }

    #[test]
    fn test_engine_results_are_structured() -> Result<()> {
        let mut engine = Engine::new();
        engine
            .execute("create table t (a int, b text); insert into t values(1, 'x');")
            .into_result()?;
        let evaluation = engine.execute("select b from t;");
        assert_eq!(
            evaluation.results,
            vec![ResultSet::Scan {
                columns: vec!["B".into()],
                rows: vec![vec![crate::sql::types::Value::String("X".into())]],
            }]
        );
        Ok(())
    }
}
