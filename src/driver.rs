//! Drivers feeding text to an [`Engine`]: a whole script file, or a stream
//! of lines evaluated statement by statement.

use std::{
    fs,
    io::{BufRead, Write},
    path::Path,
};

use tracing::{debug, info};

use crate::{
    error::Result,
    sql::engine::{Catalog, Engine, Evaluation},
};

/// Commands that end a line session
const EXIT_COMMANDS: [&str; 2] = [".exit", ".quit"];

/// Reads a script and evaluates it as one buffer
///
/// Returns the rendered output, or the first error hit.
pub fn run_file<C: Catalog + 'static>(
    engine: &mut Engine<C>,
    path: impl AsRef<Path>,
) -> Result<String> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    info!(path = %path.display(), bytes = text.len(), "running script");
    engine.execute(&text).into_result()
}

/// Evaluates lines from `reader`, writing results to `writer`
///
/// Lines are buffered until the buffered text ends in `;`. Errors are
/// written out and the session carries on. Whatever is still buffered at
/// end of input is evaluated as well.
pub fn run_lines<C, R, W>(engine: &mut Engine<C>, reader: R, mut writer: W) -> Result<()>
where
    C: Catalog + 'static,
    R: BufRead,
    W: Write,
{
    let mut buffer = String::new();
    for line in reader.lines() {
        let line = line?;
        if buffer.trim().is_empty() && EXIT_COMMANDS.contains(&line.trim()) {
            debug!("exit requested");
            return Ok(());
        }
        buffer.push_str(&line);
        buffer.push('\n');

        if buffer.trim_end().ends_with(';') {
            let evaluation = engine.execute(&buffer);
            write_evaluation(&mut writer, &evaluation)?;
            buffer.clear();
        }
    }

    if !buffer.trim().is_empty() {
        let evaluation = engine.execute(&buffer);
        write_evaluation(&mut writer, &evaluation)?;
    }
    Ok(())
}

fn write_evaluation<W: Write>(writer: &mut W, evaluation: &Evaluation) -> Result<()> {
    writer.write_all(evaluation.output().as_bytes())?;
    if let Some(err) = &evaluation.error {
        writeln!(writer, "error: {}", err)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::{run_file, run_lines};
    use crate::{
        error::{Error, Result},
        sql::engine::{Catalog, Engine},
    };

    #[test]
    fn test_run_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "create table t (a int);")?;
        writeln!(file, "insert into t values(7);")?;
        writeln!(file, "select * from t;")?;

        let mut engine = Engine::new();
        let output = run_file(&mut engine, file.path())?;
        assert_eq!(
            output,
            "Table 'T' has been created\nData Inserted\n+---+\n| A |\n+---+\n| 7 |\n+---+\n"
        );
        Ok(())
    }

    #[test]
    fn test_run_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = Engine::new();
        assert!(matches!(
            run_file(&mut engine, dir.path().join("missing.sql")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_run_lines() -> Result<()> {
        let input = "create table t\n(a int);\ninsert into t values(1); insert into x values(1);\n.exit\ninsert into t values(2);\n";
        let mut output = Vec::new();
        let mut engine = Engine::new();
        run_lines(&mut engine, Cursor::new(input), &mut output)?;

        assert_eq!(
            String::from_utf8_lossy(&output),
            "Table 'T' has been created\nData Inserted\nerror: table with the name of X doesn't exist\n"
        );
        assert_eq!(engine.catalog().must_get_table("T")?.row_count(), 1);
        Ok(())
    }

    #[test]
    fn test_run_lines_flushes_tail() -> Result<()> {
        let mut output = Vec::new();
        let mut engine = Engine::new();
        run_lines(&mut engine, Cursor::new("create table t (a int)"), &mut output)?;
        assert!(String::from_utf8_lossy(&output).starts_with("error: syntax error"));
        Ok(())
    }
}
