//! FILENAME: persistence/src/lib.rs
//! PURPOSE: Pluggable spreadsheet storage (spec §6.3): the
//! `SpreadsheetBackend` contract, an in-memory backend, and xlsx
//! import/export built directly on `engine::Spreadsheet`.
//! CONTEXT: The spec calls out a SQLite-backed store as an external
//! collaborator — that backend is out of scope here; only the trait it
//! would implement, plus the two backends this crate actually ships, are.

mod backend;
mod error;
mod memory_backend;
mod xlsx_reader;
mod xlsx_writer;

pub use backend::SpreadsheetBackend;
pub use error::PersistenceError;
pub use memory_backend::InMemoryBackend;
pub use xlsx_reader::load_xlsx;
pub use xlsx_writer::save_xlsx;

#[cfg(test)]
mod tests {
    use super::*;
    use engine::Spreadsheet;
    use numeric::Number;
    use parser::Value;
    use tempfile::tempdir;

    #[test]
    fn xlsx_round_trips_literals_and_formulas() {
        let sheet = Spreadsheet::new("Sheet1");
        sheet.set_literal("Sheet1", 0, 0, Value::Number(Number::from_i64(2, 0)));
        sheet.set_literal("Sheet1", 1, 0, Value::string("hello"));
        sheet.set_formula("Sheet1", 2, 0, "A0 * 3");

        let dir = tempdir().unwrap();
        let path = dir.path().join("roundtrip.xlsx");
        save_xlsx(&sheet, &path).unwrap();

        let loaded = load_xlsx(&path).unwrap();
        assert_eq!(loaded.display_value("Sheet1", 0, 0), "2");
        assert_eq!(loaded.display_value("Sheet1", 1, 0), "hello");
        assert_eq!(loaded.display_value("Sheet1", 2, 0), "6");
    }

    #[test]
    fn in_memory_backend_reports_absent_cells() {
        let backend = InMemoryBackend::new();
        assert!(!backend.is_cell_present("Sheet1", 0, 0));
        assert_eq!(backend.max_column("Sheet1"), 0);
    }
}
