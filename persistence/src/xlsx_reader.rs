//! FILENAME: persistence/src/xlsx_reader.rs
//! PURPOSE: Loads an `.xlsx` workbook into a freshly built
//! `engine::Spreadsheet`, one sheet per worksheet.
//! CONTEXT: Adapted from the teacher's `xlsx_reader.rs`: same `calamine`
//! plumbing. A formula cell is stored as a Forward formula (stripping
//! Excel's leading `=`); everything else is stored as a literal.

use std::path::Path;
use std::rc::Rc;

use calamine::{open_workbook, Data, Reader, Xlsx};
use engine::Spreadsheet;
use parser::Value;

use crate::xlsx_writer::number_from_f64;
use crate::PersistenceError;

pub fn load_xlsx(path: &Path) -> Result<Rc<Spreadsheet>, PersistenceError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    let first = sheet_names
        .first()
        .ok_or_else(|| PersistenceError::InvalidFormat("workbook contains no sheets".to_string()))?
        .clone();
    let spreadsheet = Spreadsheet::new(first);

    for sheet_name in &sheet_names {
        spreadsheet.ensure_sheet(sheet_name);

        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;
        let formulas = workbook.worksheet_formula(sheet_name).ok();

        for (row_idx, row) in range.rows().enumerate() {
            for (col_idx, data) in row.iter().enumerate() {
                let row = row_idx as u32;
                let col = col_idx as u32;

                if let Some(formula) = formulas.as_ref().and_then(|f| f.get((row_idx, col_idx))) {
                    if !formula.is_empty() {
                        spreadsheet.set_formula(sheet_name, row, col, formula.clone());
                        continue;
                    }
                }

                match data {
                    Data::Empty => {}
                    Data::String(s) => spreadsheet.set_literal(sheet_name, row, col, Value::string(s.clone())),
                    Data::Float(f) => spreadsheet.set_literal(sheet_name, row, col, Value::Number(number_from_f64(*f)?)),
                    Data::Int(i) => spreadsheet.set_literal(sheet_name, row, col, Value::Number(number_from_f64(*i as f64)?)),
                    Data::Bool(b) => {
                        let n = if *b { 1 } else { 0 };
                        spreadsheet.set_literal(sheet_name, row, col, Value::Number(numeric::Number::from_i64(n, 0)));
                    }
                    Data::Error(e) => spreadsheet.set_literal(sheet_name, row, col, Value::string(format!("{e:?}"))),
                    Data::DateTime(dt) => spreadsheet.set_literal(sheet_name, row, col, Value::Number(number_from_f64(dt.as_f64())?)),
                    Data::DateTimeIso(s) | Data::DurationIso(s) => {
                        spreadsheet.set_literal(sheet_name, row, col, Value::string(s.clone()))
                    }
                }
            }
        }
    }

    Ok(spreadsheet)
}
