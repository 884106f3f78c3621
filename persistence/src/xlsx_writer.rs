//! FILENAME: persistence/src/xlsx_writer.rs
//! PURPOSE: Exports an `engine::Spreadsheet` to an `.xlsx` workbook, one
//! worksheet per sheet, formulas written as Excel formula strings and
//! literals written as their computed display values.
//! CONTEXT: Adapted from the teacher's `xlsx_writer.rs`: same
//! `rust_xlsxwriter` plumbing, simplified since this port carries no
//! cell-style registry to translate into `Format`s.

use std::path::Path;
use std::rc::Rc;

use engine::Spreadsheet;
use numeric::Number;
use parser::Value;
use rust_xlsxwriter::Workbook as XlsxWorkbook;

use crate::PersistenceError;

pub fn save_xlsx(spreadsheet: &Rc<Spreadsheet>, path: &Path) -> Result<(), PersistenceError> {
    let mut xlsx = XlsxWorkbook::new();

    for sheet_name in spreadsheet.sheet_names() {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&sheet_name)?;

        for (row, col, cell) in spreadsheet.cells(&sheet_name) {
            if let Some(formula) = &cell.formula {
                worksheet.write_formula(row, col as u16, formula.as_str())?;
                continue;
            }
            match &cell.value {
                Value::Nil => {}
                Value::Number(n) => {
                    worksheet.write_number(row, col as u16, n.as_f64())?;
                }
                Value::String(s) => {
                    worksheet.write_string(row, col as u16, s.as_str())?;
                }
                other => {
                    worksheet.write_string(row, col as u16, &other.to_string())?;
                }
            }
        }
    }

    xlsx.save(path)?;
    Ok(())
}

/// Converts a cell's numeric value through the same `Number` constructor
/// the formula evaluator uses, so a round-tripped literal behaves exactly
/// like one the user typed directly.
pub(crate) fn number_from_f64(value: f64) -> Result<Number, PersistenceError> {
    Number::from_string(&value.to_string(), 0).map_err(PersistenceError::from)
}
