// ===============================
// src/prompt.rs
// ===============================
//
// Prompt teks untuk input penjualan. Loop sampai input valid (tanpa batas
// retry, tanpa timeout). EOF = operator selesai, bukan error.
//
use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::domain::{Catalog, CycleReport, SalesRecord};
use crate::metrics::VALIDATION_FAILURES;
use crate::validator::{parse_line, Strictness};

/// Ask until a valid record is entered. `Ok(None)` on end of input.
pub fn read_sales<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    catalog: &Catalog,
    strictness: Strictness,
) -> io::Result<Option<SalesRecord>> {
    loop {
        writeln!(out, "Please enter sales data from the last market.")?;
        writeln!(
            out,
            "Data should be {} numbers, separated by commas.",
            catalog.len()
        )?;
        writeln!(out, "Example: {}\n", catalog.example_line())?;
        write!(out, "Enter your data here: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        match parse_line(&line, catalog, strictness) {
            Ok(record) => {
                writeln!(out, "Data is valid!")?;
                return Ok(Some(record));
            }
            Err(e) => {
                debug!(reason = e.reason(), "sales input rejected");
                VALIDATION_FAILURES.with_label_values(&[e.reason()]).inc();
                writeln!(out, "Invalid data: {e}, please try again.\n")?;
            }
        }
    }
}

/// Print the next-market stock list keyed by item name.
pub fn print_report<W: Write>(out: &mut W, report: &CycleReport) -> io::Result<()> {
    writeln!(out, "Surplus (stock - sales) this market:")?;
    for (item, v) in report.surplus.iter() {
        writeln!(out, "  {item}: {v}")?;
    }
    writeln!(out, "Make the following numbers of items for next market:")?;
    for (item, v) in report.forecast.iter() {
        writeln!(out, "  {item}: {v}")?;
    }
    writeln!(out)?;
    Ok(())
}
