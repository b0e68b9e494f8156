use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};

use super::{DATA_MARKER, FIELDS_MARKER, METADATA_MARKER, SIGNATURE_LINE};
use crate::{io_utils, table::RawTable};

/// Serializes prepared METADATA and FIELDS lines followed by a table.
#[derive(Debug, Clone, Copy)]
pub struct IcsvWriter<'a> {
    pub metadata_lines: &'a [String],
    pub fields_lines: &'a [String],
    pub delimiter: u8,
}

impl IcsvWriter<'_> {
    pub fn write<W: Write>(&self, mut out: W, table: &RawTable) -> Result<()> {
        writeln!(out, "{SIGNATURE_LINE}")?;
        writeln!(out, "{METADATA_MARKER}")?;
        for line in self.metadata_lines {
            writeln!(out, "# {line}")?;
        }
        writeln!(out)?;
        writeln!(out, "{FIELDS_MARKER}")?;
        for line in self.fields_lines {
            writeln!(out, "# {line}")?;
        }
        writeln!(out)?;
        writeln!(out, "{DATA_MARKER}")?;

        let width = table.column_count();
        let mut writer = io_utils::open_csv_writer(out, self.delimiter);
        writer
            .write_record(&table.header)
            .context("Writing DATA header")?;
        for (idx, row) in table.rows.iter().enumerate() {
            let result = if row.len() < width {
                writer.write_record(io_utils::fit_row(row.clone(), width))
            } else {
                writer.write_record(row)
            };
            result.with_context(|| format!("Writing DATA row {}", idx + 1))?;
        }
        writer.flush().context("Flushing iCSV output")?;
        Ok(())
    }
}

pub fn write_icsv(path: &Path, writer: &IcsvWriter<'_>, table: &RawTable) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Creating iCSV file {path:?}"))?;
    writer
        .write(BufWriter::new(file), table)
        .with_context(|| format!("Writing iCSV file {path:?}"))
}
