use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::reporting::table::Table;

/// Writes `table` as `;`-separated CSV. The first column holds the row names.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

    let mut header = vec![String::new()];
    header.extend(table.columns().iter().cloned());
    csv_wtr.write_record(&header)?;

    for row in table.rows() {
        csv_wtr.write_record(std::iter::once(&row.name).chain(row.values.iter()))?;
    }

    csv_wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(table, file)?;
    log::info!("Wrote table with {} rows to '{}'.", table.rows().len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_layout() {
        let mut table = Table::new(["Length [s]", "BPs"]);
        table.push_row("SFTPRO", vec!["10.8".to_string(), "9".to_string()]).unwrap();
        table.push_row("LHC; pilot", vec!["13.2".to_string(), "11".to_string()]).unwrap();

        let mut buffer = Vec::new();
        write_csv(&table, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, ";Length [s];BPs\nSFTPRO;10.8;9\n\"LHC; pilot\";13.2;11\n");
    }
}
