use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::reporting::table::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct LatexOptions {
    /// Column specification of the `tabular` environment, e.g. `lccc`.
    pub column_format: String,
    /// Wrap headers in `\rot{}` (needs the macro in the document preamble).
    pub rotate_columns: bool,
    pub drop_columns_if_empty: bool,
}

impl LatexOptions {
    pub fn new(column_format: impl Into<String>) -> Self {
        LatexOptions { column_format: column_format.into(), rotate_columns: false, drop_columns_if_empty: false }
    }
}

fn escape(text: &str) -> String {
    text.replace('_', "\\textunderscore ").replace('%', "\\%").replace('&', "\\&")
}

/// Renders `table` as a booktabs `tabular`.
pub fn to_latex(table: &Table, options: &LatexOptions) -> String {
    let mut table = table.clone();
    if options.drop_columns_if_empty {
        table.drop_empty_columns();
    }

    let headers: Vec<String> = table
        .columns()
        .iter()
        .map(|c| if options.rotate_columns { format!("\\rot{{{}}}", escape(c)) } else { escape(c) })
        .collect();

    let mut out = String::new();
    out.push_str(&format!("\\begin{{tabular}}{{{}}}\n", options.column_format));
    out.push_str("\\toprule\n");
    out.push_str(&format!("{{}} & {} \\\\\n", headers.join(" & ")));
    out.push_str("\\midrule\n");
    for row in table.rows() {
        let values: Vec<String> = row.values.iter().map(|v| escape(v)).collect();
        out.push_str(&format!("{} & {} \\\\\n", escape(&row.name), values.join(" & ")));
    }
    out.push_str("\\bottomrule\n");
    out.push_str("\\end{tabular}\n");
    out
}

pub fn write_latex_file(table: &Table, path: &Path, options: &LatexOptions) -> Result<()> {
    fs::write(path, to_latex(table, options))?;
    log::info!("Wrote LaTeX table to '{}'.", path.display());
    Ok(())
}
