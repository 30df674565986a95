use std::fmt;

/// Left-aligned text table with ascii borders.
///
/// ```text
/// +------+---------+
/// | Name | Offline |
/// +------+---------+
/// | n1   | false   |
/// +------+---------+
/// ```
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows shorter than the header are padded with empty cells, extra
    /// cells are dropped.
    pub fn add_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = row
            .into_iter()
            .map(Into::into)
            .take(self.header.len())
            .collect();
        row.resize(self.header.len(), String::new());

        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.header
            .iter()
            .enumerate()
            .map(|(column, title)| {
                self.rows
                    .iter()
                    .map(|row| row[column].chars().count())
                    .chain([title.chars().count()])
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

fn write_separator(f: &mut fmt::Formatter<'_>, widths: &[usize]) -> fmt::Result {
    for width in widths {
        write!(f, "+{}", "-".repeat(width + 2))?;
    }
    writeln!(f, "+")
}

fn write_row(f: &mut fmt::Formatter<'_>, widths: &[usize], cells: &[String]) -> fmt::Result {
    for (cell, width) in cells.iter().zip(widths) {
        let padding = width - cell.chars().count();
        write!(f, "| {}{} ", cell, " ".repeat(padding))?;
    }
    writeln!(f, "|")
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();

        write_separator(f, &widths)?;
        write_row(f, &widths, &self.header)?;
        write_separator(f, &widths)?;
        for row in &self.rows {
            write_row(f, &widths, row)?;
        }
        write_separator(f, &widths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_grow_to_widest_cell() {
        let mut table = Table::new(["Name", "Offline"]);
        table.add_row(["agent-with-long-name", "false"]);
        table.add_row(["n1", "true"]);

        assert_eq!(
            table.to_string(),
            "\
+----------------------+---------+
| Name                 | Offline |
+----------------------+---------+
| agent-with-long-name | false   |
| n1                   | true    |
+----------------------+---------+
"
        );
    }

    #[test]
    fn short_rows_are_padded() {
        let mut table = Table::new(["Name", "Labels", "Executors"]);
        table.add_row(["n1"]);

        assert!(table.to_string().contains("| n1   |        |           |"));
    }

    #[test]
    fn empty_table_has_only_header() {
        let table = Table::new(["Name", "URL"]);

        assert_eq!(table.to_string().lines().count(), 4);
    }
}
