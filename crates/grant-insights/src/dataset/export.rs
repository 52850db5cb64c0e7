use super::Table;
use std::io::Write;

impl Table {
    /// Writes the table as CSV; missing cells are left empty.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.column_names())?;
        for row in self.rows() {
            csv_writer.write_record(row.iter().map(|value| value.to_string()))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, csv::Error> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use crate::dataset::{Column, Table, Value};
    use chrono::NaiveDate;

    #[test]
    fn writes_typed_cells() {
        let table = Table::new(vec![
            Column::new("Pt State", vec![Value::text("NE"), Value::Missing]),
            Column::new(
                "Grant Req Date",
                vec![
                    Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).expect("valid date")),
                    Value::Missing,
                ],
            ),
            Column::new("Amount", vec![Value::Number(125.5), Value::Integer(3)]),
        ])
        .expect("aligned");

        let csv = String::from_utf8(table.to_csv_bytes().expect("writes")).expect("utf8");
        assert_eq!(
            csv,
            "Pt State,Grant Req Date,Amount\nNE,2024-01-05,125.5\n,,3\n"
        );
    }

    #[test]
    fn exported_csv_parses_back_to_the_same_shape() {
        let table = Table::new(vec![Column::new(
            "Type of Assistance (CLASS)",
            vec![Value::text("Food/Groceries"), Value::text("Car Payment")],
        )])
        .expect("aligned");
        let bytes = table.to_csv_bytes().expect("writes");
        let parsed = Table::from_csv_bytes(&bytes).expect("parses");
        assert_eq!(parsed, table);
    }
}
