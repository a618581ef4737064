use rusqlite::Connection;
use std::sync::OnceLock;

use crate::scales::ScaleSet;

/// Demographic columns, a fixed enumeration family. Absent values are stored
/// as the `-1` sentinel, never NULL.
pub const DEMOGRAPHIC_FIELDS: [&str; 9] = [
    "Demo_Pais",
    "Demo_Tipo_Organizacion",
    "Demo_Industria",
    "Demo_Tamano_Org",
    "Demo_Rol_Trabajo",
    "Demo_Generacion_Edad",
    "Demo_Genero",
    "Demo_Nivel_Educacion",
    "Demo_Horas",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
}

impl ColumnKind {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// The single typed description of the `responses` table, shared by the
/// migration and the insert path so the two cannot drift. The column set is
/// the superset across survey-instrument revisions: identifier and timestamp,
/// every canonical Likert item code, the demographic fields, every scale
/// score, and the model output.
pub fn columns() -> &'static [Column] {
    static COLUMNS: OnceLock<Vec<Column>> = OnceLock::new();
    COLUMNS.get_or_init(|| {
        let scales = ScaleSet::new();
        let mut columns = vec![
            Column {
                name: "response_id".into(),
                kind: ColumnKind::Text,
            },
            Column {
                name: "timestamp".into(),
                kind: ColumnKind::Text,
            },
        ];
        for code in scales.likert_item_codes() {
            columns.push(Column {
                name: code,
                kind: ColumnKind::Integer,
            });
        }
        for field in DEMOGRAPHIC_FIELDS {
            columns.push(Column {
                name: field.into(),
                kind: ColumnKind::Integer,
            });
        }
        for definition in scales.definitions() {
            columns.push(Column {
                name: definition.name.into(),
                kind: ColumnKind::Real,
            });
        }
        columns.push(Column {
            name: "probability".into(),
            kind: ColumnKind::Real,
        });
        columns.push(Column {
            name: "risk_level".into(),
            kind: ColumnKind::Text,
        });
        columns
    })
}

pub fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
    let definitions: Vec<String> = columns()
        .iter()
        .map(|column| {
            if column.name == "response_id" {
                format!("{} {} PRIMARY KEY", column.name, column.kind.sql_type())
            } else {
                format!("{} {} NOT NULL", column.name, column.kind.sql_type())
            }
        })
        .collect();
    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS responses ({});

        CREATE INDEX IF NOT EXISTS idx_responses_timestamp ON responses(timestamp DESC);
        CREATE INDEX IF NOT EXISTS idx_responses_risk ON responses(risk_level);
        ",
        definitions.join(", ")
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_set_covers_all_record_fields() {
        let columns = columns();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"response_id"));
        assert!(names.contains(&"EX01"));
        assert!(names.contains(&"DS02"));
        assert!(names.contains(&"Demo_Horas"));
        assert!(names.contains(&"Fatiga_Global_Score"));
        assert!(names.contains(&"probability"));
        assert!(names.contains(&"risk_level"));
        // 2 meta + 82 likert items + 9 demographics + 11 scores + 2 model
        assert_eq!(columns.len(), 2 + 82 + 9 + 11 + 2);
    }

    #[test]
    fn column_names_are_unique() {
        let columns = columns();
        let mut names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), columns.len());
    }
}
