//! SQL statement construction
//!
//! Table and column names are quoted and interpolated into the statement text.
//! Values never are: every value position becomes a placeholder and the value
//! travels in [`Statement::parameters`]. A second rendering with escaped
//! literals in place of the placeholders is kept for logging.

use serde_json::Value;

use crate::schema::{ColumnInfo, TableSchema};

/// SQL flavour of the connected database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
    MySql,
}

impl Dialect {
    /// Quote an identifier (table or column name)
    ///
    /// SQLite and PostgreSQL use double quotes, MySQL uses backticks. The quote
    /// character inside the identifier is doubled.
    pub fn quote_identifier(self, identifier: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", identifier.replace('`', "``")),
            Dialect::Sqlite | Dialect::Postgres => {
                format!("\"{}\"", identifier.replace('"', "\"\""))
            }
        }
    }

    /// Render a value as a SQL literal that cannot terminate early
    ///
    /// MySQL gets backslash escapes for quote, backslash and control
    /// characters; SQLite and PostgreSQL get doubled single quotes.
    pub fn escape_literal(self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => number.to_string(),
            Value::String(text) => self.escape_string(text),
            nested => self.escape_string(&nested.to_string()),
        }
    }

    fn escape_string(self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len() + 2);
        escaped.push('\'');

        match self {
            Dialect::MySql => {
                for character in text.chars() {
                    match character {
                        '\0' => escaped.push_str("\\0"),
                        '\u{8}' => escaped.push_str("\\b"),
                        '\t' => escaped.push_str("\\t"),
                        '\n' => escaped.push_str("\\n"),
                        '\r' => escaped.push_str("\\r"),
                        '\u{1a}' => escaped.push_str("\\Z"),
                        '"' => escaped.push_str("\\\""),
                        '\'' => escaped.push_str("\\'"),
                        '\\' => escaped.push_str("\\\\"),
                        other => escaped.push(other),
                    }
                }
            }
            Dialect::Sqlite | Dialect::Postgres => {
                for character in text.chars() {
                    if character == '\'' {
                        escaped.push_str("''");
                    } else {
                        escaped.push(character);
                    }
                }
            }
        }

        escaped.push('\'');
        escaped
    }
}

/// A parameterised statement ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Statement text with placeholders
    pub sql: String,

    /// Values bound to the placeholders, in order
    pub parameters: Vec<Value>,

    /// Statement text with escaped literals instead of placeholders (for logs)
    pub rendered: String,
}

struct StatementBuilder {
    dialect: Dialect,
    sql: String,
    rendered: String,
    parameters: Vec<Value>,
}

impl StatementBuilder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            rendered: String::new(),
            parameters: Vec::new(),
        }
    }

    fn push(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
        self.rendered.push_str(fragment);
    }

    fn push_identifier(&mut self, identifier: &str) {
        let quoted = self.dialect.quote_identifier(identifier);
        self.push(&quoted);
    }

    /// Append a placeholder for `value`
    ///
    /// PostgreSQL placeholders are cast to the column's catalog type, since
    /// JSON strings and numbers are bound as `text`/`int8`/`float8`.
    fn push_value(&mut self, value: &Value, column: Option<&ColumnInfo>) {
        self.parameters.push(value.clone());

        let placeholder = match (self.dialect, column) {
            (Dialect::Postgres, Some(column)) => format!(
                "CAST(${} AS {})",
                self.parameters.len(),
                self.dialect.quote_identifier(&column.data_type)
            ),
            (Dialect::Postgres, None) => format!("${}", self.parameters.len()),
            (Dialect::Sqlite | Dialect::MySql, _) => "?".to_string(),
        };

        self.sql.push_str(&placeholder);
        self.rendered.push_str(&self.dialect.escape_literal(value));
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            parameters: self.parameters,
            rendered: self.rendered,
        }
    }
}

/// `SELECT *` over a whole table
pub fn select_all(dialect: Dialect, table: &str) -> String {
    format!("SELECT * FROM {}", dialect.quote_identifier(table))
}

/// `INSERT INTO table (columns...) VALUES (placeholders...)`
pub fn insert(dialect: Dialect, schema: &TableSchema, values: &[(String, Value)]) -> Statement {
    let mut builder = StatementBuilder::new(dialect);

    builder.push("INSERT INTO ");
    builder.push_identifier(&schema.name);
    builder.push(" (");
    for (index, (column, _)) in values.iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder.push_identifier(column);
    }
    builder.push(") VALUES (");
    for (index, (column, value)) in values.iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder.push_value(value, schema.column(column));
    }
    builder.push(")");

    builder.finish()
}

/// `UPDATE table SET col = ?, ... WHERE key = ?`
pub fn update(
    dialect: Dialect,
    schema: &TableSchema,
    assignments: &[(String, Value)],
    key: &str,
    identifier: &Value,
) -> Statement {
    let mut builder = StatementBuilder::new(dialect);

    builder.push("UPDATE ");
    builder.push_identifier(&schema.name);
    builder.push(" SET ");
    for (index, (column, value)) in assignments.iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder.push_identifier(column);
        builder.push(" = ");
        builder.push_value(value, schema.column(column));
    }
    builder.push(" WHERE ");
    builder.push_identifier(key);
    builder.push(" = ");
    builder.push_value(identifier, schema.column(key));

    builder.finish()
}

/// `DELETE FROM table WHERE key = ?`
pub fn delete(dialect: Dialect, schema: &TableSchema, key: &str, identifier: &Value) -> Statement {
    let mut builder = StatementBuilder::new(dialect);

    builder.push("DELETE FROM ");
    builder.push_identifier(&schema.name);
    builder.push(" WHERE ");
    builder.push_identifier(key);
    builder.push(" = ");
    builder.push_value(identifier, schema.column(key));

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn employee_schema(data_type: &str) -> TableSchema {
        let column = |name: &str, is_primary_key: bool| ColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: !is_primary_key,
            default_value: None,
            is_primary_key,
        };
        TableSchema {
            name: "employee".to_string(),
            columns: vec![
                column("emp_id", true),
                column("first_name", false),
                column("last_name", false),
            ],
            primary_key: Some(vec!["emp_id".to_string()]),
        }
    }

    /// Read one quoted literal back the way the database would and return
    /// it with whatever text follows the closing quote.
    fn unquote(dialect: Dialect, literal: &str) -> (String, String) {
        let mut characters = literal.chars();
        assert_eq!(characters.next(), Some('\''));
        let mut value = String::new();
        while let Some(character) = characters.next() {
            match (dialect, character) {
                (Dialect::MySql, '\\') => {
                    let escaped = characters.next().expect("dangling escape");
                    value.push(match escaped {
                        '0' => '\0',
                        'b' => '\u{8}',
                        't' => '\t',
                        'n' => '\n',
                        'r' => '\r',
                        'Z' => '\u{1a}',
                        other => other,
                    });
                }
                (_, '\'') => {
                    let rest: String = characters.clone().collect();
                    if dialect != Dialect::MySql && rest.starts_with('\'') {
                        characters.next();
                        value.push('\'');
                    } else {
                        return (value, rest);
                    }
                }
                (_, other) => value.push(other),
            }
        }
        panic!("literal was never closed: {literal}");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(Dialect::Sqlite.quote_identifier("users"), "\"users\"");
        assert_eq!(
            Dialect::Postgres.quote_identifier("table\"name"),
            "\"table\"\"name\""
        );
        assert_eq!(Dialect::MySql.quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_escape_literal_scalars() {
        assert_eq!(Dialect::MySql.escape_literal(&Value::Null), "NULL");
        assert_eq!(Dialect::MySql.escape_literal(&json!(true)), "true");
        assert_eq!(Dialect::Sqlite.escape_literal(&json!(75000)), "75000");
        assert_eq!(Dialect::Postgres.escape_literal(&json!(1.5)), "1.5");
        assert_eq!(Dialect::MySql.escape_literal(&json!("O'Brien")), "'O\\'Brien'");
        assert_eq!(Dialect::Sqlite.escape_literal(&json!("O'Brien")), "'O''Brien'");
    }

    #[test]
    fn test_escaped_strings_never_close_early() {
        let hostile = [
            "'",
            "''",
            "\\'",
            "Robert'); DROP TABLE employee; --",
            "trailing backslash \\",
            "quote \" and 'single' \\' mix",
            "line\nbreak\r\0nul\u{1a}",
        ];

        for dialect in [Dialect::Sqlite, Dialect::Postgres, Dialect::MySql] {
            for text in hostile {
                let literal = dialect.escape_literal(&json!(text));
                let (value, rest) = unquote(dialect, &literal);
                assert_eq!(value, text, "{dialect:?} altered {text:?}");
                assert!(rest.is_empty(), "{dialect:?} literal for {text:?} ended early");
            }
        }
    }

    #[test]
    fn test_insert_binds_every_value() {
        let schema = employee_schema("INTEGER");
        let values = vec![
            ("emp_id".to_string(), json!(111)),
            ("first_name".to_string(), json!("O'Brien")),
            ("last_name".to_string(), json!("x'); DELETE FROM employee; --")),
        ];

        let statement = insert(Dialect::Sqlite, &schema, &values);

        assert_eq!(
            statement.sql,
            "INSERT INTO \"employee\" (\"emp_id\", \"first_name\", \"last_name\") VALUES (?, ?, ?)"
        );
        assert_eq!(
            statement.parameters,
            vec![json!(111), json!("O'Brien"), json!("x'); DELETE FROM employee; --")]
        );
        assert!(!statement.sql.contains("Brien"));
        assert!(statement.rendered.contains("'O''Brien'"));
    }

    #[test]
    fn test_update_uses_resolved_key() {
        let schema = employee_schema("INTEGER");
        let assignments = vec![("last_name".to_string(), json!("Baia"))];

        let statement = update(Dialect::MySql, &schema, &assignments, "emp_id", &json!("102"));

        assert_eq!(
            statement.sql,
            "UPDATE `employee` SET `last_name` = ? WHERE `emp_id` = ?"
        );
        assert_eq!(statement.parameters, vec![json!("Baia"), json!("102")]);
        assert_eq!(
            statement.rendered,
            "UPDATE `employee` SET `last_name` = 'Baia' WHERE `emp_id` = '102'"
        );
    }

    #[test]
    fn test_postgres_placeholders_cast_to_column_type() {
        let schema = employee_schema("int4");
        let assignments = vec![
            ("first_name".to_string(), json!("Jim")),
            ("nickname".to_string(), json!("Big Tuna")),
        ];

        let statement = update(Dialect::Postgres, &schema, &assignments, "emp_id", &json!(108));

        assert_eq!(
            statement.sql,
            "UPDATE \"employee\" SET \"first_name\" = CAST($1 AS \"int4\"), \"nickname\" = $2 WHERE \"emp_id\" = CAST($3 AS \"int4\")"
        );
        assert_eq!(statement.parameters.len(), 3);
    }

    #[test]
    fn test_delete_statement() {
        let schema = employee_schema("INTEGER");
        let statement = delete(Dialect::Sqlite, &schema, "emp_id", &json!(107));

        assert_eq!(statement.sql, "DELETE FROM \"employee\" WHERE \"emp_id\" = ?");
        assert_eq!(statement.parameters, vec![json!(107)]);
        assert_eq!(
            statement.rendered,
            "DELETE FROM \"employee\" WHERE \"emp_id\" = 107"
        );
    }

    #[test]
    fn test_select_all_quotes_table() {
        assert_eq!(
            select_all(Dialect::Sqlite, "branch supplier"),
            "SELECT * FROM \"branch supplier\""
        );
    }
}
