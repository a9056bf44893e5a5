//! Typed SQL statements emitted by the workload generator.
//!
//! Each statement renders to PostgreSQL text through [`fmt::Display`]. Keeping
//! the structured form around lets callers (and tests) inspect which tables,
//! columns and literals a statement touches without re-parsing SQL.

use std::fmt;

use super::schema::ColumnType;

/// A literal value placed into an INSERT or UPDATE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "'{s}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Eq,
    Gt,
}

impl CompareOp {
    pub const ALL: [CompareOp; 3] = [CompareOp::Lt, CompareOp::Eq, CompareOp::Gt];
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOp::Lt => "<",
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
        })
    }
}

/// One side of a WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `<col><op><n>` against an INTEGER column.
    Compare {
        column: String,
        op: CompareOp,
        value: i64,
    },
    /// `<col> = '<literal>'` against a VARCHAR column.
    Equals { column: String, literal: String },
    /// `<col> IS NULL`, used for VARCHAR columns before any string was generated.
    IsNull { column: String },
}

impl Predicate {
    pub fn column(&self) -> &str {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::Equals { column, .. }
            | Predicate::IsNull { column } => column,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { column, op, value } => write!(f, "{column}{op}{value}"),
            Predicate::Equals { column, literal } => write!(f, "{column} = '{literal}'"),
            Predicate::IsNull { column } => write!(f, "{column} IS NULL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        })
    }
}

/// Two predicates joined by `AND` or `OR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub left: Predicate,
    pub connective: Connective,
    pub right: Predicate,
}

impl WhereClause {
    pub fn predicates(&self) -> [&Predicate; 2] {
        [&self.left, &self.right]
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.connective, self.right)
    }
}

/// Coarse statement category, used for log and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    CreateTable,
    Insert,
    Select,
    Update,
    Delete,
    DropTable,
}

impl StatementKind {
    pub const ALL: [StatementKind; 6] = [
        StatementKind::CreateTable,
        StatementKind::Insert,
        StatementKind::Select,
        StatementKind::Update,
        StatementKind::Delete,
        StatementKind::DropTable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::CreateTable => "create_table",
            StatementKind::Insert => "insert",
            StatementKind::Select => "select",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::DropTable => "drop_table",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateTable {
        table: String,
        columns: Vec<(String, ColumnType)>,
        primary_key: String,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<Value>,
    },
    Select {
        table: String,
        columns: Vec<String>,
        filter: WhereClause,
    },
    Update {
        table: String,
        assignments: Vec<(String, Value)>,
        filter: WhereClause,
    },
    Delete {
        table: String,
        filter: WhereClause,
    },
    DropTable {
        table: String,
    },
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::CreateTable { .. } => StatementKind::CreateTable,
            Statement::Insert { .. } => StatementKind::Insert,
            Statement::Select { .. } => StatementKind::Select,
            Statement::Update { .. } => StatementKind::Update,
            Statement::Delete { .. } => StatementKind::Delete,
            Statement::DropTable { .. } => StatementKind::DropTable,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Statement::CreateTable { table, .. }
            | Statement::Insert { table, .. }
            | Statement::Select { table, .. }
            | Statement::Update { table, .. }
            | Statement::Delete { table, .. }
            | Statement::DropTable { table } => table,
        }
    }

    pub fn filter(&self) -> Option<&WhereClause> {
        match self {
            Statement::Select { filter, .. }
            | Statement::Update { filter, .. }
            | Statement::Delete { filter, .. } => Some(filter),
            Statement::CreateTable { .. } | Statement::Insert { .. } | Statement::DropTable { .. } => {
                None
            }
        }
    }

    /// Data columns this statement names, WHERE clause included.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut names: Vec<&str> = match self {
            Statement::CreateTable { columns, .. } => {
                columns.iter().map(|(name, _)| name.as_str()).collect()
            }
            Statement::Insert { columns, .. } | Statement::Select { columns, .. } => {
                columns.iter().map(String::as_str).collect()
            }
            Statement::Update { assignments, .. } => {
                assignments.iter().map(|(name, _)| name.as_str()).collect()
            }
            Statement::Delete { .. } | Statement::DropTable { .. } => Vec::new(),
        };
        if let Some(filter) = self.filter() {
            names.extend(filter.predicates().iter().map(|p| p.column()));
        }
        names
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::CreateTable {
                table,
                columns,
                primary_key,
            } => {
                write!(f, "CREATE TABLE {table} (")?;
                for (name, column_type) in columns {
                    write!(f, "{name} {column_type}, ")?;
                }
                write!(f, "{primary_key} SERIAL PRIMARY KEY);")
            }
            Statement::Insert {
                table,
                columns,
                values,
            } => {
                write!(f, "INSERT INTO {table} ({}) VALUES (", columns.join(","))?;
                for (i, value) in values.iter().enumerate() {
                    if i != 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str(");")
            }
            Statement::Select {
                table,
                columns,
                filter,
            } => write!(
                f,
                "SELECT {} FROM {table} WHERE {filter};",
                columns.join(", ")
            ),
            Statement::Update {
                table,
                assignments,
                filter,
            } => {
                write!(f, "UPDATE {table} SET ")?;
                for (i, (column, value)) in assignments.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{column} = {value}")?;
                }
                write!(f, " WHERE {filter};")
            }
            Statement::Delete { table, filter } => write!(f, "DELETE FROM {table} WHERE {filter};"),
            Statement::DropTable { table } => write!(f, "DROP TABLE {table};"),
        }
    }
}
