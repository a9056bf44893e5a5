//! In-memory schema model for a generated workload.

use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;

use super::identifier::{generate_identifier, is_reserved};

/// Inclusive bounds on the number of declared columns per table.
///
/// The primary key column is added on top and is not counted here.
pub const COLUMN_COUNT: RangeInclusive<usize> = 2..=8;

/// Column types the generator knows how to declare and populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Varchar,
}

impl ColumnType {
    /// Every variant, in declaration order.
    pub const ALL: [ColumnType; 2] = [ColumnType::Integer, ColumnType::Varchar];

    /// DDL spelling of the type.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Varchar => "VARCHAR(50)",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// A generated table: declared columns plus a `SERIAL` primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    /// Name of the auto-incrementing key column. Never referenced by DML.
    pub primary_key: String,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// The set of tables for one trial, in construction order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: Vec<Table>,
}

impl Schema {
    /// Build `table_count` random tables.
    ///
    /// Table names are unique within the schema, and column names are unique
    /// within their table (primary key included). Names that collide or spell a
    /// reserved keyword are redrawn.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, table_count: usize) -> Self {
        let mut table_names = HashSet::with_capacity(table_count);
        let mut tables = Vec::with_capacity(table_count);

        for _ in 0..table_count {
            let column_count = rng.gen_range(COLUMN_COUNT);
            let mut column_names = HashSet::with_capacity(column_count + 1);
            let columns = (0..column_count)
                .map(|_| Column {
                    name: fresh_name(rng, &mut column_names),
                    column_type: ColumnType::ALL[rng.gen_range(0..ColumnType::ALL.len())],
                })
                .collect();
            let name = fresh_name(rng, &mut table_names);
            let primary_key = fresh_name(rng, &mut column_names);
            tables.push(Table {
                name,
                columns,
                primary_key,
            });
        }

        Self { tables }
    }

    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn fresh_name<R: Rng + ?Sized>(rng: &mut R, taken: &mut HashSet<String>) -> String {
    let mut scratch = Vec::with_capacity(1);
    loop {
        scratch.clear();
        let candidate = generate_identifier(rng, &mut scratch);
        if !is_reserved(&candidate) && taken.insert(candidate.clone()) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_column_type_sql() {
        assert_eq!(ColumnType::Integer.sql_type(), "INTEGER");
        assert_eq!(ColumnType::Varchar.to_string(), "VARCHAR(50)");
    }

    #[test]
    fn test_generate_table_count() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(Schema::generate(&mut rng, 0).is_empty());
        assert_eq!(Schema::generate(&mut rng, 5).len(), 5);
    }

    #[test]
    fn test_column_counts_in_range() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            for table in Schema::generate(&mut rng, 3).tables() {
                assert!(COLUMN_COUNT.contains(&table.columns.len()));
                seen.insert(table.columns.len());
            }
        }
        assert_eq!(seen.len(), COLUMN_COUNT.count());
    }

    #[test]
    fn test_names_are_distinct() {
        let mut rng = StdRng::seed_from_u64(3);
        let schema = Schema::generate(&mut rng, 20);

        let table_names: HashSet<_> = schema.tables().iter().map(|t| &t.name).collect();
        assert_eq!(table_names.len(), 20);

        for table in schema.tables() {
            let mut names: HashSet<&str> = table.column_names().collect();
            assert_eq!(names.len(), table.columns.len());
            assert!(names.insert(table.primary_key.as_str()), "primary key clashes with a column");
            assert!(table.column_names().all(|n| !is_reserved(n)));
        }
    }

    #[test]
    fn test_lookup() {
        let table = Table {
            name: "orders".to_string(),
            columns: vec![
                Column { name: "total".to_string(), column_type: ColumnType::Integer },
                Column { name: "label".to_string(), column_type: ColumnType::Varchar },
            ],
            primary_key: "orderid".to_string(),
        };
        let schema = Schema::from_tables(vec![table]);

        let orders = schema.table("orders").expect("table exists");
        assert_eq!(orders.column("label").map(|c| c.column_type), Some(ColumnType::Varchar));
        assert!(orders.column("orderid").is_none());
        assert!(schema.table("missing").is_none());
    }
}
