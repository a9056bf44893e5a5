//! Randomized workload generation.
//!
//! A workload is built in a fixed order:
//!
//! 1. a random [`Schema`] of `table_count` tables;
//! 2. per table, its `CREATE TABLE` followed by `seed_insert_count` full-row inserts;
//! 3. `statement_count` statements drawn uniformly from SELECT/INSERT/UPDATE/DELETE;
//! 4. one `DROP TABLE` per table, in creation order.
//!
//! Every string literal a WHERE clause compares against was produced by an
//! earlier INSERT or UPDATE of the same workload, so filters have a chance to
//! match real rows.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;

use super::identifier::generate_identifier;
use super::schema::{ColumnType, Schema, Table};
use super::statement::{CompareOp, Connective, Predicate, Statement, Value, WhereClause};

/// Inclusive bounds on generated INTEGER values, both inserted and compared.
pub const VALUE_RANGE: RangeInclusive<i64> = 1..=200;

/// Statements drawn during the random phase. DDL only appears at the edges of
/// a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrudKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl CrudKind {
    const ALL: [CrudKind; 4] = [
        CrudKind::Select,
        CrudKind::Insert,
        CrudKind::Update,
        CrudKind::Delete,
    ];
}

/// The output of one generation call: the schema it was built on and the
/// ordered statements to replay.
#[derive(Debug, Clone)]
pub struct Workload {
    schema: Schema,
    statements: Vec<Statement>,
}

impl Workload {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Render every statement to SQL text, preserving order.
    pub fn to_sql(&self) -> Vec<String> {
        self.statements.iter().map(Statement::to_string).collect()
    }
}

/// Generate a workload and render it to SQL strings.
///
/// Deterministic for a given RNG state: two calls with identically seeded
/// generators and equal parameters return identical sequences.
pub fn generate_workload<R: Rng + ?Sized>(
    rng: &mut R,
    statement_count: usize,
    table_count: usize,
    seed_insert_count: usize,
) -> Vec<String> {
    build_workload(rng, statement_count, table_count, seed_insert_count).to_sql()
}

/// Generate a workload, keeping the typed statements and schema.
///
/// With `table_count == 0` there is nothing to reference and the result is
/// empty regardless of `statement_count`.
pub fn build_workload<R: Rng + ?Sized>(
    rng: &mut R,
    statement_count: usize,
    table_count: usize,
    seed_insert_count: usize,
) -> Workload {
    let schema = Schema::generate(rng, table_count);
    let statements = {
        let mut generator = WorkloadGenerator::new(rng, &schema);
        generator.emit_schema(seed_insert_count);
        generator.emit_random(statement_count);
        generator.emit_teardown();
        generator.finish()
    };
    debug!(
        "generated workload: {} tables, {} statements",
        schema.len(),
        statements.len()
    );
    Workload { schema, statements }
}

/// Generation state for a single workload. Owns the string pool; borrows the
/// schema it emits statements against.
struct WorkloadGenerator<'a, R: ?Sized> {
    rng: &'a mut R,
    schema: &'a Schema,
    string_pool: Vec<String>,
    statements: Vec<Statement>,
}

impl<'a, R: Rng + ?Sized> WorkloadGenerator<'a, R> {
    fn new(rng: &'a mut R, schema: &'a Schema) -> Self {
        Self {
            rng,
            schema,
            string_pool: Vec::new(),
            statements: Vec::new(),
        }
    }

    fn finish(self) -> Vec<Statement> {
        self.statements
    }

    fn emit_schema(&mut self, seed_insert_count: usize) {
        let schema = self.schema;
        for table in schema.tables() {
            self.statements.push(Statement::CreateTable {
                table: table.name.clone(),
                columns: table
                    .columns
                    .iter()
                    .map(|c| (c.name.clone(), c.column_type))
                    .collect(),
                primary_key: table.primary_key.clone(),
            });
            for _ in 0..seed_insert_count {
                let insert = self.insert(table);
                self.statements.push(insert);
            }
        }
    }

    fn emit_random(&mut self, statement_count: usize) {
        let schema = self.schema;
        for _ in 0..statement_count {
            let Some(table) = schema.tables().choose(&mut *self.rng) else {
                return;
            };
            let statement = match CrudKind::ALL[self.rng.gen_range(0..CrudKind::ALL.len())] {
                CrudKind::Select => self.select(table),
                CrudKind::Insert => self.insert(table),
                CrudKind::Update => self.update(table),
                CrudKind::Delete => self.delete(table),
            };
            self.statements.push(statement);
        }
    }

    fn emit_teardown(&mut self) {
        let schema = self.schema;
        self.statements
            .extend(schema.tables().iter().map(|table| Statement::DropTable {
                table: table.name.clone(),
            }));
    }

    fn insert(&mut self, table: &Table) -> Statement {
        let values = table
            .columns
            .iter()
            .map(|c| self.random_value(c.column_type))
            .collect();
        Statement::Insert {
            table: table.name.clone(),
            columns: table.column_names().map(str::to_string).collect(),
            values,
        }
    }

    fn select(&mut self, table: &Table) -> Statement {
        let amount = self.rng.gen_range(1..=table.columns.len());
        let columns = table
            .columns
            .choose_multiple(&mut *self.rng, amount)
            .map(|c| c.name.clone())
            .collect();
        Statement::Select {
            table: table.name.clone(),
            columns,
            filter: self.where_clause(table),
        }
    }

    fn update(&mut self, table: &Table) -> Statement {
        let amount = self.rng.gen_range(1..=table.columns.len());
        let targets: Vec<_> = table
            .columns
            .choose_multiple(&mut *self.rng, amount)
            .collect();
        let assignments = targets
            .into_iter()
            .map(|c| (c.name.clone(), self.random_value(c.column_type)))
            .collect();
        Statement::Update {
            table: table.name.clone(),
            assignments,
            filter: self.where_clause(table),
        }
    }

    fn delete(&mut self, table: &Table) -> Statement {
        Statement::Delete {
            table: table.name.clone(),
            filter: self.where_clause(table),
        }
    }

    fn where_clause(&mut self, table: &Table) -> WhereClause {
        let left = self.predicate(table);
        let connective = if self.rng.gen_bool(0.5) {
            Connective::Or
        } else {
            Connective::And
        };
        let right = self.predicate(table);
        WhereClause {
            left,
            connective,
            right,
        }
    }

    fn predicate(&mut self, table: &Table) -> Predicate {
        let column = &table.columns[self.rng.gen_range(0..table.columns.len())];
        match column.column_type {
            ColumnType::Integer => Predicate::Compare {
                column: column.name.clone(),
                op: CompareOp::ALL[self.rng.gen_range(0..CompareOp::ALL.len())],
                value: self.rng.gen_range(VALUE_RANGE),
            },
            ColumnType::Varchar => match self.string_pool.choose(&mut *self.rng) {
                Some(literal) => Predicate::Equals {
                    column: column.name.clone(),
                    literal: literal.clone(),
                },
                None => Predicate::IsNull {
                    column: column.name.clone(),
                },
            },
        }
    }

    /// Random value for a column; VARCHAR values join the string pool.
    fn random_value(&mut self, column_type: ColumnType) -> Value {
        match column_type {
            ColumnType::Integer => Value::Integer(self.rng.gen_range(VALUE_RANGE)),
            ColumnType::Varchar => {
                Value::Text(generate_identifier(&mut *self.rng, &mut self.string_pool))
            }
        }
    }
}
