//! Random identifier generation.
//!
//! Identifiers are short lowercase ASCII strings used for table names, column
//! names and VARCHAR literal values alike. The same routine feeds both a
//! throwaway scratch list and the long-lived string pool, so registration is
//! left to the caller's choice of `registry`.

use rand::Rng;
use std::ops::RangeInclusive;

/// Inclusive bounds on the length of a generated identifier.
pub const IDENTIFIER_LEN: RangeInclusive<usize> = 5..=12;

/// Keywords PostgreSQL refuses as bare table or column names.
///
/// Restricted to words a generated identifier could actually spell.
const RESERVED_WORDS: &[&str] = &[
    "analyse", "analyze", "array", "asymmetric", "between", "bigint", "binary", "check",
    "collate", "collation", "column", "concurrently", "constraint", "create", "cross",
    "default", "deferrable", "distinct", "except", "false", "fetch", "foreign", "freeze",
    "grant", "group", "having", "ilike", "initially", "inner", "intersect", "isnull",
    "lateral", "leading", "limit", "localtime", "natural", "notnull", "offset", "order",
    "outer", "overlaps", "placing", "primary", "references", "returning", "right", "select",
    "similar", "symmetric", "table", "tablesample", "trailing", "union", "unique", "using",
    "variadic", "verbose", "where", "window",
];

/// Generate a random identifier, append it to `registry` and return it.
///
/// The length is drawn uniformly from [`IDENTIFIER_LEN`] and every character
/// uniformly from `a..=z`. Callers that do not care about history pass an empty
/// scratch vector.
pub fn generate_identifier<R: Rng + ?Sized>(rng: &mut R, registry: &mut Vec<String>) -> String {
    let len = rng.gen_range(IDENTIFIER_LEN);
    let ident: String = (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
    registry.push(ident.clone());
    ident
}

/// Whether `ident` collides with a reserved PostgreSQL keyword.
pub fn is_reserved(ident: &str) -> bool {
    RESERVED_WORDS.contains(&ident)
}
