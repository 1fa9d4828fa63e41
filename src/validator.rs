// ===============================
// src/validator.rs
// ===============================
//
// Validasi input penjualan: teks mentah -> SalesRecord.
// Pure function, tanpa I/O. Retry loop ada di prompt.rs.
//
use crate::domain::{Catalog, SalesRecord};
use crate::error::ValidationError;

/// How picky validation is about values that parse fine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Accept any integer, including negative sales.
    #[default]
    Lenient,
    /// Reject negative sales; stock rows must not carry unknown items.
    Strict,
}

impl Strictness {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" | "loose" => Some(Strictness::Lenient),
            "strict" => Some(Strictness::Strict),
            _ => None,
        }
    }
}

/// Split a comma separated line and validate it.
pub fn parse_line(
    line: &str,
    catalog: &Catalog,
    strictness: Strictness,
) -> Result<SalesRecord, ValidationError> {
    let tokens: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
    validate(&tokens, catalog, strictness)
}

/// Every token must be a whole number, then the count must equal the catalog size.
pub fn validate<S: AsRef<str>>(
    raw: &[S],
    catalog: &Catalog,
    strictness: Strictness,
) -> Result<SalesRecord, ValidationError> {
    // 1) format dulu (sama seperti urutan cek upstream)
    let mut values = Vec::with_capacity(raw.len());
    for (position, token) in raw.iter().enumerate() {
        let token = token.as_ref().trim();
        let v = token.parse::<i64>().map_err(|_| ValidationError::Format {
            token: token.to_string(),
            position: position + 1,
        })?;
        values.push(v);
    }

    // 2) arity
    if values.len() != catalog.len() {
        return Err(ValidationError::Arity {
            expected: catalog.len(),
            got: values.len(),
        });
    }

    let record = SalesRecord::from_catalog(catalog, &values);

    // 3) opsional: tolak penjualan negatif
    if strictness == Strictness::Strict {
        if let Some((item, value)) = record.iter().find(|(_, v)| *v < 0) {
            return Err(ValidationError::Negative { item: item.clone(), value });
        }
    }
    Ok(record)
}
