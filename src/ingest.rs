use std::path::Path;

use anyhow::Context;

use crate::models::{DonationRecord, RejectReason};

const BUILTIN_RECORDS: &[&str] = &[
    "Ana Silva,Cesta Básica (Roupas/Alimentos),2",
    "João Pereira,Livro (Didático/Ficção),15",
    "Ana Silva,Material de Limpeza (1 Unidade),5",
    "Carlos Souza,Brinquedo (Novo ou Usado),10",
    "João Pereira,Cesta Básica (Roupas/Alimentos),1",
    "Maria Santos,Móvel (Ex: Cadeira, Mesa),1",
    "Carlos Souza,Livro (Didático/Ficção),5",
    "Maria Santos,Material de Limpeza (1 Unidade),20",
];

const BYTE_ORDER_MARK: char = '\u{feff}';

pub fn builtin_records() -> &'static [&'static str] {
    BUILTIN_RECORDS
}

/// Reads a records file. Blank lines and `#` comments are skipped but
/// still counted, so line numbers match the file.
pub fn read_records(path: &Path) -> anyhow::Result<Vec<(usize, String)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read records from {}", path.display()))?;

    let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&content);

    let records: Vec<(usize, String)> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| (index + 1, line.to_string()))
        .collect();

    tracing::debug!(path = %path.display(), records = records.len(), "records loaded");
    Ok(records)
}

fn trim_field(field: &str) -> &str {
    field.trim_matches(|c: char| c.is_whitespace() || c == BYTE_ORDER_MARK)
}

/// Splits `donor,item,quantity`. Fields past the third are ignored.
pub fn parse_record(line: &str) -> Result<DonationRecord, RejectReason> {
    let fields: Vec<&str> = line.split(',').map(trim_field).collect();
    if fields.len() < 3 {
        return Err(RejectReason::MissingFields {
            found: fields.len(),
        });
    }

    let quantity = parse_leading_int(fields[2]).ok_or(RejectReason::InvalidQuantity)?;

    Ok(DonationRecord {
        donor_name: fields[0].to_string(),
        item_name: fields[1].to_string(),
        quantity,
    })
}

/// Optional sign followed by digits; anything after the digits is ignored.
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
