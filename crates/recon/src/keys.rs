use serde::Deserialize;

use crate::error::ReconError;
use crate::model::{Dataset, MatchKey};

/// How several match-column values are combined into one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEncoding {
    /// `a|b|c`. A `|` inside a value can make two different rows collide.
    #[default]
    Pipe,
    /// `1:a|1:b|1:c`, each value prefixed with its length in chars.
    LengthPrefixed,
}

/// One key per row, `None` where the row cannot be matched.
///
/// With a single column the key is the cell itself, so numeric IDs stay
/// numeric and empty cells yield `None`. With several columns the display
/// strings are joined per `encoding` and every row gets a key.
pub fn build_keys(
    dataset: &Dataset,
    columns: &[String],
    encoding: KeyEncoding,
) -> Result<Vec<Option<MatchKey>>, ReconError> {
    let indices = columns
        .iter()
        .map(|name| {
            dataset.column_index(name).ok_or_else(|| ReconError::MissingColumn {
                column: name.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let [col] = indices[..] {
        return Ok(dataset.rows().iter().map(|r| MatchKey::from_cell(&r[col])).collect());
    }

    Ok(dataset
        .rows()
        .iter()
        .map(|row| {
            let parts: Vec<String> = indices.iter().map(|&i| row[i].to_string()).collect();
            Some(MatchKey::Text(join_parts(&parts, encoding)))
        })
        .collect())
}

fn join_parts(parts: &[String], encoding: KeyEncoding) -> String {
    match encoding {
        KeyEncoding::Pipe => parts.join("|"),
        KeyEncoding::LengthPrefixed => parts
            .iter()
            .map(|p| format!("{}:{}", p.chars().count(), p))
            .collect::<Vec<_>>()
            .join("|"),
    }
}
