use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug)]
pub(crate) struct CatalogRecord {
    pub(crate) line: u64,
    pub(crate) id: u32,
    pub(crate) order_number: u16,
    pub(crate) dimension: String,
    pub(crate) option_a_maps_to_first: bool,
    pub(crate) active: bool,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<CatalogRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
        let row = record?;
        records.push(CatalogRecord {
            // header occupies line 1
            line: index as u64 + 2,
            id: row.id,
            order_number: row.order_number,
            dimension: row.dimension,
            option_a_maps_to_first: row.option_a_maps_to_first,
            active: row.active.unwrap_or(true),
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: u32,
    order_number: u16,
    dimension: String,
    #[serde(deserialize_with = "flag")]
    option_a_maps_to_first: bool,
    #[serde(default, deserialize_with = "optional_flag")]
    active: Option<bool>,
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid flag '{raw}'")))
}

fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.filter(|value| !value.trim().is_empty()) {
        Some(value) => parse_flag(&value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid flag '{value}'"))),
        None => Ok(None),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}
