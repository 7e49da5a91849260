//! Ingestion configuration
//!
//! Header names for the six sample fields and the row policy applied by each
//! write path.

use myotrack_common::types::Column;
use serde::{Deserialize, Serialize};

/// How rows with non-numeric required cells are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowPolicy {
    /// Any non-numeric required cell rejects the whole file
    Strict,
    /// Offending rows are dropped; fails only if a column has no numbers at
    /// all or nothing is left
    DropInvalidRows,
}

impl std::str::FromStr for RowPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(RowPolicy::Strict),
            "drop-invalid" | "drop_invalid" | "drop-invalid-rows" => Ok(RowPolicy::DropInvalidRows),
            _ => Err(anyhow::anyhow!(
                "Invalid row policy '{}': expected 'strict' or 'drop-invalid'",
                s
            )),
        }
    }
}

impl std::fmt::Display for RowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowPolicy::Strict => f.write_str("strict"),
            RowPolicy::DropInvalidRows => f.write_str("drop-invalid"),
        }
    }
}

/// Spreadsheet header name for each sample field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    names: [String; 6],
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            names: Column::ALL.map(|column| column.name().to_string()),
        }
    }
}

impl ColumnNames {
    /// Header expected for `column`
    pub fn get(&self, column: Column) -> &str {
        &self.names[column.index()]
    }

    pub fn with(mut self, column: Column, header: impl Into<String>) -> Self {
        self.names[column.index()] = header.into();
        self
    }

    /// Headers in [`Column::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (Column, &str)> {
        Column::ALL.into_iter().map(move |column| (column, self.get(column)))
    }

    /// Reject blank or duplicated header names
    pub fn validate(&self) -> anyhow::Result<()> {
        for (column, header) in self.iter() {
            if header.trim().is_empty() {
                anyhow::bail!("Header name for column '{}' cannot be empty", column);
            }
            if self.iter().filter(|(_, other)| *other == header).count() > 1 {
                anyhow::bail!("Header name '{}' is mapped to more than one column", header);
            }
        }
        Ok(())
    }
}

/// Settings shared by the create and replace commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSettings {
    pub columns: ColumnNames,
    pub create_policy: RowPolicy,
    pub replace_policy: RowPolicy,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            create_policy: RowPolicy::Strict,
            replace_policy: RowPolicy::DropInvalidRows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_policy_from_str() {
        assert_eq!("strict".parse::<RowPolicy>().unwrap(), RowPolicy::Strict);
        assert_eq!(" Drop-Invalid ".parse::<RowPolicy>().unwrap(), RowPolicy::DropInvalidRows);
        assert!("lenient".parse::<RowPolicy>().is_err());
    }

    #[test]
    fn test_row_policy_display_round_trips() {
        for policy in [RowPolicy::Strict, RowPolicy::DropInvalidRows] {
            assert_eq!(policy.to_string().parse::<RowPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_default_column_names() {
        let names = ColumnNames::default();
        let headers: Vec<&str> = names.iter().map(|(_, h)| h).collect();
        assert_eq!(headers, ["timestamp", "emg1", "emg2", "emg3", "emg4", "angle"]);
        assert!(names.validate().is_ok());
    }

    #[test]
    fn test_column_override() {
        let names = ColumnNames::default().with(Column::Angle, "knee_angle");
        assert_eq!(names.get(Column::Angle), "knee_angle");
        assert_eq!(names.get(Column::Emg1), "emg1");
    }

    #[test]
    fn test_duplicate_or_blank_headers_rejected() {
        let duplicate = ColumnNames::default().with(Column::Emg2, "emg1");
        assert!(duplicate.validate().is_err());

        let blank = ColumnNames::default().with(Column::Timestamp, "  ");
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_default_policies() {
        let settings = IngestSettings::default();
        assert_eq!(settings.create_policy, RowPolicy::Strict);
        assert_eq!(settings.replace_policy, RowPolicy::DropInvalidRows);
    }
}
