//! Schema migrations, versions and reconciliation outcomes.

use std::cmp::Ordering;
use std::fmt;

use oxide_dialect::FieldDescriptor;
use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// A declared target shape for one table.
///
/// The reconciler consumes a migration once and mutates it in place: `add`,
/// `change` and `remove` are pruned to what actually applied, and `updated`
/// is set when nothing had to be done.
///
/// ```rust
/// use oxide_dialect::{FieldDescriptor, LogicalType};
/// use oxide_migrate::SchemaMigration;
///
/// let migration = SchemaMigration::new("person", "1.0")
///     .model("Person")
///     .add(FieldDescriptor::new("id", LogicalType::Counter).primary())
///     .add(FieldDescriptor::new("name", LogicalType::Text).size(100));
///
/// assert!(migration.validate().is_ok());
/// assert_eq!(migration.add.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMigration {
    /// Target table, optionally `owner.table`.
    pub applies_to: String,
    /// Model name recorded in the ledger.
    #[serde(default)]
    pub model: Option<String>,
    /// Migration version.
    pub version: String,
    /// Description recorded in the ledger.
    #[serde(default)]
    pub description: Option<String>,
    /// Fields to add.
    #[serde(default)]
    pub add: Vec<FieldDescriptor>,
    /// Fields to change.
    #[serde(default)]
    pub change: Vec<FieldDescriptor>,
    /// Fields to remove.
    #[serde(default)]
    pub remove: Vec<FieldDescriptor>,
    /// Set when the migration required no work.
    #[serde(default)]
    pub updated: bool,
}

impl SchemaMigration {
    /// Creates an empty migration for `applies_to` at `version`.
    pub fn new(applies_to: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            applies_to: applies_to.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Parses a migration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the model name.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a field to create.
    #[must_use]
    pub fn add(mut self, field: FieldDescriptor) -> Self {
        self.add.push(field);
        self
    }

    /// Adds a field to change.
    #[must_use]
    pub fn change(mut self, field: FieldDescriptor) -> Self {
        self.change.push(field);
        self
    }

    /// Adds a field to remove.
    #[must_use]
    pub fn remove(mut self, field: FieldDescriptor) -> Self {
        self.remove.push(field);
        self
    }

    /// Checks that the migration names a table, a version and only named
    /// fields.
    pub fn validate(&self) -> Result<()> {
        if self.applies_to.trim().is_empty() {
            return Err(MigrateError::Configuration(String::from(
                "migration target table is empty",
            )));
        }
        if self.version.trim().is_empty() {
            return Err(MigrateError::Configuration(format!(
                "migration for {} has no version",
                self.applies_to
            )));
        }
        let unnamed = self
            .add
            .iter()
            .chain(&self.change)
            .chain(&self.remove)
            .any(|field| field.name.trim().is_empty());
        if unnamed {
            return Err(MigrateError::Configuration(format!(
                "migration for {} declares a field without a name",
                self.applies_to
            )));
        }
        Ok(())
    }
}

/// What a reconciliation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    /// The ledger already recorded this version or a newer one.
    AlreadyApplied,
    /// The table was created.
    Created,
    /// Columns were added or changed.
    Altered,
    /// The table already had the declared shape.
    UpToDate,
}

/// The result of [`DataAdapter::migrate`](crate::DataAdapter::migrate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOutcome {
    /// What happened.
    pub status: MigrationStatus,
    /// Number of DDL statements executed.
    pub statements: usize,
}

impl MigrationOutcome {
    pub(crate) const fn new(status: MigrationStatus, statements: usize) -> Self {
        Self { status, statements }
    }

    /// Returns true if DDL was executed.
    #[must_use]
    pub const fn applied(&self) -> bool {
        matches!(self.status, MigrationStatus::Created | MigrationStatus::Altered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Number(u64),
    Text(String),
}

impl Part {
    fn cmp_part(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (a, b) => a.to_string().cmp(&b.to_string()),
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A version string with semantic ordering.
///
/// Dot-separated parts compare numerically when both are numbers and
/// lexically otherwise; missing parts count as zero.
///
/// ```rust
/// use oxide_migrate::Version;
///
/// assert!(Version::parse("1.10") > Version::parse("1.9"));
/// assert_eq!(Version::parse("1.0"), Version::parse("1"));
/// ```
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    parts: Vec<Part>,
}

impl Version {
    /// Parses a version string. Never fails.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let parts = raw
            .split('.')
            .map(|part| match part.parse::<u64>() {
                Ok(n) => Part::Number(n),
                Err(_) => Part::Text(String::from(part)),
            })
            .collect();
        Self {
            raw: String::from(raw),
            parts,
        }
    }

    /// Returns the version as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the greatest of `versions`, if any.
    pub fn max_of<I, S>(versions: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        versions
            .into_iter()
            .map(|v| Self::parse(v.as_ref()))
            .max()
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let zero = Part::Number(0);
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| {
                let a = self.parts.get(i).unwrap_or(&zero);
                let b = other.parts.get(i).unwrap_or(&zero);
                a.cmp_part(b)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_dialect::LogicalType;

    #[test]
    fn test_version_numeric_parts() {
        assert!(Version::parse("1.10") > Version::parse("1.9"));
        assert!(Version::parse("2.0") > Version::parse("1.99.99"));
        assert_eq!(Version::parse("1.0"), Version::parse("1"));
        assert_eq!(Version::parse("1.0.0"), Version::parse("1"));
    }

    #[test]
    fn test_version_text_parts_compare_lexically() {
        assert!(Version::parse("1.0.beta") > Version::parse("1.0.alpha"));
        assert!(Version::parse("1.b") > Version::parse("1.a"));
    }

    #[test]
    fn test_version_max_of() {
        let max = Version::max_of(["1.2", "1.10", "1.9"]).unwrap();
        assert_eq!(max.as_str(), "1.10");
        assert!(Version::max_of(Vec::<String>::new()).is_none());
    }

    #[test]
    fn test_validate_rejects_blank_version() {
        let err = SchemaMigration::new("person", "  ").validate().unwrap_err();
        assert!(matches!(err, MigrateError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_empty_table() {
        assert!(SchemaMigration::new("", "1.0").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unnamed_field() {
        let migration =
            SchemaMigration::new("person", "1.0").add(FieldDescriptor::new("", LogicalType::Text));
        assert!(migration.validate().is_err());
    }

    #[test]
    fn test_from_json() {
        let migration = SchemaMigration::from_json(
            r#"{
                "appliesTo": "person",
                "model": "Person",
                "version": "1.0",
                "add": [
                    {"name": "id", "type": "Counter", "primary": true},
                    {"name": "email", "type": "Text", "size": 120, "nullable": false}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(migration.applies_to, "person");
        assert_eq!(migration.add[0].logical_type, LogicalType::Counter);
        assert_eq!(migration.add[1].nullable, Some(false));
        assert!(migration.change.is_empty());
        assert!(!migration.updated);
    }

    #[test]
    fn test_outcome_applied() {
        assert!(MigrationOutcome::new(MigrationStatus::Created, 1).applied());
        assert!(!MigrationOutcome::new(MigrationStatus::UpToDate, 0).applied());
    }
}
