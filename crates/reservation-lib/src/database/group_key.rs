//! Equivalence-class keys for reserved-instance matching
//!
//! A running instance and a reservation are reconciled together only when
//! they resolve to the same key: `db.<family>/<engine>/<MultiAZ|SingleAZ>`.
//! The running side knows its engine name while the reservation side knows a
//! product description; `EngineMapping` bridges the two vocabularies.

use crate::error::{ReservationError, Result};
use crate::models::DbInstance;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(family: &str, engine: &str, multi_az: bool) -> Self {
        let az = if multi_az { "MultiAZ" } else { "SingleAZ" };
        Self(format!("{}/{}/{}", family, engine, az))
    }

    /// Key of a running instance, translating its engine through `mapping`
    pub fn for_db_instance(instance: &DbInstance, mapping: &EngineMapping) -> Result<Self> {
        let family = instance_class_family(&instance.instance_class)?;
        Ok(Self::new(
            family,
            mapping.product_description(&instance.engine),
            instance.multi_az,
        ))
    }

    /// Key of a reservation
    pub fn for_reservation(
        instance_class: &str,
        product_description: &str,
        multi_az: bool,
    ) -> Result<Self> {
        let family = instance_class_family(instance_class)?;
        Ok(Self::new(family, product_description, multi_az))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Instance class without its size token, e.g. `db.r5` for `db.r5.large`
pub fn instance_class_family(instance_class: &str) -> Result<&str> {
    let mut parts = instance_class.splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("db"), Some(family), Some(size)) if !family.is_empty() && !size.is_empty() => {
            Ok(&instance_class[..3 + family.len()])
        }
        _ => Err(ReservationError::InvalidValue {
            field: "DBInstanceClass",
            value: instance_class.to_string(),
        }),
    }
}

/// Maps a running instance's engine name to a reservation product description
///
/// Without aliases the engine name is used as-is. Aliases override single
/// engines where the two vocabularies differ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineMapping {
    aliases: BTreeMap<String, String>,
}

impl EngineMapping {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn with_alias(mut self, engine: impl Into<String>, description: impl Into<String>) -> Self {
        self.aliases.insert(engine.into(), description.into());
        self
    }

    pub fn product_description<'a>(&'a self, engine: &'a str) -> &'a str {
        self.aliases.get(engine).map(String::as_str).unwrap_or(engine)
    }
}

impl From<BTreeMap<String, String>> for EngineMapping {
    fn from(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchase_method::RdsPurchaseMethod;

    fn db(class: &str, engine: &str, multi_az: bool) -> DbInstance {
        DbInstance {
            identifier: "db-1".to_string(),
            instance_class: class.to_string(),
            engine: engine.to_string(),
            multi_az,
            purchase_method: RdsPurchaseMethod::ReservedInstance,
        }
    }

    #[test]
    fn test_family_strips_size() {
        assert_eq!(instance_class_family("db.r5.large").unwrap(), "db.r5");
        assert_eq!(instance_class_family("db.x2g.16xlarge").unwrap(), "db.x2g");
        assert!(instance_class_family("r5.large").is_err());
        assert!(instance_class_family("db.r5").is_err());
    }

    #[test]
    fn test_key_format() {
        let key = GroupKey::for_db_instance(&db("db.r5.large", "postgres", false), &EngineMapping::identity())
            .unwrap();
        assert_eq!(key.as_str(), "db.r5/postgres/SingleAZ");
    }

    #[test]
    fn test_key_is_stable_across_sizes() {
        let mapping = EngineMapping::identity();
        let a = GroupKey::for_db_instance(&db("db.r5.large", "mysql", true), &mapping).unwrap();
        let b = GroupKey::for_db_instance(&db("db.r5.4xlarge", "mysql", true), &mapping).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_each_dimension_changes_key() {
        let mapping = EngineMapping::identity();
        let base = GroupKey::for_db_instance(&db("db.r5.large", "mysql", true), &mapping).unwrap();
        let family = GroupKey::for_db_instance(&db("db.m5.large", "mysql", true), &mapping).unwrap();
        let engine = GroupKey::for_db_instance(&db("db.r5.large", "postgres", true), &mapping).unwrap();
        let az = GroupKey::for_db_instance(&db("db.r5.large", "mysql", false), &mapping).unwrap();
        assert_ne!(base, family);
        assert_ne!(base, engine);
        assert_ne!(base, az);
    }

    #[test]
    fn test_running_and_reserved_keys_match() {
        let mapping = EngineMapping::identity();
        let running = GroupKey::for_db_instance(&db("db.r5.xlarge", "postgres", true), &mapping).unwrap();
        let reserved = GroupKey::for_reservation("db.r5.2xlarge", "postgres", true).unwrap();
        assert_eq!(running, reserved);
    }

    #[test]
    fn test_engine_alias_applies_to_running_side() {
        let mapping = EngineMapping::identity().with_alias("aurora-postgresql", "aurora-postgresql-compat");
        let running = GroupKey::for_db_instance(&db("db.r6g.large", "aurora-postgresql", false), &mapping)
            .unwrap();
        assert_eq!(running.as_str(), "db.r6g/aurora-postgresql-compat/SingleAZ");

        // Unaliased engines pass through unchanged
        assert_eq!(mapping.product_description("mysql"), "mysql");
    }
}
