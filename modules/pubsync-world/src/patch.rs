//! Field-level patches carried by live "object updated" events.
//!
//! The stream never resends the whole object. It names the fields that
//! changed plus the version they produced, so a patch only means something
//! against a base value that is already known.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SpaceObject, UserObject};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum UserField {
    Name(String),
    ExternalId(Option<String>),
    ProfileUrl(Option<String>),
    Email(Option<String>),
    Custom(Option<serde_json::Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum SpaceField {
    Name(String),
    Description(Option<String>),
    Custom(Option<serde_json::Value>),
}

/// Changed fields of one object plus the version the change produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPatch<F> {
    pub id: String,
    pub e_tag: String,
    pub updated: DateTime<Utc>,
    #[serde(default = "Vec::new")]
    pub changes: Vec<F>,
}

/// A wire object a patch can be written onto.
pub trait PatchTarget {
    type Field;

    fn target_id(&self) -> &str;
    fn apply_field(&mut self, field: &Self::Field);
    fn stamp(&mut self, e_tag: &str, updated: DateTime<Utc>);
}

impl<F> ObjectPatch<F> {
    pub fn new(id: impl Into<String>, e_tag: impl Into<String>, updated: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            e_tag: e_tag.into(),
            updated,
            changes: Vec::new(),
        }
    }

    pub fn with_change(mut self, field: F) -> Self {
        self.changes.push(field);
        self
    }

    /// Write the changed fields and the new version onto `base`.
    ///
    /// Returns `None` when `base` is a different object. Whether the result
    /// may replace the stored value is the caller's decision.
    pub fn apply<T>(&self, mut base: T) -> Option<T>
    where
        T: PatchTarget<Field = F>,
    {
        if base.target_id() != self.id {
            return None;
        }
        for change in &self.changes {
            base.apply_field(change);
        }
        base.stamp(&self.e_tag, self.updated);
        Some(base)
    }
}

impl PatchTarget for UserObject {
    type Field = UserField;

    fn target_id(&self) -> &str {
        &self.id
    }

    fn apply_field(&mut self, field: &UserField) {
        match field {
            UserField::Name(name) => self.name = name.clone(),
            UserField::ExternalId(value) => self.external_id = value.clone(),
            UserField::ProfileUrl(value) => self.profile_url = value.clone(),
            UserField::Email(value) => self.email = value.clone(),
            UserField::Custom(value) => self.custom = value.clone(),
        }
    }

    fn stamp(&mut self, e_tag: &str, updated: DateTime<Utc>) {
        self.e_tag = e_tag.to_string();
        self.updated = updated;
    }
}

impl PatchTarget for SpaceObject {
    type Field = SpaceField;

    fn target_id(&self) -> &str {
        &self.id
    }

    fn apply_field(&mut self, field: &SpaceField) {
        match field {
            SpaceField::Name(name) => self.name = name.clone(),
            SpaceField::Description(value) => self.description = value.clone(),
            SpaceField::Custom(value) => self.custom = value.clone(),
        }
    }

    fn stamp(&mut self, e_tag: &str, updated: DateTime<Utc>) {
        self.e_tag = e_tag.to_string();
        self.updated = updated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user() -> UserObject {
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        UserObject {
            id: "u1".into(),
            name: "Ada".into(),
            external_id: None,
            profile_url: None,
            email: Some("ada@example.com".into()),
            custom: None,
            created: t0,
            updated: t0,
            e_tag: "e1".into(),
        }
    }

    #[test]
    fn patch_rewrites_named_fields_and_version() {
        let later = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
        let patch = ObjectPatch::new("u1", "e2", later)
            .with_change(UserField::Name("Ada L.".into()))
            .with_change(UserField::Email(None));

        let patched = patch.apply(user()).unwrap();
        assert_eq!(patched.name, "Ada L.");
        assert_eq!(patched.email, None);
        assert_eq!(patched.e_tag, "e2");
        assert_eq!(patched.updated, later);
        assert_eq!(patched.created, user().created);
    }

    #[test]
    fn patch_for_other_object_is_rejected() {
        let patch: ObjectPatch<UserField> = ObjectPatch::new("u2", "e2", Utc::now());
        assert!(patch.apply(user()).is_none());
    }
}
