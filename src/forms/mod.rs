//! Form state for UIs built on top of a [`ResourceClient`](crate::client::ResourceClient).
//!
//! # Responsibilities
//! - Hold the "new record" form and validate required fields before create
//! - Hold one edit session per record id, seeded from the record being edited
//! - Produce minimal patches (changed fields only) for `update`
//!
//! # Design Decisions
//! - Edit state is keyed by `RecordId`, never by rendering identifiers
//! - Sessions only end on cancel or on a confirmed update, so a failed
//!   update keeps the user's draft

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::client::record::{Fields, Record, RecordId};

/// Form for a record that does not exist yet.
#[derive(Debug, Clone, Default)]
pub struct CreateForm {
    required: Vec<String>,
    values: Fields,
}

impl CreateForm {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            values: Fields::new(),
        }
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn values(&self) -> &Fields {
        &self.values
    }

    /// Required fields that are absent, null, or blank strings.
    pub fn missing_required(&self) -> Vec<&str> {
        self.required
            .iter()
            .filter(|field| is_blank(self.values.get(field.as_str())))
            .map(String::as_str)
            .collect()
    }

    /// Take the payload and reset the form, or report the missing fields.
    pub fn submit(&mut self) -> Result<Fields, Vec<String>> {
        let missing: Vec<String> = self.missing_required().into_iter().map(String::from).collect();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(std::mem::take(&mut self.values))
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Draft edits of one existing record.
#[derive(Debug, Clone)]
pub struct EditSession {
    seed: Fields,
    draft: Fields,
}

impl EditSession {
    fn from_record<T: Serialize>(record: &Record<T>) -> Result<Self, serde_json::Error> {
        let mut seed = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            _ => Fields::new(),
        };
        seed.remove("id");
        Ok(Self {
            draft: seed.clone(),
            seed,
        })
    }

    pub fn draft(&self) -> &Fields {
        &self.draft
    }

    /// Fields whose draft value differs from the seed.
    pub fn changes(&self) -> Fields {
        self.draft
            .iter()
            .filter(|(k, v)| self.seed.get(k.as_str()) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// All form state of one resource view.
#[derive(Debug, Clone, Default)]
pub struct FormStore {
    create: CreateForm,
    edits: HashMap<RecordId, EditSession>,
}

impl FormStore {
    pub fn new(create: CreateForm) -> Self {
        Self {
            create,
            edits: HashMap::new(),
        }
    }

    pub fn create_form(&mut self) -> &mut CreateForm {
        &mut self.create
    }

    /// Start (or restart) editing `record`, discarding any previous draft for it.
    pub fn begin_edit<T: Serialize>(&mut self, record: &Record<T>) -> Result<(), serde_json::Error> {
        let session = EditSession::from_record(record)?;
        self.edits.insert(record.id.clone(), session);
        Ok(())
    }

    pub fn is_editing(&self, id: &RecordId) -> bool {
        self.edits.contains_key(id)
    }

    pub fn editing(&self) -> impl Iterator<Item = &RecordId> {
        self.edits.keys()
    }

    /// Change one draft field. Returns false when `id` has no open session.
    pub fn set_field(&mut self, id: &RecordId, field: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.edits.get_mut(id) {
            Some(session) => {
                session.draft.insert(field.into(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn session(&self, id: &RecordId) -> Option<&EditSession> {
        self.edits.get(id)
    }

    /// Minimal patch for `update`, or `None` if nothing changed.
    pub fn patch(&self, id: &RecordId) -> Option<Fields> {
        self.edits
            .get(id)
            .map(EditSession::changes)
            .filter(|changes| !changes.is_empty())
    }

    pub fn cancel(&mut self, id: &RecordId) -> bool {
        self.edits.remove(id).is_some()
    }

    /// End the session for a record the server confirmed.
    pub fn complete<T>(&mut self, record: &Record<T>) {
        self.edits.remove(&record.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: &str, name: &str, role: &str) -> Record {
        serde_json::from_value(json!({"id": id, "name": name, "email": "a@b.c", "role": role})).unwrap()
    }

    #[test]
    fn test_create_form_required_fields() {
        let mut form = CreateForm::new(["name", "email", "role"]);
        form.set("name", "John Doe");
        form.set("email", "  ");
        assert_eq!(form.missing_required(), vec!["email", "role"]);
        assert_eq!(form.submit().unwrap_err(), vec!["email".to_string(), "role".to_string()]);

        form.set("email", "john@example.com");
        form.set("role", "developer");
        let payload = form.submit().unwrap();
        assert_eq!(payload.len(), 3);
        assert!(form.values().is_empty());
    }

    #[test]
    fn test_patch_contains_only_changes() {
        let mut store = FormStore::default();
        let record = user("1", "Ada", "developer");
        store.begin_edit(&record).unwrap();
        assert_eq!(store.patch(&record.id), None);

        assert!(store.set_field(&record.id, "role", "senior developer"));
        assert!(store.set_field(&record.id, "name", "Ada"));
        let patch = store.patch(&record.id).unwrap();
        assert_eq!(serde_json::Value::Object(patch), json!({"role": "senior developer"}));
    }

    #[test]
    fn test_sessions_keyed_by_id() {
        let mut store = FormStore::default();
        let a = user("1", "Ada", "dev");
        let b = user("2", "Bob", "ops");
        store.begin_edit(&a).unwrap();
        store.begin_edit(&b).unwrap();
        store.set_field(&b.id, "role", "sre");

        assert_eq!(store.patch(&a.id), None);
        assert!(store.patch(&b.id).is_some());
        assert!(!store.set_field(&RecordId::new("3").unwrap(), "role", "x"));

        store.complete(&b);
        assert!(!store.is_editing(&b.id));
        assert!(store.cancel(&a.id));
        assert_eq!(store.editing().count(), 0);
    }

    #[test]
    fn test_seed_excludes_id() {
        let mut store = FormStore::default();
        let record = user("9", "Ada", "dev");
        store.begin_edit(&record).unwrap();
        assert!(!store.session(&record.id).unwrap().draft().contains_key("id"));
    }
}
