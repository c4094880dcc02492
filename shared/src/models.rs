use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::object_id::ObjectId;

// ═══════════════════════════════════════════════════════════════════════════
// CONTACT TYPES
// ═══════════════════════════════════════════════════════════════════════════

/// Postal address attached to a contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    pub city: String,
    #[serde(default)]
    pub zip: Option<String>,
}

/// A stored contact record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Address,
    pub tags: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating or fully replacing a contact
#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub address: Address,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Partial update of an address; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPatch {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
}

/// Partial update of a contact; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<AddressPatch>,
    pub tags: Option<Vec<String>>,
    pub active: Option<bool>,
}

impl Contact {
    pub fn from_new(new: NewContact) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::generate(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            address: new.address,
            tags: new.tags,
            active: new.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every mutable field, keeping identity and creation time.
    pub fn replace(&mut self, new: NewContact) {
        self.name = new.name;
        self.email = new.email;
        self.phone = new.phone;
        self.address = new.address;
        self.tags = new.tags;
        self.active = new.active.unwrap_or(self.active);
        self.updated_at = Utc::now();
    }

    pub fn apply_patch(&mut self, patch: ContactPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }
        if let Some(address) = patch.address {
            if let Some(street) = address.street {
                self.address.street = Some(street);
            }
            if let Some(city) = address.city {
                self.address.city = city;
            }
            if let Some(zip) = address.zip {
                self.address.zip = Some(zip);
            }
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Contact {
        Contact::from_new(NewContact {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            address: Address {
                street: None,
                city: "London".to_string(),
                zip: None,
            },
            tags: vec![],
            active: None,
        })
    }

    #[test]
    fn new_contacts_default_to_active() {
        let contact = sample();
        assert!(contact.active);
        assert_eq!(contact.created_at, contact.updated_at);
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut contact = sample();
        let id = contact.id.clone();
        contact.apply_patch(ContactPatch {
            address: Some(AddressPatch {
                zip: Some("NW1".to_string()),
                ..Default::default()
            }),
            active: Some(false),
            ..Default::default()
        });

        assert_eq!(contact.id, id);
        assert_eq!(contact.name, "Ada");
        assert_eq!(contact.address.city, "London");
        assert_eq!(contact.address.zip.as_deref(), Some("NW1"));
        assert!(!contact.active);
    }

    #[test]
    fn replace_keeps_identity() {
        let mut contact = sample();
        let id = contact.id.clone();
        let created_at = contact.created_at;
        contact.replace(NewContact {
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            phone: Some("555".to_string()),
            address: Address {
                street: Some("1 Navy Way".to_string()),
                city: "Arlington".to_string(),
                zip: None,
            },
            tags: vec!["navy".to_string()],
            active: None,
        });

        assert_eq!(contact.id, id);
        assert_eq!(contact.created_at, created_at);
        assert_eq!(contact.name, "Grace");
        assert!(contact.active);
    }
}
