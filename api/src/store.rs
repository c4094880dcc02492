use std::collections::HashMap;

use shared::{Contact, ContactPatch, NewContact, ObjectId};
use tokio::sync::RwLock;

/// In-memory contact storage
#[derive(Default)]
pub struct ContactStore {
    contacts: RwLock<HashMap<ObjectId, Contact>>,
}

impl ContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All contacts, oldest first.
    pub async fn list(&self, active_only: bool) -> Vec<Contact> {
        let contacts = self.contacts.read().await;
        let mut out: Vec<Contact> = contacts
            .values()
            .filter(|c| !active_only || c.active)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    pub async fn get(&self, id: &ObjectId) -> Option<Contact> {
        self.contacts.read().await.get(id).cloned()
    }

    pub async fn create(&self, new: NewContact) -> Contact {
        let contact = Contact::from_new(new);
        self.contacts
            .write()
            .await
            .insert(contact.id.clone(), contact.clone());
        contact
    }

    pub async fn replace(&self, id: &ObjectId, new: NewContact) -> Option<Contact> {
        let mut contacts = self.contacts.write().await;
        let contact = contacts.get_mut(id)?;
        contact.replace(new);
        Some(contact.clone())
    }

    pub async fn patch(&self, id: &ObjectId, patch: ContactPatch) -> Option<Contact> {
        let mut contacts = self.contacts.write().await;
        let contact = contacts.get_mut(id)?;
        contact.apply_patch(patch);
        Some(contact.clone())
    }

    pub async fn delete(&self, id: &ObjectId) -> bool {
        self.contacts.write().await.remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Address;

    fn new_contact(name: &str, active: bool) -> NewContact {
        NewContact {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            address: Address {
                street: None,
                city: "Paris".to_string(),
                zip: None,
            },
            tags: vec![],
            active: Some(active),
        }
    }

    #[tokio::test]
    async fn crud_round() {
        let store = ContactStore::new();
        let created = store.create(new_contact("Ada", true)).await;
        assert_eq!(store.get(&created.id).await.unwrap().name, "Ada");

        let patched = store
            .patch(
                &created.id,
                ContactPatch {
                    name: Some("Ada L.".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.name, "Ada L.");

        assert!(store.delete(&created.id).await);
        assert!(!store.delete(&created.id).await);
        assert!(store.get(&created.id).await.is_none());
    }

    #[tokio::test]
    async fn list_filters_inactive() {
        let store = ContactStore::new();
        store.create(new_contact("Ada", true)).await;
        store.create(new_contact("Bob", false)).await;

        assert_eq!(store.list(false).await.len(), 2);
        let active = store.list(true).await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Ada");
    }

    #[tokio::test]
    async fn unknown_ids_are_none() {
        let store = ContactStore::new();
        let id = ObjectId::generate();
        assert!(store.replace(&id, new_contact("X", true)).await.is_none());
        assert!(store.patch(&id, ContactPatch::default()).await.is_none());
    }
}
