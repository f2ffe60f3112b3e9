// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Patron registry.
//!
//! Patrons are immutable once registered. The registry keeps contact
//! identifiers unique with the same entry-API claim the inventory uses for
//! catalog codes.

use crate::LibraryError;
use crate::base::{PatronId, required};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};

/// A registered library patron.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patron {
    pub id: PatronId,
    pub name: String,
    /// Unique contact identifier, e.g. an e-mail address.
    #[serde(rename = "email")]
    pub contact: String,
}

/// Thread-safe patron store with unique contacts.
#[derive(Debug)]
pub struct PatronRegistry {
    patrons: DashMap<PatronId, Patron>,
    contacts: DashMap<String, PatronId>,
    next_id: AtomicU32,
}

impl PatronRegistry {
    /// Creates an empty registry. IDs start at 1.
    pub fn new() -> Self {
        Self {
            patrons: DashMap::new(),
            contacts: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    /// Registers a patron.
    ///
    /// Contacts are compared exactly after trimming.
    ///
    /// # Errors
    ///
    /// - [`LibraryError::MissingField`] - name or contact is blank.
    /// - [`LibraryError::DuplicateContact`] - the contact is already registered.
    pub fn add(&self, name: &str, contact: &str) -> Result<Patron, LibraryError> {
        let name = required(name, "name")?;
        let contact = required(contact, "email")?;

        let id = match self.contacts.entry(contact.clone()) {
            Entry::Occupied(_) => return Err(LibraryError::DuplicateContact(contact)),
            Entry::Vacant(entry) => {
                let id = PatronId(self.next_id.fetch_add(1, Ordering::SeqCst));
                entry.insert(id);
                id
            }
        };

        let patron = Patron { id, name, contact };
        self.patrons.insert(id, patron.clone());
        Ok(patron)
    }

    pub fn get(&self, id: PatronId) -> Option<Patron> {
        self.patrons.get(&id).map(|patron| patron.value().clone())
    }

    pub fn contains(&self, id: PatronId) -> bool {
        self.patrons.contains_key(&id)
    }

    /// Returns every patron, ordered by ID.
    pub fn all(&self) -> Vec<Patron> {
        let mut patrons: Vec<Patron> = self
            .patrons
            .iter()
            .map(|patron| patron.value().clone())
            .collect();
        patrons.sort_by_key(|patron| patron.id);
        patrons
    }

    pub fn len(&self) -> usize {
        self.patrons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patrons.is_empty()
    }
}

impl Default for PatronRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_registers_patron() {
        let registry = PatronRegistry::new();
        let patron = registry.add(" Ada Lovelace ", "ada@example.com").unwrap();

        assert_eq!(patron.id, PatronId(1));
        assert_eq!(patron.name, "Ada Lovelace");
        assert!(registry.contains(PatronId(1)));
        assert_eq!(registry.get(PatronId(1)), Some(patron));
    }

    #[test]
    fn duplicate_contact_rejected() {
        let registry = PatronRegistry::new();
        registry.add("Ada", "ada@example.com").unwrap();

        let result = registry.add("Another Ada", " ada@example.com ");
        assert_eq!(
            result,
            Err(LibraryError::DuplicateContact("ada@example.com".into()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn blank_fields_rejected() {
        let registry = PatronRegistry::new();
        assert_eq!(
            registry.add("", "ada@example.com"),
            Err(LibraryError::MissingField("name"))
        );
        assert_eq!(registry.add("Ada", "  "), Err(LibraryError::MissingField("email")));
        assert!(registry.is_empty());
    }

    #[test]
    fn serializes_contact_as_email() {
        let patron = Patron {
            id: PatronId(4),
            name: "Ada".into(),
            contact: "ada@example.com".into(),
        };
        let json = serde_json::to_value(&patron).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["email"], "ada@example.com");
    }
}
