// 📇 Contact Store - ordered contact list mirrored to a flat text file
//
// File format: one contact per line, "<name>: <phone>\n", no header,
// no escaping. Every mutation rewrites the whole file so the in-memory
// list and the file never drift apart.
//
// Identity on disk is positional (line number). In memory every contact
// also gets a UUID so callers can keep track of a record across re-sorts.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Separator between name and phone in a persisted line
pub const SEPARATOR: &str = ": ";

// ============================================================================
// CONTACT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// In-memory identity, regenerated on every load (never written to disk)
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone: phone.into(),
        }
    }

    /// Render as a persisted line (without the trailing newline)
    pub fn to_line(&self) -> String {
        format!("{}{}{}", self.name, SEPARATOR, self.phone)
    }

    /// Parse one persisted line. Splits on the FIRST separator, so a name
    /// containing ": " comes back truncated.
    pub fn parse_line(line: &str, line_number: usize) -> Result<Self> {
        match line.split_once(SEPARATOR) {
            Some((name, phone)) => Ok(Contact::new(name, phone)),
            None => Err(StoreError::parse(
                line_number,
                format!("expected \"<name>{}<phone>\", got {:?}", SEPARATOR, line),
            )),
        }
    }

    /// Names holding the separator will not survive a save/load cycle
    pub fn round_trips(&self) -> bool {
        !self.name.contains(SEPARATOR)
    }
}

/// Both fields must be non-empty and fit on one line
fn validate_fields(name: &str, phone: &str) -> Result<()> {
    if name.is_empty() || phone.is_empty() {
        let field = if name.is_empty() { "name" } else { "phone" };
        return Err(StoreError::validation(
            field,
            "Please enter both name and phone number",
        ));
    }
    for (field, value) in [("name", name), ("phone", phone)] {
        if value.contains(['\n', '\r']) {
            return Err(StoreError::validation(
                field,
                format!("The {} may not contain a line break", field),
            ));
        }
    }
    Ok(())
}

fn warn_if_lossy(contact: &Contact) {
    if !contact.round_trips() {
        tracing::warn!(
            name = %contact.name,
            "contact name contains \"{}\"; it will be split differently when reloaded",
            SEPARATOR
        );
    }
}

// ============================================================================
// FILE I/O
// ============================================================================

/// Load contacts from `path`. A missing file is an empty list.
pub fn load_contacts(path: &Path) -> Result<Vec<Contact>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = ?path, "contact file not found, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    let mut contacts = Vec::new();
    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        contacts.push(Contact::parse_line(line, i + 1)?);
    }

    tracing::debug!(path = ?path, count = contacts.len(), "loaded contacts");
    Ok(contacts)
}

/// Rewrite `path` with every contact, one newline-terminated line each
pub fn save_contacts(path: &Path, contacts: &[Contact]) -> Result<()> {
    let mut content = String::new();
    for contact in contacts {
        content.push_str(&contact.to_line());
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| StoreError::io(path, e))?;

    tracing::debug!(path = ?path, count = contacts.len(), "saved contacts");
    Ok(())
}

// ============================================================================
// CONTACT BOOK
// ============================================================================

/// Ordered contact list bound to its backing file
#[derive(Debug)]
pub struct ContactBook {
    path: PathBuf,
    contacts: Vec<Contact>,
}

impl ContactBook {
    /// Open the book at `path`, loading whatever is there
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contacts = load_contacts(&path)?;
        Ok(Self { path, contacts })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Contacts in file order
    pub fn list(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Contact> {
        self.contacts.get(index)
    }

    /// Current position of the contact with this id
    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.contacts.iter().position(|c| c.id == id)
    }

    /// Append a contact and persist. Returns the new contact's id.
    pub fn add(&mut self, name: &str, phone: &str) -> Result<Uuid> {
        validate_fields(name, phone)?;

        let contact = Contact::new(name, phone);
        warn_if_lossy(&contact);
        let id = contact.id;

        let mut next = self.contacts.clone();
        next.push(contact);
        self.commit(next)?;

        tracing::debug!(%id, total = self.contacts.len(), "contact added");
        Ok(id)
    }

    /// Overwrite the contact at `selection`. Selection is checked before
    /// the fields, matching the order the form reports problems in.
    pub fn update(&mut self, selection: Option<usize>, name: &str, phone: &str) -> Result<()> {
        let index = self.resolve(selection, "update")?;
        validate_fields(name, phone)?;

        let mut next = self.contacts.clone();
        let slot = &mut next[index];
        slot.name = name.to_string();
        slot.phone = phone.to_string();
        warn_if_lossy(slot);
        self.commit(next)?;

        tracing::debug!(index, "contact updated");
        Ok(())
    }

    /// Remove the contact at `selection` and return it
    pub fn remove(&mut self, selection: Option<usize>) -> Result<Contact> {
        let index = self.resolve(selection, "remove")?;

        let mut next = self.contacts.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        tracing::debug!(index, total = self.contacts.len(), "contact removed");
        Ok(removed)
    }

    /// `update` addressed by stable id instead of position
    pub fn update_by_id(&mut self, id: Uuid, name: &str, phone: &str) -> Result<()> {
        let index = self.index_of(id);
        self.update(index, name, phone)
    }

    /// `remove` addressed by stable id instead of position
    pub fn remove_by_id(&mut self, id: Uuid) -> Result<Contact> {
        let index = self.index_of(id);
        self.remove(index)
    }

    fn resolve(&self, selection: Option<usize>, action: &str) -> Result<usize> {
        match selection {
            Some(index) if index < self.contacts.len() => Ok(index),
            _ => Err(StoreError::selection("contact", action)),
        }
    }

    /// Write `next` to disk, and only keep it in memory once that worked
    fn commit(&mut self, next: Vec<Contact>) -> Result<()> {
        save_contacts(&self.path, &next)?;
        self.contacts = next;
        Ok(())
    }
}
