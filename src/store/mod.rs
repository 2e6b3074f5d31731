//! Hearth persistence layer
//!
//! A thin data-access layer over SQLite: one accessor module per
//! collection, each issuing plain queries and mapping rows to the records
//! in [`types`]. Document content bytes live beside the database in the
//! [`blob::BlobStore`].

pub mod blob;
pub mod budget;
pub mod db;
pub mod documents;
pub mod error;
pub mod events;
pub mod families;
pub mod lists;
pub mod meetings;
pub mod messages;
pub mod sessions;
pub mod tasks;
pub mod types;

pub use blob::BlobStore;
pub use db::{EntityCounts, Store};
pub use documents::DocumentFilter;
pub use error::{StoreError, StoreResult};
pub use lists::ListItemPatch;
pub use tasks::TaskFilter;
pub use types::{
    now_ms, Document, Event, EventOccurrence, EventPatch, Family, List, ListItem, Meeting,
    MeetingPatch, Member, MemberPatch, Message, MessageBody, Priority, RequestStatus, Role,
    Session, Task, TaskPatch, TaskStatus, Transaction, TransactionKind,
};
