//! Core domain records for the Hearth store
//!
//! This module defines the entities shared by the store and the API layer:
//! families and their members, tasks, calendar events, the message feed,
//! budget transactions, documents, lists and meetings. Every record carries
//! a UUID string id and Unix-millisecond timestamps.

use crate::recur::Recurrence;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generate a fresh record id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================
// FAMILY & MEMBERS
// ============================================

/// The tenant unit grouping members and all their data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Family {
    pub id: String,
    pub name: String,
    /// Short code other families use to link to this one
    pub invite_code: String,
    /// Ids of families connected through linking
    #[serde(default)]
    pub connected_families: Vec<String>,
    pub created_at: i64,
}

impl Family {
    pub fn new(name: impl Into<String>, invite_code: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            invite_code: invite_code.into(),
            connected_families: Vec::new(),
            created_at: now_ms(),
        }
    }
}

/// Member role, used for permission gating
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Child,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "parent" => Some(Role::Parent),
            "child" => Some(Role::Child),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parent => "parent",
            Role::Child => "child",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user belonging to a family
///
/// The password hash lives only in the database; this record is safe to
/// serialize into API responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub role: Role,
    /// Free-form permission strings ("manage_lists", ...)
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Budget balance in integer cents
    pub balance_cents: i64,
    pub created_at: i64,
}

impl Member {
    pub fn new(family_id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: new_id(),
            family_id: family_id.into(),
            name: name.into(),
            role,
            permissions: Vec::new(),
            balance_cents: 0,
            created_at: now_ms(),
        }
    }

    /// Builder method: set permissions
    pub fn permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn is_parent(&self) -> bool {
        self.role == Role::Parent
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Patch applied to a member via update-by-id; absent fields are untouched
#[derive(Debug, Clone, Default)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub permissions: Option<Vec<String>>,
    pub password_hash: Option<String>,
}

// ============================================
// TASKS
// ============================================

/// Task priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task completion state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shared household task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub family_id: String,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Member the task is assigned to, if any
    #[serde(default)]
    pub assigned_to: Option<String>,
    pub created_by: String,
    #[serde(default)]
    pub due_at: Option<i64>,
    pub priority: Priority,
    pub status: TaskStatus,
    /// Set when status flips to completed, cleared when it flips back
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn new(
        family_id: impl Into<String>,
        title: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        let now = now_ms();
        Self {
            id: new_id(),
            family_id: family_id.into(),
            title: title.into(),
            notes: None,
            assigned_to: None,
            created_by: created_by.into(),
            due_at: None,
            priority: Priority::Medium,
            status: TaskStatus::Pending,
            completed_at: None,
            recurrence: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder method: assign to a member
    pub fn assigned_to(mut self, member_id: impl Into<String>) -> Self {
        self.assigned_to = Some(member_id.into());
        self
    }

    /// Builder method: set a due date
    pub fn due_at(mut self, due_at: i64) -> Self {
        self.due_at = Some(due_at);
        self
    }

    /// Builder method: set priority
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Builder method: set a recurrence rule
    pub fn recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Patch applied to a task via update-by-id; absent fields are untouched
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub assigned_to: Option<String>,
    pub due_at: Option<i64>,
    pub priority: Option<Priority>,
    pub recurrence: Option<Recurrence>,
}

// ============================================
// CALENDAR
// ============================================

/// A calendar entry, optionally recurring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub starts_at: i64,
    pub ends_at: i64,
    #[serde(default)]
    pub location: Option<String>,
    /// Member ids taking part
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Event {
    pub fn new(
        family_id: impl Into<String>,
        title: impl Into<String>,
        starts_at: i64,
        ends_at: i64,
        created_by: impl Into<String>,
    ) -> Self {
        let now = now_ms();
        Self {
            id: new_id(),
            family_id: family_id.into(),
            title: title.into(),
            starts_at,
            ends_at,
            location: None,
            participants: Vec::new(),
            recurrence: None,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder method: set location
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method: set participants
    pub fn participants(mut self, participants: Vec<String>) -> Self {
        self.participants = participants;
        self
    }

    /// Builder method: set a recurrence rule
    pub fn recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }
}

/// Patch applied to an event via update-by-id
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub starts_at: Option<i64>,
    pub ends_at: Option<i64>,
    pub location: Option<String>,
    pub participants: Option<Vec<String>>,
    pub recurrence: Option<Recurrence>,
}

/// A concrete occurrence of an event inside a query window
#[derive(Debug, Clone, PartialEq)]
pub struct EventOccurrence {
    pub event: Event,
    pub starts_at: i64,
    pub ends_at: i64,
}

// ============================================
// MESSAGES
// ============================================

/// Decision state of a tv-time request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed payload of a feed message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageBody {
    /// Plain chat text
    Text { text: String },
    /// A child-submitted tv-time request awaiting a parent decision
    TvRequest {
        minutes: u32,
        reason: String,
        status: RequestStatus,
        #[serde(default)]
        decided_by: Option<String>,
    },
}

/// An entry in the family feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub family_id: String,
    pub sender_id: String,
    pub body: MessageBody,
    pub created_at: i64,
}

impl Message {
    pub fn text(
        family_id: impl Into<String>,
        sender_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            family_id: family_id.into(),
            sender_id: sender_id.into(),
            body: MessageBody::Text { text: text.into() },
            created_at: now_ms(),
        }
    }

    pub fn tv_request(
        family_id: impl Into<String>,
        sender_id: impl Into<String>,
        minutes: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            family_id: family_id.into(),
            sender_id: sender_id.into(),
            body: MessageBody::TvRequest {
                minutes,
                reason: reason.into(),
                status: RequestStatus::Pending,
                decided_by: None,
            },
            created_at: now_ms(),
        }
    }
}

// ============================================
// BUDGET
// ============================================

/// Kind of ledger entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money moved between two members
    Transfer,
    /// Allowance or correction applied to one member
    Adjustment,
}

impl TransactionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "transfer" => Some(TransactionKind::Transfer),
            "adjustment" => Some(TransactionKind::Adjustment),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Transfer => "transfer",
            TransactionKind::Adjustment => "adjustment",
        }
    }
}

/// A ledger entry recording a balance change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub family_id: String,
    pub kind: TransactionKind,
    /// Source member for transfers; absent for adjustments
    #[serde(default)]
    pub from_member: Option<String>,
    pub to_member: String,
    /// Signed amount in cents; negative only for downward adjustments
    pub amount_cents: i64,
    #[serde(default)]
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: i64,
}

// ============================================
// DOCUMENTS
// ============================================

/// Metadata for a stored document; content bytes live in the blob store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub family_id: String,
    pub title: String,
    /// Coarse user-facing type ("insurance", "school", ...)
    pub doc_type: String,
    /// MIME type of the stored content
    pub content_type: String,
    pub size_bytes: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub uploaded_by: String,
    pub created_at: i64,
}

impl Document {
    pub fn new(
        family_id: impl Into<String>,
        title: impl Into<String>,
        doc_type: impl Into<String>,
        content_type: impl Into<String>,
        size_bytes: i64,
        uploaded_by: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            family_id: family_id.into(),
            title: title.into(),
            doc_type: doc_type.into(),
            content_type: content_type.into(),
            size_bytes,
            tags: Vec::new(),
            uploaded_by: uploaded_by.into(),
            created_at: now_ms(),
        }
    }

    /// Builder method: set tags
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

// ============================================
// LISTS
// ============================================

/// A shared list (shopping, packing, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct List {
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub created_by: String,
    pub created_at: i64,
}

impl List {
    pub fn new(
        family_id: impl Into<String>,
        title: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            family_id: family_id.into(),
            title: title.into(),
            created_by: created_by.into(),
            created_at: now_ms(),
        }
    }
}

/// An entry on a list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListItem {
    pub id: String,
    pub list_id: String,
    pub text: String,
    pub done: bool,
    /// Display order within the list
    pub position: i64,
    pub created_at: i64,
}

// ============================================
// MEETINGS
// ============================================

/// A scheduled family meeting with an agenda
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meeting {
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub scheduled_at: i64,
    #[serde(default)]
    pub agenda: Vec<String>,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Meeting {
    pub fn new(
        family_id: impl Into<String>,
        title: impl Into<String>,
        scheduled_at: i64,
        created_by: impl Into<String>,
    ) -> Self {
        let now = now_ms();
        Self {
            id: new_id(),
            family_id: family_id.into(),
            title: title.into(),
            scheduled_at,
            agenda: Vec::new(),
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder method: set agenda
    pub fn agenda(mut self, agenda: Vec<String>) -> Self {
        self.agenda = agenda;
        self
    }
}

/// Patch applied to a meeting via update-by-id
#[derive(Debug, Clone, Default)]
pub struct MeetingPatch {
    pub title: Option<String>,
    pub scheduled_at: Option<i64>,
    pub agenda: Option<Vec<String>>,
}

// ============================================
// SESSIONS
// ============================================

/// A live bearer-token session; only the token hash is stored
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token_hash: String,
    pub member_id: String,
    pub family_id: String,
    pub created_at: i64,
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!(Role::parse("parent"), Some(Role::Parent));
        assert_eq!(Role::parse("child"), Some(Role::Child));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::Parent.to_string(), "parent");
    }

    #[test]
    fn test_task_builder() {
        let task = Task::new("fam", "Take out the trash", "m1")
            .assigned_to("m2")
            .priority(Priority::High)
            .due_at(1_700_000_000_000);

        assert_eq!(task.family_id, "fam");
        assert_eq!(task.assigned_to.as_deref(), Some("m2"));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.completed_at.is_none());
        assert!(!task.is_completed());
    }

    #[test]
    fn test_message_body_serde_tagging() {
        let body = MessageBody::TvRequest {
            minutes: 30,
            reason: "movie night".to_string(),
            status: RequestStatus::Pending,
            decided_by: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""kind":"tv_request""#));
        assert!(json.contains(r#""status":"pending""#));

        let parsed: MessageBody = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, body);
    }

    #[test]
    fn test_member_permission_check() {
        let member = Member::new("fam", "Alice", Role::Parent)
            .permissions(vec!["manage_lists".to_string()]);
        assert!(member.is_parent());
        assert!(member.has_permission("manage_lists"));
        assert!(!member.has_permission("manage_budget"));
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
