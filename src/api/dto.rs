//! Data Transfer Objects
//!
//! Request and response types for the API endpoints. Successful responses
//! are wrapped in the `{"success": true, "data": ...}` envelope.

use serde::{Deserialize, Serialize};

use crate::recur::{Freq, Recurrence};
use crate::store::{
    Document, Event, EventOccurrence, Family, List, ListItem, Meeting, Member, Message,
    MessageBody, Transaction,
};

/// Success envelope wrapping every data-bearing response
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

// ============================================
// RECURRENCE
// ============================================

/// Recurrence rule as it appears on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceDto {
    /// "daily", "weekly" or "monthly"
    pub freq: String,
    #[serde(default)]
    pub interval: Option<u32>,
}

impl RecurrenceDto {
    /// Validate and convert into a rule
    pub fn to_rule(&self) -> Result<Recurrence, String> {
        let freq = Freq::parse(&self.freq).ok_or_else(|| {
            format!(
                "Invalid recurrence freq: {}. Use daily, weekly, or monthly",
                self.freq
            )
        })?;
        Ok(Recurrence::new(freq, self.interval.unwrap_or(1)))
    }

    pub fn from_rule(rule: &Recurrence) -> Self {
        Self {
            freq: rule.freq.as_str().to_string(),
            interval: Some(rule.interval),
        }
    }
}

// ============================================
// AUTH DTOs
// ============================================

/// Create a family with its founding parent
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub family_name: String,
    pub member_name: String,
    pub password: String,
}

/// Log in as an existing member
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub family_id: String,
    pub name: String,
    pub password: String,
}

/// Session token plus the signed-in identity
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub member: MemberResponse,
    pub family: FamilySummary,
}

// ============================================
// FAMILY & MEMBER DTOs
// ============================================

/// Id and name of a family, used for connected-family listings
#[derive(Debug, Serialize)]
pub struct FamilySummary {
    pub id: String,
    pub name: String,
}

impl FamilySummary {
    pub fn from_family(family: &Family) -> Self {
        Self {
            id: family.id.clone(),
            name: family.name.clone(),
        }
    }
}

/// Full family view with members and connections
#[derive(Debug, Serialize)]
pub struct FamilyResponse {
    pub id: String,
    pub name: String,
    pub invite_code: String,
    pub members: Vec<MemberResponse>,
    pub connected_families: Vec<FamilySummary>,
    pub created_at: i64,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: String,
    pub name: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub balance_cents: i64,
    pub created_at: i64,
}

impl MemberResponse {
    pub fn from_member(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
            role: member.role.to_string(),
            permissions: member.permissions.clone(),
            balance_cents: member.balance_cents,
            created_at: member.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenameFamilyRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub name: String,
    /// "parent" or "child"
    pub role: String,
    pub password: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkFamilyRequest {
    /// Invite code of the family to connect to
    pub code: String,
}

// ============================================
// TASK DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_at: Option<i64>,
    /// "low", "medium" or "high"; defaults to medium
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceDto>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_at: Option<i64>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceDto>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    pub notes: Option<String>,
    pub assigned_to: Option<String>,
    pub created_by: String,
    pub due_at: Option<i64>,
    pub priority: String,
    pub status: String,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub recurrence: Option<RecurrenceDto>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskResponse {
    pub fn from_task(task: &crate::store::Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            notes: task.notes.clone(),
            assigned_to: task.assigned_to.clone(),
            created_by: task.created_by.clone(),
            due_at: task.due_at,
            priority: task.priority.to_string(),
            status: task.status.to_string(),
            completed: task.is_completed(),
            completed_at: task.completed_at,
            recurrence: task.recurrence.as_ref().map(RecurrenceDto::from_rule),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

// ============================================
// CALENDAR DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub starts_at: i64,
    pub ends_at: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceDto>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub starts_at: Option<i64>,
    #[serde(default)]
    pub ends_at: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub participants: Option<Vec<String>>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceDto>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub starts_at: i64,
    pub ends_at: i64,
    pub location: Option<String>,
    pub participants: Vec<String>,
    pub recurrence: Option<RecurrenceDto>,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl EventResponse {
    pub fn from_event(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            location: event.location.clone(),
            participants: event.participants.clone(),
            recurrence: event.recurrence.as_ref().map(RecurrenceDto::from_rule),
            created_by: event.created_by.clone(),
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// One expanded occurrence of a (possibly recurring) event
#[derive(Debug, Serialize)]
pub struct OccurrenceResponse {
    pub event_id: String,
    pub title: String,
    pub starts_at: i64,
    pub ends_at: i64,
    pub location: Option<String>,
    pub participants: Vec<String>,
}

impl OccurrenceResponse {
    pub fn from_occurrence(occurrence: &EventOccurrence) -> Self {
        Self {
            event_id: occurrence.event.id.clone(),
            title: occurrence.event.title.clone(),
            starts_at: occurrence.starts_at,
            ends_at: occurrence.ends_at,
            location: occurrence.event.location.clone(),
            participants: occurrence.event.participants.clone(),
        }
    }
}

// ============================================
// MESSAGE DTOs
// ============================================

/// Payload of a new tv-time request
#[derive(Debug, Deserialize)]
pub struct TvRequestDto {
    pub minutes: u32,
    pub reason: String,
}

/// A new feed entry; exactly one of `text` / `tv_request` must be present
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tv_request: Option<TvRequestDto>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub sender_id: String,
    #[serde(flatten)]
    pub body: MessageBody,
    pub created_at: i64,
}

impl MessageResponse {
    pub fn from_message(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            sender_id: message.sender_id.clone(),
            body: message.body.clone(),
            created_at: message.created_at,
        }
    }
}

// ============================================
// BUDGET DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub member: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BalanceEntry {
    pub member_id: String,
    pub name: String,
    pub balance_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub balances: Vec<BalanceEntry>,
    pub transactions: Vec<TransactionResponse>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub kind: String,
    pub from_member: Option<String>,
    pub to_member: String,
    pub amount_cents: i64,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: i64,
}

impl TransactionResponse {
    pub fn from_transaction(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            kind: tx.kind.as_str().to_string(),
            from_member: tx.from_member.clone(),
            to_member: tx.to_member.clone(),
            amount_cents: tx.amount_cents,
            note: tx.note.clone(),
            created_by: tx.created_by.clone(),
            created_at: tx.created_at,
        }
    }
}

// ============================================
// DOCUMENT DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct UploadDocumentRequest {
    pub title: String,
    pub doc_type: String,
    pub content_type: String,
    /// Base64-encoded content bytes
    pub data: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub title: String,
    pub doc_type: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub tags: Vec<String>,
    pub uploaded_by: String,
    /// Where the content bytes are served from
    pub url: String,
    pub created_at: i64,
}

impl DocumentResponse {
    pub fn from_document(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            title: document.title.clone(),
            doc_type: document.doc_type.clone(),
            content_type: document.content_type.clone(),
            size_bytes: document.size_bytes,
            tags: document.tags.clone(),
            uploaded_by: document.uploaded_by.clone(),
            url: format!("/api/v1/documents/{}/content", document.id),
            created_at: document.created_at,
        }
    }
}

// ============================================
// LIST DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct AddListItemRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateListItemRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ListItemResponse {
    pub id: String,
    pub text: String,
    pub done: bool,
    pub position: i64,
    pub created_at: i64,
}

impl ListItemResponse {
    pub fn from_item(item: &ListItem) -> Self {
        Self {
            id: item.id.clone(),
            text: item.text.clone(),
            done: item.done,
            position: item.position,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub id: String,
    pub title: String,
    pub created_by: String,
    pub items: Vec<ListItemResponse>,
    pub created_at: i64,
}

impl ListResponse {
    pub fn from_list(list: &List, items: &[ListItem]) -> Self {
        Self {
            id: list.id.clone(),
            title: list.title.clone(),
            created_by: list.created_by.clone(),
            items: items.iter().map(ListItemResponse::from_item).collect(),
            created_at: list.created_at,
        }
    }
}

// ============================================
// MEETING DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateMeetingRequest {
    pub title: String,
    pub scheduled_at: i64,
    #[serde(default)]
    pub agenda: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeetingRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<i64>,
    #[serde(default)]
    pub agenda: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct MeetingResponse {
    pub id: String,
    pub title: String,
    pub scheduled_at: i64,
    pub agenda: Vec<String>,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl MeetingResponse {
    pub fn from_meeting(meeting: &Meeting) -> Self {
        Self {
            id: meeting.id.clone(),
            title: meeting.title.clone(),
            scheduled_at: meeting.scheduled_at,
            agenda: meeting.agenda.clone(),
            created_by: meeting.created_by.clone(),
            created_at: meeting.created_at,
            updated_at: meeting.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recurrence_dto_round_trip() {
        let dto = RecurrenceDto {
            freq: "weekly".to_string(),
            interval: Some(2),
        };
        let rule = dto.to_rule().unwrap();
        assert_eq!(rule.freq, Freq::Weekly);
        assert_eq!(rule.interval, 2);

        let back = RecurrenceDto::from_rule(&rule);
        assert_eq!(back.freq, "weekly");
        assert_eq!(back.interval, Some(2));
    }

    #[test]
    fn test_recurrence_dto_rejects_unknown_freq() {
        let dto = RecurrenceDto {
            freq: "fortnightly".to_string(),
            interval: None,
        };
        assert!(dto.to_rule().is_err());
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(Envelope::new(vec![1, 2, 3])).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][0], 1);
    }

    #[test]
    fn test_document_response_url() {
        let doc = Document::new("f", "Policy", "insurance", "application/pdf", 3, "m");
        let resp = DocumentResponse::from_document(&doc);
        assert_eq!(resp.url, format!("/api/v1/documents/{}/content", doc.id));
    }
}
