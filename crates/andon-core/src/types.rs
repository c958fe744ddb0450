use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Open,
    Process,
    Closed,
    Unknown(i64),
}

impl TicketStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TicketStatus::Open,
            1 => TicketStatus::Process,
            2 => TicketStatus::Closed,
            other => TicketStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            TicketStatus::Open => 0,
            TicketStatus::Process => 1,
            TicketStatus::Closed => 2,
            TicketStatus::Unknown(code) => *code,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Process => "Process",
            TicketStatus::Closed => "Closed",
            TicketStatus::Unknown(_) => "Unknown",
        }
    }

    /// Next status in the edit cycle. Unknown codes are not submittable and
    /// normalize to Open.
    pub fn next(&self) -> Self {
        match self {
            TicketStatus::Open => TicketStatus::Process,
            TicketStatus::Process => TicketStatus::Closed,
            TicketStatus::Closed => TicketStatus::Open,
            TicketStatus::Unknown(_) => TicketStatus::Open,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            TicketStatus::Open => TicketStatus::Closed,
            TicketStatus::Process => TicketStatus::Open,
            TicketStatus::Closed => TicketStatus::Process,
            TicketStatus::Unknown(_) => TicketStatus::Open,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TicketStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for TicketStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let value: serde_json::Value = serde::Deserialize::deserialize(deserializer)?;
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| Error::custom("Invalid status code"))
                .map(TicketStatus::from_code),
            serde_json::Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::custom("Expected numeric status code"))
                .map(TicketStatus::from_code),
            _ => Err(Error::custom("Expected number or string for status")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id_andon_security: i64,
    pub id_ticket: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub pic_security: Option<String>,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub evidence_updated: String,
    #[serde(default)]
    pub evidence_uploaded: String,
    pub status_ticket: TicketStatus,
}

impl Ticket {
    pub fn pic(&self) -> &str {
        self.pic_security.as_deref().unwrap_or("")
    }

    pub fn has_evidence(&self) -> bool {
        !self.evidence_uploaded.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope {
    #[serde(default)]
    pub results: Vec<Ticket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
}

impl ListQuery {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, status: impl Into<String>) -> Self {
        Self {
            start_date,
            end_date,
            status: status.into(),
        }
    }

    /// Query-string pairs in the shape the list endpoint expects.
    pub fn params(&self) -> [(&'static str, String); 3] {
        [
            ("start_date", self.start_date.format("%Y-%m-%d").to_string()),
            ("end_date", self.end_date.format("%Y-%m-%d").to_string()),
            ("status", self.status.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(TicketStatus::from_code(0), TicketStatus::Open);
        assert_eq!(TicketStatus::from_code(1), TicketStatus::Process);
        assert_eq!(TicketStatus::from_code(2), TicketStatus::Closed);
        assert_eq!(TicketStatus::from_code(7), TicketStatus::Unknown(7));
        assert_eq!(TicketStatus::Unknown(7).code(), 7);
        assert_eq!(TicketStatus::Unknown(7).label(), "Unknown");
    }

    #[test]
    fn test_status_cycle_skips_unknown() {
        assert_eq!(TicketStatus::Open.next(), TicketStatus::Process);
        assert_eq!(TicketStatus::Process.next(), TicketStatus::Closed);
        assert_eq!(TicketStatus::Closed.next(), TicketStatus::Open);
        assert_eq!(TicketStatus::Unknown(9).next(), TicketStatus::Open);
        assert_eq!(TicketStatus::Open.prev(), TicketStatus::Closed);
        assert_eq!(TicketStatus::Unknown(9).prev(), TicketStatus::Open);
    }

    #[test]
    fn test_parse_ticket_payload() {
        let raw = r#"{
            "id_andon_security": 41,
            "id_ticket": 1024,
            "created_at": "2026-08-02 07:15:00",
            "department": "Stamping",
            "pic_security": "Budi",
            "updated_at": "2026-08-02 08:00:00",
            "evidence_updated": "2026-08-02 08:00:00",
            "evidence_uploaded": "evidence/1024.jpg",
            "status_ticket": 1
        }"#;
        let ticket: Ticket = serde_json::from_str(raw).unwrap();
        assert_eq!(ticket.id_ticket, 1024);
        assert_eq!(ticket.status_ticket, TicketStatus::Process);
        assert_eq!(ticket.pic(), "Budi");
        assert!(ticket.has_evidence());
    }

    #[test]
    fn test_parse_ticket_with_nulls_and_string_status() {
        let raw = r#"{
            "id_andon_security": 42,
            "id_ticket": 1025,
            "created_at": "2026-08-03 10:00:00",
            "department": "Assy",
            "pic_security": null,
            "status_ticket": "0"
        }"#;
        let ticket: Ticket = serde_json::from_str(raw).unwrap();
        assert_eq!(ticket.status_ticket, TicketStatus::Open);
        assert_eq!(ticket.pic(), "");
        assert_eq!(ticket.evidence_uploaded, "");
        assert!(!ticket.has_evidence());
    }

    #[test]
    fn test_status_serializes_as_code() {
        let json = serde_json::to_string(&TicketStatus::Closed).unwrap();
        assert_eq!(json, "2");
    }

    #[test]
    fn test_envelope_defaults_to_empty() {
        let envelope: ListEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.results.is_empty());

        let envelope: ListEnvelope =
            serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(envelope.results.is_empty());
    }

    #[test]
    fn test_list_query_params() {
        let query = ListQuery::new(
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
            "0",
        );
        let params = query.params();
        assert_eq!(params[0], ("start_date", "2026-08-01".to_string()));
        assert_eq!(params[1], ("end_date", "2026-09-30".to_string()));
        assert_eq!(params[2], ("status", "0".to_string()));
    }
}
