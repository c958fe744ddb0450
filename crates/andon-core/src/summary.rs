use serde::Serialize;

use crate::types::{Ticket, TicketStatus};

/// Per-status counts over one fetched collection. Unknown status codes are
/// rendered in the table but counted in none of the buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TicketSummary {
    pub open: usize,
    pub process: usize,
    pub closed: usize,
}

impl TicketSummary {
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let mut summary = TicketSummary::default();
        for ticket in tickets {
            match ticket.status_ticket {
                TicketStatus::Open => summary.open += 1,
                TicketStatus::Process => summary.process += 1,
                TicketStatus::Closed => summary.closed += 1,
                TicketStatus::Unknown(_) => {}
            }
        }
        summary
    }

    pub fn has_open(&self) -> bool {
        self.open > 0
    }

    pub fn known_total(&self) -> usize {
        self.open + self.process + self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(id: i64, status: TicketStatus) -> Ticket {
        Ticket {
            id_andon_security: id,
            id_ticket: id,
            created_at: "2026-08-02 07:15:00".to_string(),
            department: "Stamping".to_string(),
            pic_security: Some("Budi".to_string()),
            updated_at: "2026-08-02 08:00:00".to_string(),
            evidence_updated: String::new(),
            evidence_uploaded: String::new(),
            status_ticket: status,
        }
    }

    #[test]
    fn test_counts_by_status() {
        let tickets = vec![
            ticket(1, TicketStatus::Open),
            ticket(2, TicketStatus::Open),
            ticket(3, TicketStatus::Process),
            ticket(4, TicketStatus::Closed),
        ];
        let summary = TicketSummary::from_tickets(&tickets);
        assert_eq!(summary.open, 2);
        assert_eq!(summary.process, 1);
        assert_eq!(summary.closed, 1);
        assert!(summary.has_open());
        assert_eq!(summary.known_total(), 4);
    }

    #[test]
    fn test_unknown_status_counted_nowhere() {
        let tickets = vec![
            ticket(1, TicketStatus::Unknown(9)),
            ticket(2, TicketStatus::Process),
        ];
        let summary = TicketSummary::from_tickets(&tickets);
        assert_eq!(summary.open, 0);
        assert_eq!(summary.process, 1);
        assert_eq!(summary.closed, 0);
        assert_eq!(summary.known_total(), 1);
        assert!(!summary.has_open());
    }

    #[test]
    fn test_empty_collection() {
        let summary = TicketSummary::from_tickets(&[]);
        assert_eq!(summary, TicketSummary::default());
        assert!(!summary.has_open());
    }
}
