use std::path::{Path, PathBuf};

use crate::types::{Ticket, TicketStatus};

pub const EVIDENCE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Advisory filter on the evidence picker, matching the image types the
/// service stores. The service re-validates on its side.
pub fn is_supported_evidence(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            EVIDENCE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

pub fn evidence_mime(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");
    if ext.eq_ignore_ascii_case("png") {
        "image/png"
    } else if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceFile {
    pub file_name: String,
    pub path: PathBuf,
}

/// Editable fields of one ticket, seeded from the fetched row.
#[derive(Debug, Clone)]
pub struct UpdateDraft {
    pub id_ticket: i64,
    pub department: String,
    pub pic_security: String,
    pub status_ticket: TicketStatus,
    pub evidence_file: Option<EvidenceFile>,
}

impl UpdateDraft {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            id_ticket: ticket.id_ticket,
            department: ticket.department.clone(),
            pic_security: ticket.pic().to_string(),
            status_ticket: ticket.status_ticket,
            evidence_file: None,
        }
    }
}

/// Evidence portion of a submission. Exactly one of three shapes goes out:
/// a newly attached image, the previous upload carried forward, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidencePayload {
    Attached {
        file_name: String,
        path: PathBuf,
        evidence_updated: String,
    },
    Preserved {
        evidence_uploaded: String,
        evidence_updated: String,
    },
    Omitted,
}

/// Fully composed update, ready to be encoded as a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketUpdate {
    pub id_ticket: i64,
    pub department: String,
    pub pic_security: String,
    pub status_ticket: TicketStatus,
    pub updated_at: String,
    pub evidence: EvidencePayload,
}

/// Compose the submission from the draft and the ticket it was seeded
/// from. `updated_at` is always the submission instant. A new file stamps
/// `evidence_updated` with that same instant; carrying the previous upload
/// forward keeps its original stamp, falling back to the submission instant
/// only when the stored stamp is empty.
pub fn compose_update(draft: &UpdateDraft, original: &Ticket, now: &str) -> TicketUpdate {
    let evidence = match &draft.evidence_file {
        Some(file) => EvidencePayload::Attached {
            file_name: file.file_name.clone(),
            path: file.path.clone(),
            evidence_updated: now.to_string(),
        },
        None if original.has_evidence() => EvidencePayload::Preserved {
            evidence_uploaded: original.evidence_uploaded.clone(),
            evidence_updated: if original.evidence_updated.is_empty() {
                now.to_string()
            } else {
                original.evidence_updated.clone()
            },
        },
        None => EvidencePayload::Omitted,
    };

    TicketUpdate {
        id_ticket: draft.id_ticket,
        department: draft.department.clone(),
        pic_security: draft.pic_security.clone(),
        status_ticket: draft.status_ticket,
        updated_at: now.to_string(),
        evidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2026-08-21 09:00:00";

    fn ticket_with_evidence(uploaded: &str, updated: &str) -> Ticket {
        Ticket {
            id_andon_security: 7,
            id_ticket: 700,
            created_at: "2026-08-02 07:15:00".to_string(),
            department: "Paint".to_string(),
            pic_security: Some("Sari".to_string()),
            updated_at: "2026-08-02 08:00:00".to_string(),
            evidence_updated: updated.to_string(),
            evidence_uploaded: uploaded.to_string(),
            status_ticket: TicketStatus::Open,
        }
    }

    #[test]
    fn test_supported_evidence_extensions() {
        assert!(is_supported_evidence("photo.jpg"));
        assert!(is_supported_evidence("photo.JPEG"));
        assert!(is_supported_evidence("shot.Png"));
        assert!(!is_supported_evidence("report.pdf"));
        assert!(!is_supported_evidence("noextension"));
        assert!(!is_supported_evidence(""));
    }

    #[test]
    fn test_evidence_mime() {
        assert_eq!(evidence_mime("a.jpg"), "image/jpeg");
        assert_eq!(evidence_mime("a.JPEG"), "image/jpeg");
        assert_eq!(evidence_mime("a.png"), "image/png");
        assert_eq!(evidence_mime("a.bin"), "application/octet-stream");
    }

    #[test]
    fn test_new_file_stamps_now() {
        let original = ticket_with_evidence("evidence/old.jpg", "2026-08-02 08:00:00");
        let mut draft = UpdateDraft::from_ticket(&original);
        draft.evidence_file = Some(EvidenceFile {
            file_name: "new.png".to_string(),
            path: PathBuf::from("/tmp/new.png"),
        });

        let update = compose_update(&draft, &original, NOW);
        assert_eq!(update.updated_at, NOW);
        assert_eq!(
            update.evidence,
            EvidencePayload::Attached {
                file_name: "new.png".to_string(),
                path: PathBuf::from("/tmp/new.png"),
                evidence_updated: NOW.to_string(),
            }
        );
    }

    #[test]
    fn test_carry_forward_keeps_original_stamp() {
        let original = ticket_with_evidence("evidence/old.jpg", "2026-08-02 08:00:00");
        let draft = UpdateDraft::from_ticket(&original);

        let update = compose_update(&draft, &original, NOW);
        assert_eq!(update.updated_at, NOW);
        assert_eq!(
            update.evidence,
            EvidencePayload::Preserved {
                evidence_uploaded: "evidence/old.jpg".to_string(),
                evidence_updated: "2026-08-02 08:00:00".to_string(),
            }
        );
    }

    #[test]
    fn test_carry_forward_fills_empty_stamp() {
        let original = ticket_with_evidence("evidence/old.jpg", "");
        let draft = UpdateDraft::from_ticket(&original);

        let update = compose_update(&draft, &original, NOW);
        assert_eq!(
            update.evidence,
            EvidencePayload::Preserved {
                evidence_uploaded: "evidence/old.jpg".to_string(),
                evidence_updated: NOW.to_string(),
            }
        );
    }

    #[test]
    fn test_no_evidence_sends_none() {
        let original = ticket_with_evidence("", "");
        let draft = UpdateDraft::from_ticket(&original);

        let update = compose_update(&draft, &original, NOW);
        assert_eq!(update.evidence, EvidencePayload::Omitted);
        assert_eq!(update.updated_at, NOW);
    }

    #[test]
    fn test_draft_seeds_from_ticket() {
        let mut original = ticket_with_evidence("evidence/old.jpg", "2026-08-02 08:00:00");
        original.pic_security = None;
        let draft = UpdateDraft::from_ticket(&original);
        assert_eq!(draft.id_ticket, 700);
        assert_eq!(draft.department, "Paint");
        assert_eq!(draft.pic_security, "");
        assert_eq!(draft.status_ticket, TicketStatus::Open);
        assert!(draft.evidence_file.is_none());
    }
}
