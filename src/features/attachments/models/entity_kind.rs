/// Parent entity kinds that can hold attachments.
///
/// Each kind owns a distinct join table; the methods below form the
/// capability descriptor that drives path namespacing, link-table selection,
/// and classification rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Claim,
    Ticket,
    Letter,
    CourtCase,
    Unit,
}

impl EntityKind {
    /// Storage-key namespace for uploads under this kind.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            EntityKind::Claim => "claims",
            EntityKind::Ticket => "tickets",
            EntityKind::Letter => "letters",
            EntityKind::CourtCase => "court-cases",
            EntityKind::Unit => "units",
        }
    }

    /// Join table owning this kind's attachment links.
    pub fn link_table(&self) -> &'static str {
        match self {
            EntityKind::Claim => "claim_attachments",
            EntityKind::Ticket => "ticket_attachments",
            EntityKind::Letter => "letter_attachments",
            EntityKind::CourtCase => "court_case_attachments",
            EntityKind::Unit => "unit_attachments",
        }
    }

    /// Parent-id column inside the join table.
    pub fn parent_column(&self) -> &'static str {
        match self {
            EntityKind::Claim => "claim_id",
            EntityKind::Ticket => "ticket_id",
            EntityKind::Letter => "letter_id",
            EntityKind::CourtCase => "court_case_id",
            EntityKind::Unit => "unit_id",
        }
    }

    /// Whether links of this kind carry a mandatory attachment-type
    /// classification. The classification lives on the link row.
    pub fn requires_classification(&self) -> bool {
        !matches!(self, EntityKind::Unit)
    }
}
