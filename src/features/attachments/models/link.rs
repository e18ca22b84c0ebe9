use sqlx::FromRow;

/// One attachment to link to a parent, with its link-row classification.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub attachment_id: i64,
    pub type_id: Option<i64>,
}

/// A link row resolved from a parent's join table.
#[derive(Debug, Clone, FromRow)]
pub struct LinkedAttachment {
    pub attachment_id: i64,
    pub type_id: Option<i64>,
}

/// Link row including the parent id, for batched lookups.
#[derive(Debug, Clone, FromRow)]
pub struct ParentLinkRow {
    pub parent_id: i64,
    pub attachment_id: i64,
    pub type_id: Option<i64>,
}
