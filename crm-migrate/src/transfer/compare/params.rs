//! Compare options

/// Note types written by the application itself
pub const DEFAULT_SYSTEM_NOTE_TYPES: [&str; 9] = [
    "Create",
    "CreateRelated",
    "Status",
    "Update",
    "Assign",
    "Relate",
    "Unrelate",
    "EmailSent",
    "EmailReceived",
];

/// Options for comparing one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareParams {
    entity_type: String,
    from_date: Option<String>,
    fallback_from_date: Option<String>,
    check_created: bool,
    check_modified: bool,
    check_deleted: bool,
    skip_modified_at: bool,
    skip_stream: bool,
    skip_action_history: bool,
    skip_workflow_log: bool,
    verbose: bool,
    system_note_types: Vec<String>,
}

impl CompareParams {
    pub fn new(entity_type: impl Into<String>) -> Self {
        CompareParams {
            entity_type: entity_type.into(),
            from_date: None,
            fallback_from_date: None,
            check_created: true,
            check_modified: true,
            check_deleted: true,
            skip_modified_at: false,
            skip_stream: false,
            skip_action_history: false,
            skip_workflow_log: false,
            verbose: false,
            system_note_types: DEFAULT_SYSTEM_NOTE_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Same options for another entity type
    pub fn for_entity_type(&self, entity_type: impl Into<String>) -> Self {
        CompareParams {
            entity_type: entity_type.into(),
            ..self.clone()
        }
    }

    /// Explicit watermark; otherwise derived from the bundle rows
    pub fn with_from_date(mut self, from_date: Option<String>) -> Self {
        self.from_date = from_date;
        self
    }

    /// Watermark used when neither an explicit date nor bundle dates exist
    pub fn with_fallback_from_date(mut self, from_date: Option<String>) -> Self {
        self.fallback_from_date = from_date;
        self
    }

    pub fn with_check_created(mut self, value: bool) -> Self {
        self.check_created = value;
        self
    }

    pub fn with_check_modified(mut self, value: bool) -> Self {
        self.check_modified = value;
        self
    }

    pub fn with_check_deleted(mut self, value: bool) -> Self {
        self.check_deleted = value;
        self
    }

    pub fn with_skip_modified_at(mut self, value: bool) -> Self {
        self.skip_modified_at = value;
        self
    }

    pub fn with_skip_stream(mut self, value: bool) -> Self {
        self.skip_stream = value;
        self
    }

    pub fn with_skip_action_history(mut self, value: bool) -> Self {
        self.skip_action_history = value;
        self
    }

    pub fn with_skip_workflow_log(mut self, value: bool) -> Self {
        self.skip_workflow_log = value;
        self
    }

    /// Also write both-modified records to the skipped output
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    pub fn with_system_note_types(mut self, types: Vec<String>) -> Self {
        self.system_note_types = types;
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn from_date(&self) -> Option<&str> {
        self.from_date.as_deref()
    }

    pub fn fallback_from_date(&self) -> Option<&str> {
        self.fallback_from_date.as_deref()
    }

    pub fn check_created(&self) -> bool {
        self.check_created
    }

    pub fn check_modified(&self) -> bool {
        self.check_modified
    }

    pub fn check_deleted(&self) -> bool {
        self.check_deleted
    }

    pub fn skip_modified_at(&self) -> bool {
        self.skip_modified_at
    }

    pub fn skip_stream(&self) -> bool {
        self.skip_stream
    }

    pub fn skip_action_history(&self) -> bool {
        self.skip_action_history
    }

    pub fn skip_workflow_log(&self) -> bool {
        self.skip_workflow_log
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn system_note_types(&self) -> &[String] {
        &self.system_note_types
    }

    /// Whether bundle rows have to be compared one by one
    pub fn needs_row_scan(&self) -> bool {
        self.check_modified || self.check_deleted
    }
}
