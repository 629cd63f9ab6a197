// Table definitions for every resource the portal stores.
//
// Handlers, validation, the SQL layer and the in-memory store all read these
// definitions; the Postgres migration in migrations/ must stay in step.

use super::schema::{ColumnDef, ColumnType as T, DefaultValue as D, Relation, ResourceSchema};

pub const REQUEST_STATUSES: &[&str] = &["pending", "in_progress", "approved", "rejected", "completed"];
pub const PERMIT_STATUSES: &[&str] = &["pending", "under_review", "approved", "rejected", "expired"];
pub const PAYMENT_STATUSES: &[&str] = &["pending", "completed", "failed", "refunded"];
pub const PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];

pub static DEPARTMENTS: ResourceSchema = ResourceSchema {
    name: "departments",
    table: "departments",
    label: "Department",
    columns: &[
        ColumnDef::new("name", T::String).required().unique(),
        ColumnDef::new("code", T::String).required().unique(),
        ColumnDef::new("description", T::Text),
        ColumnDef::new("location", T::String),
        ColumnDef::new("phone", T::String),
        ColumnDef::new("email", T::String),
        ColumnDef::new("budget", T::Decimal).min(0),
        ColumnDef::new("is_active", T::Boolean).default(D::Bool(true)),
    ],
    relations: &[
        Relation::has_many("employees", "employees", "department_id"),
        Relation::has_many("projects", "projects", "department_id"),
        Relation::has_many("events", "events", "department_id"),
    ],
    searchable: &["name", "code", "description"],
    citizen_fields: &[],
    exposed: true,
};

pub static CITIZENS: ResourceSchema = ResourceSchema {
    name: "citizens",
    table: "citizens",
    label: "Citizen",
    columns: &[
        ColumnDef::new("user_id", T::Integer).unique().references("users"),
        ColumnDef::new("national_id", T::String).required().unique(),
        ColumnDef::new("first_name", T::String).required(),
        ColumnDef::new("last_name", T::String).required(),
        ColumnDef::new("email", T::String),
        ColumnDef::new("phone", T::String),
        ColumnDef::new("date_of_birth", T::Date),
        ColumnDef::new("gender", T::String).one_of(&["male", "female", "other"]),
        ColumnDef::new("address", T::Text),
        ColumnDef::new("city", T::String),
        ColumnDef::new("postal_code", T::String),
        ColumnDef::new("is_verified", T::Boolean).default(D::Bool(false)),
    ],
    relations: &[
        Relation::belongs_to("user", "users", "user_id"),
        Relation::has_many("requests", "requests", "citizen_id"),
        Relation::has_many("permits", "permits", "citizen_id"),
        Relation::has_many("payments", "payments", "citizen_id"),
        Relation::has_many("documents", "documents", "citizen_id"),
    ],
    searchable: &["national_id", "first_name", "last_name", "email"],
    citizen_fields: &[
        "first_name", "last_name", "email", "phone", "date_of_birth", "gender", "address", "city",
        "postal_code",
    ],
    exposed: true,
};

pub static EMPLOYEES: ResourceSchema = ResourceSchema {
    name: "employees",
    table: "employees",
    label: "Employee",
    columns: &[
        ColumnDef::new("department_id", T::Integer).required().references("departments"),
        ColumnDef::new("employee_number", T::String).required().unique(),
        ColumnDef::new("first_name", T::String).required(),
        ColumnDef::new("last_name", T::String).required(),
        ColumnDef::new("email", T::String).required().unique(),
        ColumnDef::new("phone", T::String),
        ColumnDef::new("position", T::String).required(),
        ColumnDef::new("hire_date", T::Date).required(),
        ColumnDef::new("termination_date", T::Date),
        ColumnDef::new("salary", T::Decimal).min(0),
        ColumnDef::new("status", T::String)
            .one_of(&["active", "on_leave", "terminated"])
            .default(D::Str("active")),
    ],
    relations: &[
        Relation::belongs_to("department", "departments", "department_id"),
        Relation::has_many("attendance", "attendances", "employee_id"),
        Relation::has_many("tasks", "tasks", "assigned_to"),
    ],
    searchable: &["employee_number", "first_name", "last_name", "email", "position"],
    citizen_fields: &[],
    exposed: true,
};

pub static ATTENDANCE: ResourceSchema = ResourceSchema {
    name: "attendance",
    table: "attendances",
    label: "Attendance record",
    columns: &[
        ColumnDef::new("employee_id", T::Integer).required().references("employees"),
        ColumnDef::new("date", T::Date).required(),
        ColumnDef::new("check_in", T::Time),
        ColumnDef::new("check_out", T::Time),
        ColumnDef::new("hours_worked", T::Decimal).computed(),
        ColumnDef::new("status", T::String)
            .one_of(&["present", "absent", "late", "half_day", "on_leave"])
            .default(D::Str("present")),
        ColumnDef::new("notes", T::Text),
    ],
    relations: &[Relation::belongs_to("employee", "employees", "employee_id")],
    searchable: &["notes"],
    citizen_fields: &[],
    exposed: true,
};

pub static REQUESTS: ResourceSchema = ResourceSchema {
    name: "requests",
    table: "requests",
    label: "Request",
    columns: &[
        ColumnDef::new("citizen_id", T::Integer).required().references("citizens"),
        ColumnDef::new("department_id", T::Integer).references("departments"),
        ColumnDef::new("assigned_to", T::Integer).references("employees"),
        ColumnDef::new("type", T::String).required(),
        ColumnDef::new("subject", T::String).required(),
        ColumnDef::new("description", T::Text).required(),
        ColumnDef::new("status", T::String).one_of(REQUEST_STATUSES).default(D::Str("pending")),
        ColumnDef::new("priority", T::String).one_of(PRIORITIES).default(D::Str("medium")),
        ColumnDef::new("submission_date", T::DateTime).default(D::Now),
        ColumnDef::new("completion_date", T::DateTime).computed(),
        ColumnDef::new("response", T::Text),
    ],
    relations: &[
        Relation::belongs_to("citizen", "citizens", "citizen_id"),
        Relation::belongs_to("department", "departments", "department_id"),
        Relation::belongs_to("assignee", "employees", "assigned_to"),
        Relation::has_many("documents", "documents", "request_id"),
    ],
    searchable: &["type", "subject", "description"],
    citizen_fields: &["department_id", "type", "subject", "description", "priority"],
    exposed: true,
};

pub static PERMITS: ResourceSchema = ResourceSchema {
    name: "permits",
    table: "permits",
    label: "Permit",
    columns: &[
        ColumnDef::new("citizen_id", T::Integer).required().references("citizens"),
        ColumnDef::new("permit_number", T::String).unique().computed(),
        ColumnDef::new("type", T::String).required(),
        ColumnDef::new("description", T::Text),
        ColumnDef::new("address", T::Text),
        ColumnDef::new("status", T::String).one_of(PERMIT_STATUSES).default(D::Str("pending")),
        ColumnDef::new("fee", T::Decimal).min(0),
        ColumnDef::new("application_date", T::Date).default(D::Today),
        ColumnDef::new("issue_date", T::Date),
        ColumnDef::new("expiry_date", T::Date),
        ColumnDef::new("rejection_reason", T::Text),
    ],
    relations: &[
        Relation::belongs_to("citizen", "citizens", "citizen_id"),
        Relation::has_many("payments", "payments", "permit_id"),
        Relation::has_many("documents", "documents", "permit_id"),
    ],
    searchable: &["permit_number", "type", "description", "address"],
    citizen_fields: &["type", "description", "address"],
    exposed: true,
};

pub static PAYMENTS: ResourceSchema = ResourceSchema {
    name: "payments",
    table: "payments",
    label: "Payment",
    columns: &[
        ColumnDef::new("citizen_id", T::Integer).required().references("citizens"),
        ColumnDef::new("permit_id", T::Integer).references("permits"),
        ColumnDef::new("type", T::String).required(),
        ColumnDef::new("reference_number", T::String).unique().computed(),
        ColumnDef::new("amount", T::Decimal).required().min(0),
        ColumnDef::new("status", T::String).one_of(PAYMENT_STATUSES).default(D::Str("pending")),
        ColumnDef::new("payment_method", T::String).one_of(&["cash", "card", "bank_transfer", "online"]),
        ColumnDef::new("due_date", T::Date),
        ColumnDef::new("payment_date", T::DateTime).computed(),
        ColumnDef::new("receipt_number", T::String).unique().computed(),
        ColumnDef::new("description", T::Text),
    ],
    relations: &[
        Relation::belongs_to("citizen", "citizens", "citizen_id"),
        Relation::belongs_to("permit", "permits", "permit_id"),
    ],
    searchable: &["reference_number", "receipt_number", "type", "description"],
    citizen_fields: &[],
    exposed: true,
};

pub static PROJECTS: ResourceSchema = ResourceSchema {
    name: "projects",
    table: "projects",
    label: "Project",
    columns: &[
        ColumnDef::new("department_id", T::Integer).references("departments"),
        ColumnDef::new("manager_id", T::Integer).references("employees"),
        ColumnDef::new("name", T::String).required(),
        ColumnDef::new("description", T::Text),
        ColumnDef::new("status", T::String)
            .one_of(&["planning", "in_progress", "on_hold", "completed", "cancelled"])
            .default(D::Str("planning")),
        ColumnDef::new("start_date", T::Date),
        ColumnDef::new("end_date", T::Date),
        ColumnDef::new("budget", T::Decimal).min(0),
        ColumnDef::new("spent", T::Decimal).min(0).default(D::Int(0)),
        ColumnDef::new("progress_percentage", T::Integer).min(0).max(100).default(D::Int(0)),
        ColumnDef::new("location", T::String),
    ],
    relations: &[
        Relation::belongs_to("department", "departments", "department_id"),
        Relation::belongs_to("manager", "employees", "manager_id"),
        Relation::has_many("tasks", "tasks", "project_id"),
    ],
    searchable: &["name", "description", "location"],
    citizen_fields: &[],
    exposed: true,
};

pub static TASKS: ResourceSchema = ResourceSchema {
    name: "tasks",
    table: "tasks",
    label: "Task",
    columns: &[
        ColumnDef::new("project_id", T::Integer).required().references("projects"),
        ColumnDef::new("assigned_to", T::Integer).references("employees"),
        ColumnDef::new("title", T::String).required(),
        ColumnDef::new("description", T::Text),
        ColumnDef::new("status", T::String)
            .one_of(&["pending", "in_progress", "completed", "cancelled"])
            .default(D::Str("pending")),
        ColumnDef::new("priority", T::String).one_of(PRIORITIES).default(D::Str("medium")),
        ColumnDef::new("due_date", T::Date),
        ColumnDef::new("completed_at", T::DateTime).computed(),
    ],
    relations: &[
        Relation::belongs_to("project", "projects", "project_id"),
        Relation::belongs_to("assignee", "employees", "assigned_to"),
    ],
    searchable: &["title", "description"],
    citizen_fields: &[],
    exposed: true,
};

pub static EVENTS: ResourceSchema = ResourceSchema {
    name: "events",
    table: "events",
    label: "Event",
    columns: &[
        ColumnDef::new("department_id", T::Integer).references("departments"),
        ColumnDef::new("title", T::String).required(),
        ColumnDef::new("description", T::Text),
        ColumnDef::new("location", T::String),
        ColumnDef::new("start_date", T::DateTime).required(),
        ColumnDef::new("end_date", T::DateTime),
        ColumnDef::new("status", T::String)
            .one_of(&["scheduled", "ongoing", "completed", "cancelled"])
            .default(D::Str("scheduled")),
        ColumnDef::new("max_attendees", T::Integer).min(0),
        ColumnDef::new("is_public", T::Boolean).default(D::Bool(true)),
    ],
    relations: &[Relation::belongs_to("department", "departments", "department_id")],
    searchable: &["title", "description", "location"],
    citizen_fields: &[],
    exposed: true,
};

pub static DOCUMENTS: ResourceSchema = ResourceSchema {
    name: "documents",
    table: "documents",
    label: "Document",
    columns: &[
        ColumnDef::new("citizen_id", T::Integer).references("citizens"),
        ColumnDef::new("request_id", T::Integer).references("requests"),
        ColumnDef::new("permit_id", T::Integer).references("permits"),
        ColumnDef::new("title", T::String).required(),
        ColumnDef::new("document_type", T::String).required(),
        ColumnDef::new("file_path", T::String).required(),
        ColumnDef::new("file_name", T::String),
        ColumnDef::new("mime_type", T::String),
        ColumnDef::new("file_size", T::Integer).min(0),
        ColumnDef::new("checksum", T::String),
        ColumnDef::new("status", T::String)
            .one_of(&["pending", "verified", "rejected"])
            .default(D::Str("pending")),
        ColumnDef::new("description", T::Text),
    ],
    relations: &[
        Relation::belongs_to("citizen", "citizens", "citizen_id"),
        Relation::belongs_to("request", "requests", "request_id"),
        Relation::belongs_to("permit", "permits", "permit_id"),
    ],
    searchable: &["title", "document_type", "file_name"],
    citizen_fields: &[
        "request_id", "permit_id", "title", "document_type", "file_path", "file_name", "mime_type",
        "file_size", "checksum", "description",
    ],
    exposed: true,
};

/// Accounts mirrored from the authentication service
pub static USERS: ResourceSchema = ResourceSchema {
    name: "users",
    table: "users",
    label: "User",
    columns: &[
        ColumnDef::new("name", T::String).required(),
        ColumnDef::new("email", T::String).required().unique(),
        ColumnDef::new("role", T::String).required().default(D::Str("citizen")),
    ],
    relations: &[],
    searchable: &["name", "email"],
    citizen_fields: &[],
    exposed: false,
};

/// Stored notification channel
pub static NOTIFICATIONS: ResourceSchema = ResourceSchema {
    name: "notifications",
    table: "notifications",
    label: "Notification",
    columns: &[
        ColumnDef::new("user_id", T::Integer).required().references("users"),
        ColumnDef::new("type", T::String).required(),
        ColumnDef::new("title", T::String).required(),
        ColumnDef::new("message", T::Text).required(),
        ColumnDef::new("data", T::Json),
        ColumnDef::new("read_at", T::DateTime),
    ],
    relations: &[],
    searchable: &["title", "message"],
    citizen_fields: &[],
    exposed: false,
};

pub static ALL: &[&ResourceSchema] = &[
    &USERS,
    &DEPARTMENTS,
    &CITIZENS,
    &EMPLOYEES,
    &ATTENDANCE,
    &REQUESTS,
    &PERMITS,
    &PAYMENTS,
    &PROJECTS,
    &TASKS,
    &EVENTS,
    &DOCUMENTS,
    &NOTIFICATIONS,
];

/// Resource routed at /api/<name>
pub fn resource(name: &str) -> Option<&'static ResourceSchema> {
    ALL.iter().copied().find(|r| r.exposed && r.name == name)
}

/// Resource stored in `table`, internal tables included
pub fn by_table(table: &str) -> Option<&'static ResourceSchema> {
    ALL.iter().copied().find(|r| r.table == table)
}

pub fn exposed() -> impl Iterator<Item = &'static ResourceSchema> {
    ALL.iter().copied().filter(|r| r.exposed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleven_resources_are_routed() {
        let names: Vec<_> = exposed().map(|r| r.name).collect();
        assert_eq!(names.len(), 11);
        assert!(names.contains(&"attendance"));
        assert!(!names.contains(&"users"));
        assert!(resource("notifications").is_none());
    }

    #[test]
    fn references_point_at_known_tables() {
        for schema in ALL {
            for column in schema.columns {
                if let Some(table) = column.references {
                    assert!(by_table(table).is_some(), "{}.{} -> {}", schema.table, column.name, table);
                }
            }
            for relation in schema.relations {
                let target = by_table(relation.table)
                    .unwrap_or_else(|| panic!("{} relation {} -> {}", schema.table, relation.name, relation.table));
                match relation.kind {
                    super::super::schema::RelationKind::BelongsTo => {
                        assert!(schema.column(relation.column).is_some())
                    }
                    super::super::schema::RelationKind::HasMany => {
                        assert!(target.column(relation.column).is_some())
                    }
                }
            }
        }
    }

    #[test]
    fn citizen_fields_are_declared_columns() {
        for schema in ALL {
            for field in schema.citizen_fields {
                assert!(schema.column(field).is_some(), "{}.{}", schema.table, field);
            }
        }
    }
}
