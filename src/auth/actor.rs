use serde::Serialize;

/// Surface a write arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Citizen self-service under /portal
    Portal,
    /// Staff console under /api
    Admin,
    /// Internal writes (notifications, user mirror, CLI)
    System,
}

/// Who is performing an operation
#[derive(Debug, Clone, Serialize)]
pub struct Actor {
    pub user_id: Option<i64>,
    pub role: String,
    pub channel: Channel,
    /// Citizen profile of a portal caller, once onboarded
    pub citizen_id: Option<i64>,
}

impl Actor {
    pub fn system() -> Self {
        Self { user_id: None, role: "system".to_string(), channel: Channel::System, citizen_id: None }
    }

    pub fn staff(user_id: i64, role: impl Into<String>) -> Self {
        Self { user_id: Some(user_id), role: role.into(), channel: Channel::Admin, citizen_id: None }
    }

    pub fn citizen(user_id: i64, role: impl Into<String>, citizen_id: Option<i64>) -> Self {
        Self { user_id: Some(user_id), role: role.into(), channel: Channel::Portal, citizen_id }
    }

    pub fn is_system(&self) -> bool {
        self.channel == Channel::System
    }

    pub fn is_portal(&self) -> bool {
        self.channel == Channel::Portal
    }
}
