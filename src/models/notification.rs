use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationStatus {
    #[default]
    Unread,
    Read,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub is_useful: Option<bool>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub feedback_at: Option<String>,
}

/// Alerta generada por el análisis de una imagen de vuelo
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub notification_id: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub status: NotificationStatus,
    #[serde(default)]
    pub flight_name: Option<String>,
    #[serde(default)]
    pub image_name: Option<String>,
    #[serde(default)]
    pub alert_reason: Option<String>,
    #[serde(default)]
    pub read_at: Option<String>,
    #[serde(default)]
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Danger,
    Warning,
    Info,
}

impl Notification {
    /// Sin id, cliente o fecha la notificación se descarta
    pub fn is_valid(&self) -> bool {
        !self.notification_id.is_empty() && !self.client.is_empty() && !self.created_at.is_empty()
    }

    pub fn is_unread(&self) -> bool {
        self.status == NotificationStatus::Unread
    }

    pub fn has_feedback(&self) -> bool {
        self.feedback.as_ref().and_then(|f| f.is_useful).is_some()
    }

    /// Resumen corto para el dropdown: "vuelo/imagen"
    pub fn summary(&self) -> String {
        format!(
            "{}/{}",
            self.flight_name.as_deref().unwrap_or("Vuelo desconocido"),
            self.image_name.as_deref().unwrap_or("imagen")
        )
    }

    pub fn severity(&self) -> AlertSeverity {
        let reason = self.alert_reason.as_deref().unwrap_or("").to_lowercase();
        if reason.contains("arma") || reason.contains("weapon") {
            AlertSeverity::Danger
        } else if reason.contains("sospechoso") || reason.contains("suspicious") {
            AlertSeverity::Warning
        } else {
            AlertSeverity::Info
        }
    }
}

pub fn filter_valid(notifications: Vec<Notification>) -> Vec<Notification> {
    notifications.into_iter().filter(Notification::is_valid).collect()
}

/// Respuesta de `GET /notifications`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationsResponse {
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub next_key: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Parámetros de consulta de notificaciones
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationQuery {
    pub limit: Option<u32>,
    pub last_key: Option<String>,
    pub status: Option<NotificationStatus>,
}

/// `{ notification: {...} }` de mark-read y feedback
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    pub notification: Notification,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRequest {
    pub is_useful: bool,
    pub comments: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageUrlResponse {
    pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackStats {
    #[serde(default)]
    pub total_with_feedback: u32,
    #[serde(default)]
    pub useful: u32,
    #[serde(default)]
    pub not_useful: u32,
    #[serde(default)]
    pub pending_feedback: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationStats {
    #[serde(default)]
    pub total_notifications: u32,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub read_count: u32,
    #[serde(default)]
    pub recent_7_days: u32,
    #[serde(default)]
    pub feedback_stats: FeedbackStats,
}

/// Resultado de comparar las notificaciones recientes con la última conocida
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewNotificationsCheck {
    pub has_new: bool,
    pub new_count: usize,
    pub notifications: Vec<Notification>,
}

/// Las nuevas son las que preceden a la última conocida (orden del servidor: recientes primero).
/// Si la última conocida no aparece, cuentan todas las no leídas.
pub fn detect_new(notifications: Vec<Notification>, last_known_id: Option<&str>) -> NewNotificationsCheck {
    if notifications.is_empty() {
        return NewNotificationsCheck::default();
    }

    let known_index = last_known_id
        .and_then(|id| notifications.iter().position(|n| n.notification_id == id));

    let new_count = match known_index {
        Some(index) => notifications[..index].iter().filter(|n| n.is_unread()).count(),
        None => notifications.iter().filter(|n| n.is_unread()).count(),
    };

    NewNotificationsCheck {
        has_new: new_count > 0,
        new_count,
        notifications,
    }
}

// ============================================================================
// POLÍTICA DE FEEDBACK
// ============================================================================
// Una versión del modal enviaba "útil" al instante y pedía comentarios solo
// para "no útil"; la posterior siempre pide comentarios. Es configurable.
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackPolicy {
    #[default]
    AlwaysAskComments,
    SubmitUsefulImmediately,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStep {
    /// Enviar ya, sin comentarios
    Submit,
    /// Mostrar el campo de comentarios antes de enviar
    AskComments,
}

impl FeedbackPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "always_ask_comments" | "ask" => Some(FeedbackPolicy::AlwaysAskComments),
            "submit_useful_immediately" | "immediate" => Some(FeedbackPolicy::SubmitUsefulImmediately),
            _ => None,
        }
    }

    pub fn step_after_rating(&self, is_useful: bool) -> FeedbackStep {
        match (self, is_useful) {
            (FeedbackPolicy::SubmitUsefulImmediately, true) => FeedbackStep::Submit,
            _ => FeedbackStep::AskComments,
        }
    }
}
