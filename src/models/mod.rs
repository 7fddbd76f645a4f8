pub mod flight;
pub mod notification;
pub mod pagination;
pub mod route;

pub use flight::{FlightFilter, FlightImage, ImageEntry, ImageListResponse};
pub use notification::{
    FeedbackPolicy, FeedbackStep, Notification, NotificationQuery, NotificationStats, NotificationStatus,
    NotificationsResponse,
};
pub use pagination::{decode_payload, Page, PaginationMeta};
pub use route::{CreateRouteResponse, UploadUrlResponse};
