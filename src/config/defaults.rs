pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 3000;
pub const DEFAULT_APP_NAME: &str = "RBAC Server";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 30 * 24 * 60 * 60;
pub const DEFAULT_ADMIN_NAME: &str = "Administrator";
pub const DEFAULT_MAIL_FROM: &str = "noreply@example.com";
pub const DEFAULT_MAIL_QUEUE_CAPACITY: i64 = 256;
pub const DEFAULT_MAIL_ENQUEUE_TIMEOUT_MS: i64 = 500;
