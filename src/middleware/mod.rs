/*
 * Responsibility
 * - middleware の公開インターフェース
 * - 適用順 (外側から): context → http → cors → security_headers → routes
 */
pub mod auth;
pub mod context;
pub mod cors;
pub mod http;
pub mod security_headers;
