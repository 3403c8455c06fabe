/*!
 * Request context extractor
 *
 * Responsibility:
 * - リクエストごとのコンテキスト（RequestContext）を handler に提供する
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - RequestContext
 * - Ctx
 * - Authenticated
 */

mod core;
mod types;

pub use core::{Authenticated, Ctx};
pub use types::RequestContext;
