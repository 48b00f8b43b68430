// 会话状态查询与重置

use crate::agent::SessionOverview;
use crate::AppState;

/// Read-only projection of a session, or `None` if it does not exist.
pub async fn session_overview(state: &AppState, session_id: &str) -> Option<SessionOverview> {
    state.sessions.overview(session_id).await
}

/// Drop a session from the store. Returns whether one existed.
pub async fn reset_session(state: &AppState, session_id: &str) -> bool {
    state.sessions.reset(session_id).await
}
