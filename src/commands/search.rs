// 搜索命令模块
//
// 对外暴露混合搜索接口：语义候选召回 + 关键词分层重排

use crate::services::search::MAX_RESULTS;
use crate::utils::{validate_limit, validate_not_empty};
use crate::{AppResult, AppState};

use super::{SearchRequest, SearchResponse};

/// Run a hybrid search. Returns a structured `NotReady` error while the
/// engine is still loading; upstream failures inside the engine degrade to
/// an empty result list instead of erroring.
pub async fn search(state: &AppState, payload: SearchRequest) -> AppResult<SearchResponse> {
    let query = validate_not_empty(&payload.query, "query")?;
    let limit = validate_limit(payload.limit, MAX_RESULTS as i32, MAX_RESULTS as i32);

    let engine = state.search.current()?;
    let results = engine.search(query, limit as usize).await;

    Ok(SearchResponse { results })
}
