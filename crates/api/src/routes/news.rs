use axum::Json;
use axum::extract::{Query, State};
use quotedeck_core::market::entity::NewsArticle;
use quotedeck_market::news::DEFAULT_CATEGORY;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiErrorResponse, NewsQuery};

/// 分类新闻
#[utoipa::path(
    get,
    path = "/news",
    tag = "新闻 (News)",
    params(
        ("category" = Option<String>, Query, description = "新闻分类 (默认 general)")
    ),
    responses(
        (status = 200, description = "获取成功", body = Vec<NewsArticle>),
        (status = 502, description = "上游不可用", body = ApiErrorResponse)
    )
)]
pub async fn get_news(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<Vec<NewsArticle>>, ApiError> {
    let category = query.category.as_deref().unwrap_or(DEFAULT_CATEGORY);
    Ok(Json(state.news.get_news(category).await?))
}

/// 市场新闻，等价于 `/news?category=general`
#[utoipa::path(
    get,
    path = "/news/market",
    tag = "新闻 (News)",
    responses(
        (status = 200, description = "获取成功", body = Vec<NewsArticle>),
        (status = 502, description = "上游不可用", body = ApiErrorResponse)
    )
)]
pub async fn get_market_news(
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsArticle>>, ApiError> {
    Ok(Json(state.news.get_market_news().await?))
}
