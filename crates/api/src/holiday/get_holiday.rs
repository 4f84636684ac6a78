use crate::error::ApiError;
use actix_web::{web, HttpResponse};
use calgate_api_structs::dtos::PublicHolidayDTO;
use calgate_api_structs::holiday::get_holiday::{APIResponse, QueryParams};
use calgate_infra::services::holidays::HolidayGetter;
use calgate_infra::Context;
use tracing::error;

pub async fn get_holiday_controller(
    query: web::Query<QueryParams>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    let holidays = ctx
        .holidays
        .get(&ctx.config.default_country, query.year)
        .await
        .map_err(|err| {
            error!(error = %err, "failed to load holidays");
            ApiError::Internal
        })?;

    // filter to the year, optionally narrowed to one month
    let mut prefix = format!("{}-", query.year);
    if let Some(month) = query.month {
        if !(1..=12).contains(&month) {
            return Err(ApiError::InvalidArgument(format!(
                "invalid month {}",
                month
            )));
        }
        prefix = format!("{}-{:02}-", query.year, month);
    }

    let holidays = holidays
        .into_iter()
        .filter(|h| h.date.starts_with(&prefix))
        .map(PublicHolidayDTO::new)
        .collect();

    Ok(HttpResponse::Ok().json(APIResponse { holidays }))
}
