use crate::error::ApiError;
use actix_web::{web, HttpResponse};
use calgate_api_structs::holiday::number_of_work_days::{APIResponse, QueryParams};
use calgate_infra::services::holidays::HolidayGetter;
use calgate_infra::Context;
use chrono::{Datelike, Duration, Weekday};
use tracing::error;

pub async fn number_of_work_days_controller(
    query: web::Query<QueryParams>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    if query.to < query.from {
        return Err(ApiError::InvalidArgument(
            "to must not precede from".into(),
        ));
    }

    let country = query
        .country
        .clone()
        .unwrap_or_else(|| ctx.config.default_country.clone());

    let mut response = APIResponse::default();

    let mut day = query.from;
    while day <= query.to {
        match day.weekday() {
            Weekday::Sat | Weekday::Sun => response.number_of_weekend_days += 1,
            _ => {
                let holiday = ctx.holidays.is_holiday(&country, day).await.map_err(|err| {
                    error!(error = %err, "failed to check holiday");
                    ApiError::Internal
                })?;

                if holiday.is_some() {
                    response.number_of_holidays += 1;
                } else {
                    response.number_of_work_days += 1;
                }
            }
        }

        day = day + Duration::days(1);
    }

    Ok(HttpResponse::Ok().json(response))
}
