use crate::error::ApiError;
use actix_web::{web, HttpResponse};
use calgate_api_structs::resource::store_resource_calendar::RequestBody;
use calgate_infra::repos::IResourceCalendarRepo;
use calgate_infra::Context;
use tracing::error;

pub async fn store_resource_calendar_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    if body.name.is_empty() {
        return Err(ApiError::InvalidArgument("name field is required".into()));
    }

    let resource = body.clone().into_domain();
    ctx.resources.store(&resource).await.map_err(|err| {
        error!(error = %err, "failed to store resource-calendar");
        ApiError::Internal
    })?;

    Ok(HttpResponse::Ok().json(body))
}
