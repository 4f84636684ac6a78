use crate::error::ApiError;
use actix_web::{web, HttpResponse};
use calgate_api_structs::resource::delete_resource_calendar::{APIResponse, PathParams};
use calgate_infra::repos::IResourceCalendarRepo;
use calgate_infra::Context;
use tracing::error;

pub async fn delete_resource_calendar_controller(
    path: web::Path<PathParams>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    let name = path.into_inner().name;

    let deleted = ctx.resources.delete(&name).await.map_err(|err| {
        error!(error = %err, "failed to delete resource-calendar");
        ApiError::Internal
    })?;

    if !deleted {
        return Err(ApiError::NotFound(format!(
            "resource-calendar {} not found",
            name
        )));
    }

    Ok(HttpResponse::Ok().json(APIResponse::default()))
}
