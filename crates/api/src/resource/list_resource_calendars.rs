use crate::error::ApiError;
use actix_web::{web, HttpResponse};
use calgate_api_structs::dtos::ResourceCalendarDTO;
use calgate_api_structs::resource::list_resource_calendars::APIResponse;
use calgate_infra::repos::IResourceCalendarRepo;
use calgate_infra::Context;
use tracing::error;

pub async fn list_resource_calendars_controller(
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    let resources = ctx.resources.list().await.map_err(|err| {
        error!(error = %err, "failed to list resource-calendars");
        ApiError::Internal
    })?;

    Ok(HttpResponse::Ok().json(APIResponse {
        resource_calendars: resources
            .into_iter()
            .map(ResourceCalendarDTO::new)
            .collect(),
    }))
}
