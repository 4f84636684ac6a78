use crate::error::ApiError;
use crate::shared::directory::Directory;
use crate::shared::usecase::{execute, UseCase};

use actix_web::{web, HttpResponse};
use calgate_api_structs::calendar::list_calendars::{APIResponse, QueryParams};
use calgate_api_structs::dtos::CalendarDTO;
use calgate_infra::repos::IResourceCalendarRepo;
use calgate_infra::Context;
use std::fmt;
use std::sync::Arc;

pub async fn list_calendars_controller(
    query: web::Query<QueryParams>,
    directory: web::Data<Directory>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    let usecase = ListCalendarsUseCase {
        include_virtual_resource_calendars: query.include_virtual_resource_calendars,
        directory: directory.into_inner(),
    };

    execute(usecase, &ctx)
        .await
        .map(|res| HttpResponse::Ok().json(res))
        .map_err(|e| match e {
            UseCaseError::Internal(err) => {
                tracing::error!(error = %err, "failed to list calendars");
                ApiError::Internal
            }
        })
}

pub struct ListCalendarsUseCase {
    pub include_virtual_resource_calendars: bool,
    pub directory: Arc<Directory>,
}

impl fmt::Debug for ListCalendarsUseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListCalendarsUseCase")
            .field(
                "include_virtual_resource_calendars",
                &self.include_virtual_resource_calendars,
            )
            .finish()
    }
}

#[derive(Debug)]
pub enum UseCaseError {
    Internal(anyhow::Error),
}

#[async_trait::async_trait(?Send)]
impl UseCase for ListCalendarsUseCase {
    type Response = APIResponse;
    type Errors = UseCaseError;

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Errors> {
        let (calendars, _) = self.directory.calendars.get();

        let mut response = APIResponse::default();
        for calendar in calendars {
            let user_id = self
                .directory
                .user_by_calendar_id
                .get(&calendar.id)
                .map(|p| p.user.id);

            response.calendars.push(CalendarDTO::new(calendar, user_id));
        }

        if self.include_virtual_resource_calendars {
            let resources = ctx.resources.list().await.map_err(UseCaseError::Internal)?;
            for resource in &resources {
                response
                    .calendars
                    .push(CalendarDTO::virtual_resource(resource));
            }
        }

        Ok(response)
    }
}
