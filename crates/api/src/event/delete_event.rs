use crate::error::ApiError;
use crate::shared::directory::Directory;
use crate::shared::usecase::{execute, UseCase};

use actix_web::{web, HttpResponse};
use calgate_api_structs::event::delete_event::{APIResponse, PathParams};
use calgate_infra::repos::{CalendarError, CalendarWriter};
use calgate_infra::Context;
use std::fmt;
use std::sync::Arc;

pub async fn delete_event_controller(
    path: web::Path<PathParams>,
    directory: web::Data<Directory>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    let path = path.into_inner();
    let usecase = DeleteEventUseCase {
        calendar_id: path.calendar_id,
        event_id: path.event_id,
        directory: directory.into_inner(),
    };

    execute(usecase, &ctx)
        .await
        .map(|_| HttpResponse::Ok().json(APIResponse::default()))
        .map_err(|e| match e {
            UseCaseError::UnknownCalendar => ApiError::InvalidArgument("invalid calendar id".into()),
            UseCaseError::ReadOnlyCalendar => {
                ApiError::PermissionDenied("calendar is read-only".into())
            }
            UseCaseError::Backend(err) => err.into(),
        })
}

pub struct DeleteEventUseCase {
    pub calendar_id: String,
    pub event_id: String,
    pub directory: Arc<Directory>,
}

impl fmt::Debug for DeleteEventUseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteEventUseCase")
            .field("calendar_id", &self.calendar_id)
            .field("event_id", &self.event_id)
            .finish()
    }
}

#[derive(Debug)]
pub enum UseCaseError {
    UnknownCalendar,
    ReadOnlyCalendar,
    Backend(CalendarError),
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteEventUseCase {
    type Response = ();
    type Errors = UseCaseError;

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Errors> {
        let calendar = self
            .directory
            .calendar_by_id
            .get(&self.calendar_id)
            .ok_or(UseCaseError::UnknownCalendar)?;

        if calendar.readonly {
            return Err(UseCaseError::ReadOnlyCalendar);
        }

        ctx.facade
            .writer_for(&self.calendar_id)
            .map_err(UseCaseError::Backend)?
            .delete_event(&self.calendar_id, &self.event_id)
            .await
            .map_err(UseCaseError::Backend)?;

        Ok(())
    }
}
