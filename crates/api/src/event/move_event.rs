use crate::error::ApiError;
use crate::shared::directory::Directory;
use crate::shared::usecase::{execute, UseCase};

use actix_web::{web, HttpResponse};
use calgate_api_structs::dtos::CalendarEventDTO;
use calgate_api_structs::event::move_event::{APIResponse, RequestBody};
use calgate_infra::repos::{CalendarError, CalendarWriter};
use calgate_infra::Context;
use std::fmt;
use std::sync::Arc;

pub async fn move_event_controller(
    body: web::Json<RequestBody>,
    directory: web::Data<Directory>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    let usecase = MoveEventUseCase {
        body: body.into_inner(),
        directory: directory.into_inner(),
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Ok().json(APIResponse { event }))
        .map_err(|e| match e {
            UseCaseError::UnresolvedSource => {
                ApiError::InvalidArgument("invalid source calendar specification".into())
            }
            UseCaseError::UnresolvedTarget => {
                ApiError::InvalidArgument("invalid target calendar specification".into())
            }
            UseCaseError::ReadOnlySource => {
                ApiError::PermissionDenied("source calendar is read-only".into())
            }
            UseCaseError::ReadOnlyTarget => {
                ApiError::PermissionDenied("target calendar is read-only".into())
            }
            UseCaseError::Backend(err) => err.into(),
        })
}

pub struct MoveEventUseCase {
    pub body: RequestBody,
    pub directory: Arc<Directory>,
}

impl fmt::Debug for MoveEventUseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoveEventUseCase")
            .field("body", &self.body)
            .finish()
    }
}

#[derive(Debug)]
pub enum UseCaseError {
    UnresolvedSource,
    UnresolvedTarget,
    ReadOnlySource,
    ReadOnlyTarget,
    Backend(CalendarError),
}

#[async_trait::async_trait(?Send)]
impl UseCase for MoveEventUseCase {
    type Response = CalendarEventDTO;
    type Errors = UseCaseError;

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Errors> {
        let origin_id = self
            .resolve(
                self.body.source_calendar_id.as_deref(),
                self.body.source_user_id.as_deref(),
            )
            .ok_or(UseCaseError::UnresolvedSource)?;
        let origin = self
            .directory
            .calendar_by_id
            .get(&origin_id)
            .ok_or(UseCaseError::UnresolvedSource)?;
        if origin.readonly {
            return Err(UseCaseError::ReadOnlySource);
        }

        let target_id = self
            .resolve(
                self.body.target_calendar_id.as_deref(),
                self.body.target_user_id.as_deref(),
            )
            .ok_or(UseCaseError::UnresolvedTarget)?;
        let target = self
            .directory
            .calendar_by_id
            .get(&target_id)
            .ok_or(UseCaseError::UnresolvedTarget)?;
        if target.readonly {
            return Err(UseCaseError::ReadOnlyTarget);
        }

        let writer = ctx
            .facade
            .writer_for(&target_id)
            .map_err(UseCaseError::Backend)?;

        let event = writer
            .move_event(&origin_id, &self.body.event_id, &target_id)
            .await
            .map_err(UseCaseError::Backend)?;

        Ok(CalendarEventDTO::new(event))
    }
}

impl MoveEventUseCase {
    /// A calendar is addressed either directly or through the profile of a
    /// user.
    fn resolve(&self, calendar_id: Option<&str>, user_id: Option<&str>) -> Option<String> {
        match calendar_id {
            Some(id) if !id.is_empty() => Some(id.to_string()),
            _ => self.directory.resolve_user_calendar(user_id?),
        }
    }
}
