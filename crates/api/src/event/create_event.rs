use crate::error::ApiError;
use crate::shared::directory::Directory;
use crate::shared::usecase::{execute, UseCase};

use actix_web::{web, HttpResponse};
use calgate_api_structs::dtos::CalendarEventDTO;
use calgate_api_structs::event::create_event::{APIResponse, PathParams, RequestBody};
use calgate_domain::{AnnotationError, CustomerAnnotation};
use calgate_infra::repos::{CalendarError, CalendarWriter, NewEvent};
use calgate_infra::Context;
use std::fmt;
use std::sync::Arc;

pub async fn create_event_controller(
    path: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    directory: web::Data<Directory>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    let usecase = CreateEventUseCase {
        calendar_id: path.into_inner().calendar_id,
        body: body.into_inner(),
        directory: directory.into_inner(),
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Ok().json(APIResponse { event }))
        .map_err(|e| match e {
            UseCaseError::UnknownCalendar => ApiError::InvalidArgument("invalid calendar id".into()),
            UseCaseError::ReadOnlyCalendar => {
                ApiError::PermissionDenied("calendar is read-only".into())
            }
            UseCaseError::InvalidEnd => {
                ApiError::InvalidArgument("invalid value for field end".into())
            }
            UseCaseError::InvalidExtraData(err) => ApiError::InvalidArgument(err.to_string()),
            UseCaseError::Backend(err) => err.into(),
        })
}

pub struct CreateEventUseCase {
    pub calendar_id: String,
    pub body: RequestBody,
    pub directory: Arc<Directory>,
}

impl fmt::Debug for CreateEventUseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateEventUseCase")
            .field("calendar_id", &self.calendar_id)
            .field("body", &self.body)
            .finish()
    }
}

#[derive(Debug)]
pub enum UseCaseError {
    UnknownCalendar,
    ReadOnlyCalendar,
    InvalidEnd,
    InvalidExtraData(AnnotationError),
    Backend(CalendarError),
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateEventUseCase {
    type Response = CalendarEventDTO;
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

        // an absent end marks a full-day event
        let duration = match self.body.end {
            Some(end) => {
                let duration = end - self.body.start;
                if duration < chrono::Duration::zero() {
                    return Err(UseCaseError::InvalidEnd);
                }
                Some(duration)
            }
            None => None,
        };

        let annotation: Option<CustomerAnnotation> = match &self.body.extra_data {
            Some(extra) => Some(extra.decode().map_err(UseCaseError::InvalidExtraData)?),
            None => None,
        };

        let writer = ctx
            .facade
            .writer_for(&self.calendar_id)
            .map_err(UseCaseError::Backend)?;

        let event = writer
            .create_event(
                &self.calendar_id,
                NewEvent {
                    summary: self.body.name.clone(),
                    description: self.body.description.clone(),
                    start_time: self.body.start,
                    duration,
                    resources: self.body.resources.clone(),
                    annotation,
                },
            )
            .await
            .map_err(UseCaseError::Backend)?;

        Ok(CalendarEventDTO::new(event))
    }
}
