use crate::error::ApiError;
use crate::shared::directory::Directory;
use crate::shared::usecase::{execute, UseCase};

use actix_web::{web, HttpResponse};
use calgate_api_structs::dtos::CalendarEventDTO;
use calgate_api_structs::event::update_event::{APIResponse, PathParams, RequestBody};
use calgate_infra::repos::{CalendarError, CalendarReader, CalendarWriter};
use calgate_infra::Context;
use std::fmt;
use std::sync::Arc;

const DEFAULT_UPDATE_PATHS: [&str; 6] = [
    "name",
    "description",
    "start",
    "end",
    "extra_data",
    "resources",
];

pub async fn update_event_controller(
    path: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    directory: web::Data<Directory>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    let path = path.into_inner();
    let usecase = UpdateEventUseCase {
        calendar_id: path.calendar_id,
        event_id: path.event_id,
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
            UseCaseError::NameRequired => {
                ApiError::InvalidArgument("name field is required".into())
            }
            UseCaseError::MissingStart => {
                ApiError::InvalidArgument("invalid value for field start".into())
            }
            UseCaseError::InvalidTimes => {
                ApiError::InvalidArgument("event end must not precede its start".into())
            }
            UseCaseError::ExtraDataUnsupported => ApiError::Unimplemented(
                "updating event.extra_data is not yet supported".into(),
            ),
            UseCaseError::UnknownPath(path) => {
                ApiError::InvalidArgument(format!("invalid update_mask path {:?}", path))
            }
            UseCaseError::Backend(err) => err.into(),
        })
}

pub struct UpdateEventUseCase {
    pub calendar_id: String,
    pub event_id: String,
    pub body: RequestBody,
    pub directory: Arc<Directory>,
}

impl fmt::Debug for UpdateEventUseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateEventUseCase")
            .field("calendar_id", &self.calendar_id)
            .field("event_id", &self.event_id)
            .field("body", &self.body)
            .finish()
    }
}

#[derive(Debug)]
pub enum UseCaseError {
    UnknownCalendar,
    ReadOnlyCalendar,
    NameRequired,
    MissingStart,
    InvalidTimes,
    ExtraDataUnsupported,
    UnknownPath(String),
    Backend(CalendarError),
}

#[async_trait::async_trait(?Send)]
impl UseCase for UpdateEventUseCase {
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

        // always apply against the authoritative upstream state
        let mut event = ctx
            .facade
            .reader_for(&self.calendar_id)
            .load_event(&self.calendar_id, &self.event_id, true)
            .await
            .map_err(UseCaseError::Backend)?;

        let paths: Vec<String> = if self.body.update_mask.is_empty() {
            DEFAULT_UPDATE_PATHS.iter().map(|p| p.to_string()).collect()
        } else {
            self.body.update_mask.clone()
        };

        for path in &paths {
            match path.as_str() {
                "name" => {
                    if self.body.name.is_empty() {
                        return Err(UseCaseError::NameRequired);
                    }
                    event.summary = self.body.name.clone();
                }
                "description" => event.description = self.body.description.clone(),
                "start" => {
                    let start = self.body.start.ok_or(UseCaseError::MissingStart)?;
                    event.start_time = start;
                }
                "end" => {
                    // an absent end marks a full-day event, the flag has to
                    // follow the field in both directions
                    event.end_time = self.body.end;
                    event.full_day = self.body.end.is_none();
                }
                "extra_data" => {
                    if self.body.extra_data.is_some() {
                        return Err(UseCaseError::ExtraDataUnsupported);
                    }
                }
                "resources" => event.resources = self.body.resources.clone(),
                other => return Err(UseCaseError::UnknownPath(other.to_string())),
            }
        }

        if !event.is_valid() {
            return Err(UseCaseError::InvalidTimes);
        }

        let updated = ctx
            .facade
            .writer_for(&self.calendar_id)
            .map_err(UseCaseError::Backend)?
            .update_event(event)
            .await
            .map_err(UseCaseError::Backend)?;

        Ok(CalendarEventDTO::new(updated))
    }
}
