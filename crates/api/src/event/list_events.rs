use crate::error::ApiError;
use crate::shared::auth::remote_identity;
use crate::shared::directory::Directory;
use crate::shared::usecase::{execute, UseCase};

use actix_web::{web, HttpRequest, HttpResponse};
use calgate_api_structs::dtos::{CalendarDTO, CalendarEventDTO};
use calgate_api_structs::event::list_events::{APIResponse, CalendarEventList, RequestBody};
use calgate_api_structs::event::{EventSource, RequestKind, SearchTime};
use calgate_domain::{
    calculate_free_slots, end_of_day, parse_flexible_date, sort_events, CalendarEvent,
    EventSearchOptions, PlannedShift,
};
use calgate_infra::repos::{CalendarError, CalendarReader, IResourceCalendarRepo};
use calgate_infra::Context;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

pub async fn list_events_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    directory: web::Data<Directory>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    let identity = remote_identity(&http_req);

    let usecase = ListEventsUseCase {
        body: body.into_inner(),
        caller_user_id: identity.user_id,
        directory: directory.into_inner(),
    };

    execute(usecase, &ctx)
        .await
        .map(|res| HttpResponse::Ok().json(res))
        .map_err(|e| match e {
            UseCaseError::InvalidDate(date) => ApiError::InvalidArgument(format!(
                "invalid format for date field {:?}, expected YYYY-MM-DD or YYYY/MM/DD",
                date
            )),
            UseCaseError::NoCallerProfile => ApiError::Internal,
            UseCaseError::EmptyCalendarSet => ApiError::Aborted("no calendars to query".into()),
            UseCaseError::CalendarNotFound(id) => {
                ApiError::NotFound(format!("failed to get calendar with id {:?}", id))
            }
            UseCaseError::Backend(err) => err.into(),
        })
}

pub struct ListEventsUseCase {
    pub body: RequestBody,
    pub caller_user_id: Option<String>,
    pub directory: Arc<Directory>,
}

impl fmt::Debug for ListEventsUseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListEventsUseCase")
            .field("body", &self.body)
            .field("caller_user_id", &self.caller_user_id)
            .finish()
    }
}

#[derive(Debug)]
pub enum UseCaseError {
    InvalidDate(String),
    NoCallerProfile,
    EmptyCalendarSet,
    CalendarNotFound(String),
    Backend(CalendarError),
}

impl From<CalendarError> for UseCaseError {
    fn from(err: CalendarError) -> Self {
        Self::Backend(err)
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for ListEventsUseCase {
    type Response = APIResponse;
    type Errors = UseCaseError;

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Errors> {
        let (search, range) = self.search_window()?;

        let read_mask = if self.body.read_mask.is_empty() {
            vec![
                "results.calendar".to_string(),
                "results.events".to_string(),
            ]
        } else {
            self.body.read_mask.clone()
        };

        let mut must_load_calendars = false;
        let mut must_load_events = false;
        for path in &read_mask {
            match path.as_str() {
                "results" => {
                    must_load_calendars = true;
                    must_load_events = true;
                }
                p if p.starts_with("results.calendar") => must_load_calendars = true,
                p if p.starts_with("results.events") => must_load_events = true,
                _ => {}
            }
        }

        let calendar_ids = self.resolve_calendar_ids()?;
        if calendar_ids.is_empty() {
            return Err(UseCaseError::EmptyCalendarSet);
        }

        // a stable order keeps responses deterministic
        let calendar_ids: Vec<String> = {
            let mut ids: Vec<String> = calendar_ids.into_iter().collect();
            ids.sort();
            ids
        };

        let free_slots = self.body.request_kinds.contains(&RequestKind::FreeSlots);
        let only_free_slots = !self.body.request_kinds.contains(&RequestKind::Events);

        let shifts_by_calendar = if free_slots {
            self.shifts_by_calendar(ctx, range).await
        } else {
            HashMap::new()
        };

        let mut events_by_resource: BTreeMap<String, Vec<CalendarEventDTO>> = BTreeMap::new();
        let mut response = APIResponse::default();

        for calendar_id in &calendar_ids {
            let calendar = self
                .directory
                .calendar_by_id
                .get(calendar_id)
                .ok_or_else(|| UseCaseError::CalendarNotFound(calendar_id.clone()))?;

            let mut events: Vec<CalendarEvent> = Vec::new();
            if must_load_events || free_slots {
                let reader = ctx.facade.reader_for(calendar_id);
                events = reader.list_events(calendar_id, &search).await?;
                sort_events(&mut events);

                if free_slots {
                    let mut slots = Vec::new();
                    match shifts_by_calendar.get(calendar_id) {
                        Some(shifts) => {
                            for shift in shifts {
                                info!(
                                    calendar = %calendar_id,
                                    shift = %shift.unique_id,
                                    from = %shift.from,
                                    to = %shift.to,
                                    "calculating free slots for shift"
                                );
                                slots.extend(calculate_free_slots(
                                    calendar_id,
                                    shift.from,
                                    shift.to,
                                    &events,
                                ));
                            }
                        }
                        None => {
                            warn!(calendar = %calendar_id, "no shifts for the given calendar")
                        }
                    }

                    if only_free_slots {
                        events = slots;
                    } else {
                        events.extend(slots);
                    }
                    sort_events(&mut events);
                }
            }

            let mut entry = CalendarEventList {
                calendar: None,
                events: Vec::with_capacity(events.len()),
            };

            if must_load_calendars {
                let user_id = self
                    .directory
                    .user_by_calendar_id
                    .get(calendar_id)
                    .map(|p| p.user.id);
                entry.calendar = Some(CalendarDTO::new(calendar.clone(), user_id));
            }

            for event in events {
                for resource in &event.resources {
                    events_by_resource
                        .entry(resource.clone())
                        .or_default()
                        .push(CalendarEventDTO::virtual_copy(&event));
                }

                entry.events.push(CalendarEventDTO::new(event));
            }

            // do not include empty entries
            if entry.calendar.is_some() || !entry.events.is_empty() {
                response.results.push(entry);
            }
        }

        if self
            .body
            .request_kinds
            .contains(&RequestKind::VirtualResources)
        {
            let resources = ctx
                .resources
                .list()
                .await
                .map_err(|err| UseCaseError::Backend(CalendarError::Other(err)))?;

            for resource in resources {
                let events = events_by_resource
                    .remove(&resource.name)
                    .unwrap_or_default();

                response.results.push(CalendarEventList {
                    calendar: Some(CalendarDTO::virtual_resource(&resource)),
                    events,
                });
            }
        }

        Ok(response)
    }
}

impl ListEventsUseCase {
    /// Turns the request's search time into filter options plus the range
    /// used for free-slot derivation.
    fn search_window(
        &self,
    ) -> Result<
        (
            EventSearchOptions,
            (Option<DateTime<Utc>>, Option<DateTime<Utc>>),
        ),
        UseCaseError,
    > {
        let mut search = EventSearchOptions::new();
        let mut range = (None, None);

        match &self.body.search_time {
            Some(SearchTime::Date { date }) => {
                let day = parse_flexible_date(date)
                    .map_err(|_| UseCaseError::InvalidDate(date.clone()))?;
                let next_day = end_of_day(day);

                search = search.from(day).to(next_day);
                range = (Some(day), Some(next_day));
            }
            Some(SearchTime::TimeRange { from, to }) => {
                if let Some(from) = from {
                    search = search.from(*from);
                    range.0 = Some(*from);
                }
                if let Some(to) = to {
                    search = search.to(*to);
                    range.1 = Some(*to);
                }
            }
            None => {}
        }

        Ok((search, range))
    }

    fn resolve_calendar_ids(&self) -> Result<HashSet<String>, UseCaseError> {
        let mut calendar_ids = HashSet::new();

        match &self.body.source {
            None => {
                // only the calendar assigned to the authenticated caller
                info!("no calendar ids specified, loading caller profile");
                let user_id = self
                    .caller_user_id
                    .as_ref()
                    .ok_or(UseCaseError::NoCallerProfile)?;
                let profile = self
                    .directory
                    .by_user_id
                    .get(user_id)
                    .ok_or(UseCaseError::NoCallerProfile)?;

                if let Some(calendar_id) = profile.calendar_id() {
                    calendar_ids.insert(calendar_id);
                }
            }
            Some(EventSource::Sources {
                calendar_ids: ids,
                user_ids,
            }) => {
                calendar_ids.extend(ids.iter().cloned());

                if !user_ids.is_empty() {
                    let user_set: HashSet<&String> = user_ids.iter().collect();
                    let (profiles, _) = self.directory.profiles.get();
                    for profile in profiles {
                        if !user_set.contains(&profile.user.id) {
                            continue;
                        }
                        if let Some(calendar_id) = profile.calendar_id() {
                            calendar_ids.insert(calendar_id);
                        }
                    }
                }
            }
            Some(EventSource::AllCalendars) => {
                let (calendars, _) = self.directory.calendars.get();
                calendar_ids.extend(calendars.into_iter().map(|c| c.id));
            }
            Some(EventSource::AllUsers) => {
                calendar_ids.extend(self.directory.user_by_calendar_id.keys());
            }
        }

        Ok(calendar_ids)
    }

    /// Shifts of the requested range grouped by the calendar of their
    /// assigned users. Roster failures degrade to "no slots".
    async fn shifts_by_calendar(
        &self,
        ctx: &Context,
        range: (Option<DateTime<Utc>>, Option<DateTime<Utc>>),
    ) -> HashMap<String, Vec<PlannedShift>> {
        let mut by_calendar: HashMap<String, Vec<PlannedShift>> = HashMap::new();

        let (Some(start), Some(end)) = range else {
            warn!("free slots requested without a bounded time range");
            return by_calendar;
        };

        let shifts = match ctx
            .roster
            .working_staff(start, end, &ctx.config.free_slots.roster_type_name)
            .await
        {
            Ok(shifts) => shifts,
            Err(err) => {
                error!(error = %err, "failed to fetch roster for the requested range");
                return by_calendar;
            }
        };

        let definitions = match ctx.roster.work_shifts().await {
            Ok(definitions) => definitions,
            Err(err) => {
                error!(error = %err, "failed to fetch work shift definitions");
                return by_calendar;
            }
        };
        let definitions_by_id: HashMap<&str, _> = definitions
            .iter()
            .map(|def| (def.id.as_str(), def))
            .collect();

        for shift in shifts {
            let Some(definition) = definitions_by_id.get(shift.work_shift_id.as_str()) else {
                warn!(workshift = %shift.work_shift_id, "unknown work shift definition");
                continue;
            };

            // skip ignored shift kinds, e.g. on-call
            if definition.has_any_tag(&ctx.config.free_slots.ignore_shift_tags) {
                continue;
            }

            for user_id in &shift.assigned_user_ids {
                let Some(profile) = self.directory.by_user_id.get(user_id) else {
                    warn!(user = %user_id, "failed to get user profile from cache");
                    continue;
                };

                let Some(calendar_id) = profile.calendar_id() else {
                    // this user has no work calendar assigned
                    continue;
                };

                by_calendar.entry(calendar_id).or_default().push(shift.clone());
            }
        }

        by_calendar
    }
}
