mod helpers;

use calgate_api::event::create_event::{CreateEventUseCase, UseCaseError as CreateError};
use calgate_api::event::delete_event::DeleteEventUseCase;
use calgate_api::event::list_events::{ListEventsUseCase, UseCaseError as ListError};
use calgate_api::event::move_event::{MoveEventUseCase, UseCaseError as MoveError};
use calgate_api::event::update_event::{UpdateEventUseCase, UseCaseError as UpdateError};
use calgate_api::shared::usecase::execute;
use calgate_api_structs::event::{
    create_event, list_events, move_event, update_event, EventSource, RequestKind, SearchTime,
};
use calgate_domain::{start_of_day, EventSearchOptions, ExtraData, CUSTOMER_ANNOTATION_TYPE};
use calgate_infra::repos::{CalendarReader, IResourceCalendarRepo};
use chrono::{Duration, Utc};
use helpers::{feed_config, profile_with_calendar, spawn_app};
use serde_json::json;

fn create_body(name: &str, offset_hours: i64) -> create_event::RequestBody {
    let start = start_of_day(Utc::now()) + Duration::hours(offset_hours);
    create_event::RequestBody {
        name: name.into(),
        description: "details".into(),
        start,
        end: Some(start + Duration::minutes(30)),
        resources: Vec::new(),
        extra_data: None,
    }
}

fn list_body(source: EventSource) -> list_events::RequestBody {
    list_events::RequestBody {
        source: Some(source),
        search_time: Some(SearchTime::TimeRange {
            from: Some(start_of_day(Utc::now())),
            to: Some(start_of_day(Utc::now()) + Duration::days(1)),
        }),
        read_mask: Vec::new(),
        request_kinds: Vec::new(),
    }
}

fn explicit_source(calendar_ids: &[&str]) -> EventSource {
    EventSource::Sources {
        calendar_ids: calendar_ids.iter().map(|s| s.to_string()).collect(),
        user_ids: Vec::new(),
    }
}

#[tokio::test]
async fn create_and_list_round_trip() {
    let app = spawn_app(&["work"], &[], vec![]).await;

    let created = execute(
        CreateEventUseCase {
            calendar_id: "work".into(),
            body: create_body("Checkup", 9),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    let response = execute(
        ListEventsUseCase {
            body: list_body(explicit_source(&["work"])),
            caller_user_id: None,
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    assert_eq!(response.results.len(), 1);
    let entry = &response.results[0];
    assert_eq!(entry.calendar.as_ref().unwrap().id, "work");
    assert!(entry.events.iter().any(|e| e.id == created.id));
}

#[tokio::test]
async fn default_source_is_the_caller_calendar() {
    let profiles = vec![profile_with_calendar("u-1", "alice", "work")];
    let app = spawn_app(&["work", "other"], &[], profiles).await;

    execute(
        CreateEventUseCase {
            calendar_id: "work".into(),
            body: create_body("Mine", 9),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    let mut body = list_body(explicit_source(&[]));
    body.source = None;

    let response = execute(
        ListEventsUseCase {
            body,
            caller_user_id: Some("u-1".into()),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].calendar.as_ref().unwrap().id, "work");
    assert_eq!(
        response.results[0].calendar.as_ref().unwrap().user_id,
        Some("u-1".to_string())
    );
}

#[tokio::test]
async fn unknown_caller_fails_and_empty_set_aborts() {
    let app = spawn_app(&["work"], &[], vec![]).await;

    let result = execute(
        ListEventsUseCase {
            body: list_events::RequestBody::default(),
            caller_user_id: Some("ghost".into()),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await;
    assert!(matches!(result, Err(ListError::NoCallerProfile)));

    // a caller whose profile has no calendar selects nothing
    let profiles = vec![profile_with_calendar("u-1", "alice", "")];
    let app = spawn_app(&["work"], &[], profiles).await;
    let result = execute(
        ListEventsUseCase {
            body: list_events::RequestBody::default(),
            caller_user_id: Some("u-1".into()),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await;
    assert!(matches!(result, Err(ListError::EmptyCalendarSet)));
}

#[tokio::test]
async fn malformed_dates_are_rejected() {
    let app = spawn_app(&["work"], &[], vec![]).await;

    let mut body = list_body(explicit_source(&["work"]));
    body.search_time = Some(SearchTime::Date {
        date: "02.04.2024".into(),
    });

    let result = execute(
        ListEventsUseCase {
            body,
            caller_user_id: None,
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await;

    assert!(matches!(result, Err(ListError::InvalidDate(_))));
}

#[tokio::test]
async fn both_date_formats_are_accepted() {
    let app = spawn_app(&["work"], &[], vec![]).await;

    for date in ["2024-04-02", "2024/04/02"] {
        let mut body = list_body(explicit_source(&["work"]));
        body.search_time = Some(SearchTime::Date { date: date.into() });

        let result = execute(
            ListEventsUseCase {
                body,
                caller_user_id: None,
                directory: app.directory.clone(),
            },
            &app.ctx,
        )
        .await;
        assert!(result.is_ok(), "date {:?} should parse", date);
    }
}

#[tokio::test]
async fn read_mask_limits_the_response() {
    let app = spawn_app(&["work"], &[], vec![]).await;
    execute(
        CreateEventUseCase {
            calendar_id: "work".into(),
            body: create_body("Masked", 9),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    let mut body = list_body(explicit_source(&["work"]));
    body.read_mask = vec!["results.calendar".to_string()];

    let response = execute(
        ListEventsUseCase {
            body,
            caller_user_id: None,
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    assert_eq!(response.results.len(), 1);
    assert!(response.results[0].calendar.is_some());
    assert!(response.results[0].events.is_empty());
}

#[tokio::test]
async fn feed_calendars_are_listable_but_not_writable() {
    let app = spawn_app(&["work"], &[feed_config("waste")], vec![]).await;

    // listing the feed works (it is empty)
    let response = execute(
        ListEventsUseCase {
            body: list_body(explicit_source(&["waste"])),
            caller_user_id: None,
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();
    assert_eq!(response.results.len(), 1);
    assert!(response.results[0].calendar.as_ref().unwrap().readonly);

    // mutations are rejected before touching any backend
    let result = execute(
        CreateEventUseCase {
            calendar_id: "waste".into(),
            body: create_body("Nope", 9),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await;
    assert!(matches!(result, Err(CreateError::ReadOnlyCalendar)));

    let result = execute(
        DeleteEventUseCase {
            calendar_id: "waste".into(),
            event_id: "whatever".into(),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await;
    assert!(matches!(
        result,
        Err(calgate_api::event::delete_event::UseCaseError::ReadOnlyCalendar)
    ));
}

#[tokio::test]
async fn annotation_envelopes_are_validated() {
    let app = spawn_app(&["work"], &[], vec![]).await;

    let mut body = create_body("Annotated", 9);
    body.extra_data = Some(ExtraData {
        type_url: format!("type.googleapis.com/{}", CUSTOMER_ANNOTATION_TYPE),
        value: json!({ "customerId": "cust-1" }),
    });

    let created = execute(
        CreateEventUseCase {
            calendar_id: "work".into(),
            body,
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();
    assert_eq!(
        created.extra_data.unwrap().decode().unwrap().customer_id,
        "cust-1"
    );

    let mut body = create_body("Bad", 10);
    body.extra_data = Some(ExtraData {
        type_url: "calgate.v1.Unknown".into(),
        value: json!({}),
    });

    let result = execute(
        CreateEventUseCase {
            calendar_id: "work".into(),
            body,
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await;
    assert!(matches!(result, Err(CreateError::InvalidExtraData(_))));
}

#[tokio::test]
async fn update_applies_only_masked_paths() {
    let app = spawn_app(&["work"], &[], vec![]).await;

    let created = execute(
        CreateEventUseCase {
            calendar_id: "work".into(),
            body: create_body("Original", 9),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    let updated = execute(
        UpdateEventUseCase {
            calendar_id: "work".into(),
            event_id: created.id.clone(),
            body: update_event::RequestBody {
                name: "Renamed".into(),
                description: "ignored because unmasked".into(),
                update_mask: vec!["name".to_string()],
                ..Default::default()
            },
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    assert_eq!(updated.summary, "Renamed");
    assert_eq!(updated.description, created.description);
}

#[tokio::test]
async fn updating_the_end_keeps_the_full_day_flag_in_step() {
    let app = spawn_app(&["work"], &[], vec![]).await;

    let created = execute(
        CreateEventUseCase {
            calendar_id: "work".into(),
            body: create_body("Flexible", 9),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();
    assert!(!created.full_day);

    // clearing the end turns the event into a full-day one
    let updated = execute(
        UpdateEventUseCase {
            calendar_id: "work".into(),
            event_id: created.id.clone(),
            body: update_event::RequestBody {
                end: None,
                update_mask: vec!["end".to_string()],
                ..Default::default()
            },
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();
    assert!(updated.full_day);

    // the flag survives an upstream round trip
    let reloaded = app
        .ctx
        .google
        .load_event("work", &created.id, true)
        .await
        .unwrap();
    assert!(reloaded.full_day);

    // supplying an end again makes it a timed event
    let end = start_of_day(Utc::now()) + Duration::days(2);
    let updated = execute(
        UpdateEventUseCase {
            calendar_id: "work".into(),
            event_id: created.id.clone(),
            body: update_event::RequestBody {
                end: Some(end),
                update_mask: vec!["end".to_string()],
                ..Default::default()
            },
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();
    assert!(!updated.full_day);
    assert_eq!(updated.end_time, Some(end));
}

#[tokio::test]
async fn update_rejects_bad_masks_and_missing_values() {
    let app = spawn_app(&["work"], &[], vec![]).await;

    let created = execute(
        CreateEventUseCase {
            calendar_id: "work".into(),
            body: create_body("Original", 9),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    let base = |mask: &[&str]| UpdateEventUseCase {
        calendar_id: "work".into(),
        event_id: created.id.clone(),
        body: update_event::RequestBody {
            update_mask: mask.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        },
        directory: app.directory.clone(),
    };

    let result = execute(base(&["shoe_size"]), &app.ctx).await;
    assert!(matches!(result, Err(UpdateError::UnknownPath(_))));

    let result = execute(base(&["name"]), &app.ctx).await;
    assert!(matches!(result, Err(UpdateError::NameRequired)));

    let result = execute(base(&["start"]), &app.ctx).await;
    assert!(matches!(result, Err(UpdateError::MissingStart)));

    let mut usecase = base(&["extra_data"]);
    usecase.body.extra_data = Some(ExtraData {
        type_url: CUSTOMER_ANNOTATION_TYPE.into(),
        value: json!({}),
    });
    let result = execute(usecase, &app.ctx).await;
    assert!(matches!(result, Err(UpdateError::ExtraDataUnsupported)));
}

#[tokio::test]
async fn move_to_readonly_target_is_denied_and_origin_keeps_the_event() {
    let app = spawn_app(&["work"], &[feed_config("waste")], vec![]).await;

    let created = execute(
        CreateEventUseCase {
            calendar_id: "work".into(),
            body: create_body("Stays", 9),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    let result = execute(
        MoveEventUseCase {
            body: move_event::RequestBody {
                event_id: created.id.clone(),
                source_calendar_id: Some("work".into()),
                target_calendar_id: Some("waste".into()),
                ..Default::default()
            },
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await;
    assert!(matches!(result, Err(MoveError::ReadOnlyTarget)));

    // origin state is untouched
    let events = app
        .ctx
        .google
        .list_events(
            "work",
            &EventSearchOptions::new().from(start_of_day(Utc::now())),
        )
        .await
        .unwrap();
    assert!(events.iter().any(|e| e.id == created.id));
}

#[tokio::test]
async fn move_between_upstream_calendars_relocates_the_event() {
    let profiles = vec![profile_with_calendar("u-2", "bob", "b")];
    let app = spawn_app(&["a", "b"], &[], profiles).await;

    let created = execute(
        CreateEventUseCase {
            calendar_id: "a".into(),
            body: create_body("Transfer", 9),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    // target addressed through the user profile
    let moved = execute(
        MoveEventUseCase {
            body: move_event::RequestBody {
                event_id: created.id.clone(),
                source_calendar_id: Some("a".into()),
                target_user_id: Some("u-2".into()),
                ..Default::default()
            },
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();
    assert_eq!(moved.calendar_id, "b");

    let response = execute(
        ListEventsUseCase {
            body: list_body(explicit_source(&["a"])),
            caller_user_id: None,
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();
    // only the calendar header remains for the origin
    assert!(response.results[0].events.is_empty());
}

#[tokio::test]
async fn virtual_resource_calendars_carry_event_clones() {
    let app = spawn_app(&["work"], &[], vec![]).await;

    app.ctx
        .resources
        .store(&calgate_domain::ResourceCalendar {
            name: "x-ray".into(),
            display_name: "X-Ray Room".into(),
            description: String::new(),
            color: "#ff0000".into(),
            max_concurrent_use: 1,
        })
        .await
        .unwrap();

    let mut body = create_body("Imaging", 9);
    body.resources = vec!["x-ray".to_string()];
    let created = execute(
        CreateEventUseCase {
            calendar_id: "work".into(),
            body,
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    let mut body = list_body(explicit_source(&["work"]));
    body.request_kinds = vec![RequestKind::Events, RequestKind::VirtualResources];

    let response = execute(
        ListEventsUseCase {
            body,
            caller_user_id: None,
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    let resource_entry = response
        .results
        .iter()
        .find(|r| {
            r.calendar
                .as_ref()
                .map(|c| c.is_virtual_resource)
                .unwrap_or(false)
        })
        .expect("virtual resource calendar present");

    assert_eq!(resource_entry.calendar.as_ref().unwrap().id, "x-ray");
    assert_eq!(resource_entry.calendar.as_ref().unwrap().name, "X-Ray Room");
    assert_eq!(resource_entry.events.len(), 1);
    assert_eq!(resource_entry.events[0].id, created.id);
    assert!(resource_entry.events[0].virtual_copy);
}

#[tokio::test]
async fn free_slot_requests_survive_roster_outages() {
    let app = spawn_app(&["work"], &[], vec![]).await;
    execute(
        CreateEventUseCase {
            calendar_id: "work".into(),
            body: create_body("Booked", 9),
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    let mut body = list_body(explicit_source(&["work"]));
    body.request_kinds = vec![RequestKind::Events, RequestKind::FreeSlots];

    // the roster peer is unreachable in tests: events come back, slots do not
    let response = execute(
        ListEventsUseCase {
            body,
            caller_user_id: None,
            directory: app.directory.clone(),
        },
        &app.ctx,
    )
    .await
    .unwrap();

    assert_eq!(response.results.len(), 1);
    assert!(!response.results[0].events.is_empty());
    assert!(response.results[0].events.iter().all(|e| !e.is_free));
}
