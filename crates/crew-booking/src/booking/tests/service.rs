use super::common::*;
use crate::booking::repository::{ScheduleStore, StoreError};
use crate::booking::{BookingError, BookingService, ErrorClass};
use crate::config::SchedulingConfig;
use crate::scheduling::{BookingId, BookingStatus, CleanerId, PolicyViolation, VehicleId};
use std::sync::Arc;
use std::thread;

#[test]
fn create_takes_the_first_cleaners_of_the_first_vehicle() {
    let store = fleet(2, 3);
    let service = booking_service(&store);

    let view = service
        .create(request(tuesday(), at(10, 0), 120, 2))
        .expect("booking is created");

    assert_eq!(view.booking_id, BookingId(1));
    assert_eq!(view.vehicle_id, VehicleId(1));
    assert_eq!(view.vehicle_name, "Vehicle-1");
    assert_eq!(view.end_time, at(12, 0));
    assert_eq!(view.status, BookingStatus::Created);
    let cleaners: Vec<_> = view.cleaners.iter().map(|c| c.cleaner_id).collect();
    assert_eq!(cleaners, [CleanerId(1), CleanerId(2)]);
}

#[test]
fn create_moves_on_when_a_vehicle_is_short_of_cleaners() {
    let store = fleet(2, 3);
    let service = booking_service(&store);

    service
        .create(request(tuesday(), at(10, 0), 120, 2))
        .expect("first booking");
    let second = service
        .create(request(tuesday(), at(11, 0), 60, 2))
        .expect("second booking");

    assert_eq!(second.vehicle_id, VehicleId(2));
    let cleaners: Vec<_> = second.cleaners.iter().map(|c| c.cleaner_id).collect();
    assert_eq!(cleaners, [CleanerId(4), CleanerId(5)]);
}

#[test]
fn buffer_separates_back_to_back_bookings() {
    let store = fleet(2, 1);
    let service = booking_service(&store);
    service
        .create(request(tuesday(), at(10, 0), 120, 1))
        .expect("first booking");

    let too_close = service
        .create(request(tuesday(), at(12, 15), 60, 1))
        .expect("second vehicle is free");
    assert_eq!(too_close.vehicle_id, VehicleId(2));

    let after_break = service
        .create(request(tuesday(), at(13, 0), 60, 1))
        .expect("first vehicle is free again");
    assert_eq!(after_break.vehicle_id, VehicleId(1));
}

#[test]
fn capacity_failure_leaves_the_schedule_untouched() {
    let store = fleet(1, 2);
    let service = booking_service(&store);
    service
        .create(request(tuesday(), at(10, 0), 60, 2))
        .expect("first booking");

    let err = service
        .create(request(tuesday(), at(10, 30), 60, 1))
        .expect_err("no cleaner is free");
    assert!(matches!(
        err,
        BookingError::InsufficientCapacity { required: 1 }
    ));
    assert_eq!(err.class(), ErrorClass::Conflict);
    assert!(store
        .fetch_booking(BookingId(2))
        .expect("fetch")
        .is_none());

    let later = service
        .create(request(tuesday(), at(15, 0), 60, 1))
        .expect("later slot is free");
    assert_eq!(later.booking_id, BookingId(2));
}

#[test]
fn create_runs_the_policy_gate_in_order() {
    let store = fleet(1, 2);
    let service = booking_service(&store);

    let cases = [
        (
            request(friday(), at(6, 0), 0, 9),
            PolicyViolation::NonWorkingDay { date: friday() },
        ),
        (
            request(monday(), at(9, 0), 60, 1),
            PolicyViolation::InThePast,
        ),
        (
            request(tuesday(), at(7, 30), 60, 1),
            PolicyViolation::BeforeWorkingHours {
                start: at(7, 30),
                opens: at(8, 0),
            },
        ),
        (
            request(tuesday(), at(10, 0), 0, 1),
            PolicyViolation::InvalidDuration { minutes: 0 },
        ),
        (
            request(tuesday(), at(21, 0), 120, 1),
            PolicyViolation::AfterWorkingHours { closes: at(22, 0) },
        ),
        (
            request(tuesday(), at(10, 0), 60, 6),
            PolicyViolation::InvalidCleanerCount {
                requested: 6,
                max: 5,
            },
        ),
    ];

    for (request, expected) in cases {
        match service.create(request) {
            Err(BookingError::Validation(violation)) => assert_eq!(violation, expected),
            other => panic!("expected {expected:?}, got {other:?}"),
        }
    }
}

#[test]
fn huge_durations_are_rejected_as_after_hours() {
    let store = fleet(1, 2);
    let service = booking_service(&store);
    let availability = availability_service(&store);

    for minutes in [i64::MAX, i64::MAX - 100] {
        match service.create(request(tuesday(), at(10, 0), minutes, 1)) {
            Err(BookingError::Validation(violation)) => assert_eq!(
                violation,
                PolicyViolation::AfterWorkingHours { closes: at(22, 0) }
            ),
            other => panic!("expected after hours, got {other:?}"),
        }
        match availability.window(tuesday(), at(10, 0), minutes) {
            Err(BookingError::Validation(PolicyViolation::AfterWorkingHours { .. })) => {}
            other => panic!("expected after hours, got {other:?}"),
        }
    }
}

#[test]
fn create_without_any_crew_is_a_conflict() {
    let store = fleet(0, 0);
    let service = booking_service(&store);

    let err = service
        .create(request(tuesday(), at(10, 0), 60, 1))
        .expect_err("nobody to send");
    assert!(matches!(err, BookingError::NoCleanersConfigured));
    assert_eq!(err.class(), ErrorClass::Conflict);
}

#[test]
fn reschedule_may_overlap_its_own_previous_window() {
    let store = fleet(1, 2);
    let service = booking_service(&store);
    let created = service
        .create(request(tuesday(), at(10, 0), 120, 2))
        .expect("booking");

    let moved = service
        .reschedule(created.booking_id, move_to(tuesday(), at(11, 0)))
        .expect("only its own assignments overlap");

    assert_eq!(moved.start_time, at(11, 0));
    assert_eq!(moved.end_time, at(13, 0));
    assert_eq!(moved.cleaners.len(), 2);
    assert_eq!(service.get(created.booking_id).expect("stored"), moved);
}

#[test]
fn reschedule_conflicts_with_other_bookings() {
    let store = fleet(1, 2);
    let service = booking_service(&store);
    service
        .create(request(tuesday(), at(10, 0), 60, 2))
        .expect("first booking");
    let second = service
        .create(request(tuesday(), at(14, 0), 60, 2))
        .expect("second booking");

    let err = service
        .reschedule(second.booking_id, move_to(tuesday(), at(11, 0)))
        .expect_err("padded window overlaps the first booking");
    assert!(matches!(err, BookingError::InsufficientCapacity { .. }));

    let unchanged = service.get(second.booking_id).expect("stored");
    assert_eq!(unchanged.start_time, at(14, 0));
    assert_eq!(unchanged.cleaners.len(), 2);
}

#[test]
fn reschedule_to_another_day_keeps_duration_and_crew_size() {
    let store = fleet(2, 2);
    let service = booking_service(&store);
    let created = service
        .create(request(tuesday(), at(10, 0), 90, 2))
        .expect("booking");

    let moved = service
        .reschedule(created.booking_id, move_to(wednesday(), at(16, 0)))
        .expect("wednesday is free");

    assert_eq!(moved.date, wednesday());
    assert_eq!(moved.end_time, at(17, 30));
    assert_eq!(moved.cleaners.len(), 2);

    let reuse = service
        .create(request(tuesday(), at(10, 0), 90, 2))
        .expect("tuesday crew was released");
    assert_eq!(reuse.vehicle_id, VehicleId(1));
}

#[test]
fn reschedule_rejects_invalid_targets() {
    let store = fleet(1, 1);
    let service = booking_service(&store);
    let created = service
        .create(request(tuesday(), at(10, 0), 60, 1))
        .expect("booking");

    match service.reschedule(created.booking_id, move_to(friday(), at(10, 0))) {
        Err(BookingError::Validation(PolicyViolation::NonWorkingDay { .. })) => {}
        other => panic!("expected non-working day, got {other:?}"),
    }
    match service.reschedule(created.booking_id, move_to(tuesday(), at(21, 30))) {
        Err(BookingError::Validation(PolicyViolation::AfterWorkingHours { .. })) => {}
        other => panic!("expected after hours, got {other:?}"),
    }
}

#[test]
fn started_bookings_cannot_move_or_be_cancelled() {
    let store = fleet(1, 1);
    let created = booking_service(&store)
        .create(request(tuesday(), at(10, 0), 60, 1))
        .expect("booking");

    let later = BookingService::new(Arc::clone(&store), clock_at(tuesday(), 10, 0), config());

    let same = later
        .reschedule(created.booking_id, move_to(tuesday(), at(10, 0)))
        .expect("unchanged window is returned as is");
    assert_eq!(same, created);

    match later.reschedule(created.booking_id, move_to(wednesday(), at(10, 0))) {
        Err(BookingError::AlreadyStarted(id)) => assert_eq!(id, created.booking_id),
        other => panic!("expected already started, got {other:?}"),
    }
    assert!(matches!(
        later.cancel(created.booking_id),
        Err(BookingError::AlreadyStarted(_))
    ));
}

#[test]
fn reschedule_respects_a_lowered_cleaner_limit() {
    let store = fleet(1, 3);
    let created = booking_service(&store)
        .create(request(tuesday(), at(10, 0), 60, 3))
        .expect("booking");

    let strict = SchedulingConfig {
        max_cleaners_per_vehicle: 2,
        ..config()
    };
    let service = BookingService::new(Arc::clone(&store), clock(), strict);

    let err = service
        .reschedule(created.booking_id, move_to(tuesday(), at(15, 0)))
        .expect_err("crew is larger than the limit");
    assert!(matches!(
        err,
        BookingError::CleanerCountExceedsLimit {
            count: 3,
            max: 2,
            ..
        }
    ));
    assert_eq!(err.class(), ErrorClass::Conflict);
}

#[test]
fn cancel_releases_cleaners_and_is_terminal() {
    let store = fleet(1, 2);
    let service = booking_service(&store);
    let created = service
        .create(request(tuesday(), at(10, 0), 60, 2))
        .expect("booking");

    service.cancel(created.booking_id).expect("cancel");

    let cancelled = service.get(created.booking_id).expect("still readable");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(cancelled.cleaners.is_empty());

    assert!(matches!(
        service.cancel(created.booking_id),
        Err(BookingError::AlreadyCancelled(_))
    ));
    assert!(matches!(
        service.reschedule(created.booking_id, move_to(tuesday(), at(10, 0))),
        Err(BookingError::AlreadyCancelled(_))
    ));

    let replacement = service
        .create(request(tuesday(), at(10, 0), 60, 2))
        .expect("crew is free again");
    assert_eq!(replacement.vehicle_id, VehicleId(1));
}

#[test]
fn unknown_bookings_are_not_found() {
    let store = fleet(1, 1);
    let service = booking_service(&store);

    let err = service.cancel(BookingId(99)).expect_err("no such booking");
    assert!(matches!(err, BookingError::NotFound(BookingId(99))));
    assert_eq!(err.class(), ErrorClass::NotFound);

    assert!(matches!(
        service.reschedule(BookingId(99), move_to(tuesday(), at(10, 0))),
        Err(BookingError::NotFound(_))
    ));
    assert!(matches!(
        service.get(BookingId(99)),
        Err(BookingError::NotFound(_))
    ));
}

#[test]
fn store_outages_are_internal_errors() {
    let service = BookingService::new(Arc::new(UnavailableStore::default()), clock(), config());

    let err = service
        .create(request(tuesday(), at(10, 0), 60, 1))
        .expect_err("store is down");
    assert!(matches!(
        err,
        BookingError::Store(StoreError::Unavailable(_))
    ));
    assert_eq!(err.class(), ErrorClass::Internal);
}

#[test]
fn concurrent_creates_never_double_book_a_cleaner() {
    let store = fleet(1, 2);
    let service = booking_service(&store);

    let outcomes: Vec<_> = thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| service.create(request(tuesday(), at(10, 0), 60, 1))))
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("worker finished"))
            .collect()
    });

    let booked: Vec<_> = outcomes.iter().filter_map(|outcome| outcome.as_ref().ok()).collect();
    assert_eq!(booked.len(), 2);
    assert_ne!(booked[0].cleaners[0].cleaner_id, booked[1].cleaners[0].cleaner_id);
    assert!(outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().err())
        .all(|err| matches!(err, BookingError::InsufficientCapacity { .. })));
}

#[test]
fn services_sharing_a_store_share_its_date_locks() {
    let store = fleet(1, 2);
    let services = [booking_service(&store), booking_service(&store)];

    let outcomes: Vec<_> = thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let service = &services[worker % 2];
                scope.spawn(move || service.create(request(tuesday(), at(10, 0), 60, 1)))
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("worker finished"))
            .collect()
    });

    let booked: Vec<_> = outcomes.iter().filter_map(|outcome| outcome.as_ref().ok()).collect();
    assert_eq!(booked.len(), 2);
    assert_ne!(booked[0].cleaners[0].cleaner_id, booked[1].cleaners[0].cleaner_id);
    let assigned = store
        .assignments_on_date(&[CleanerId(1), CleanerId(2)], tuesday())
        .expect("assignments");
    assert_eq!(assigned.len(), 2);
}
